//! nibble — байты ⇄ последовательность nibble (hex-цифр) и палитра для отрисовки.
//!
//! A byte `0xAB` becomes nibbles `[0xA, 0xB]` (high nibble first).
//!
//! Radix-path keys carry an extra "end of path" marker after the last nibble,
//! conventionally the value 16. It is kept out of the 0..=15 payload and
//! modelled as the `terminated` flag of [`NibbleSeq`]; the codec neither adds
//! nor removes it unless asked to ([`keybytes_to_hex`], [`NibbleSeq::strip_terminator`]).
//!
//! Padding rule for decoding: an odd number of nibbles is completed with a
//! trailing 0 nibble, so `[0xA]` decodes to `[0xA0]`.

use anyhow::Result;

use crate::consts::{NIBBLE_BG, NIBBLE_FG, NIBBLE_LABELS, NIBBLE_TERMINATOR};
use crate::error::VizError;

/// Ordered 4-bit values plus an optional out-of-band terminator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NibbleSeq {
    nibbles: Vec<u8>,
    terminated: bool,
}

impl NibbleSeq {
    /// Build from raw values. A trailing 16 becomes the terminator; any other
    /// value outside 0..=15 is rejected.
    pub fn from_raw(raw: &[u8]) -> Result<Self> {
        let (body, terminated) = match raw.split_last() {
            Some((&NIBBLE_TERMINATOR, body)) => (body, true),
            _ => (raw, false),
        };
        if let Some(pos) = body.iter().position(|&n| n > 0x0F) {
            return Err(VizError::InvalidNibble {
                pos,
                value: body[pos],
            }
            .into());
        }
        Ok(Self {
            nibbles: body.to_vec(),
            terminated,
        })
    }

    /// Payload nibbles, without the terminator.
    pub fn as_slice(&self) -> &[u8] {
        &self.nibbles
    }

    /// Payload length (terminator not counted).
    pub fn len(&self) -> usize {
        self.nibbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nibbles.is_empty()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn strip_terminator(mut self) -> Self {
        self.terminated = false;
        self
    }

    /// Raw values as the upstream encoding writes them (terminator as 16).
    pub fn to_raw(&self) -> Vec<u8> {
        let mut out = self.nibbles.clone();
        if self.terminated {
            out.push(NIBBLE_TERMINATOR);
        }
        out
    }
}

/// Two nibbles per byte, high nibble first, no terminator.
pub fn to_nibbles(bytes: &[u8]) -> NibbleSeq {
    let mut nibbles = Vec::with_capacity(bytes.len() * 2);
    for &b in bytes {
        nibbles.push(b >> 4);
        nibbles.push(b & 0x0F);
    }
    NibbleSeq {
        nibbles,
        terminated: false,
    }
}

/// Radix-path form of a key: [`to_nibbles`] plus the terminator.
pub fn keybytes_to_hex(bytes: &[u8]) -> NibbleSeq {
    let mut seq = to_nibbles(bytes);
    seq.terminated = true;
    seq
}

/// Inverse of [`to_nibbles`]. The terminator is ignored; odd length is padded with 0.
pub fn from_nibbles(seq: &NibbleSeq) -> Vec<u8> {
    seq.nibbles
        .chunks(2)
        .map(|pair| {
            let hi = pair[0];
            let lo = pair.get(1).copied().unwrap_or(0);
            (hi << 4) | lo
        })
        .collect()
}

/// Hex digit for a nibble. Only the low four bits are looked at.
#[inline]
pub fn nibble_label(n: u8) -> char {
    NIBBLE_LABELS[(n & 0x0F) as usize]
}

/// (background, foreground) colours of the fixed 16-slot palette.
#[inline]
pub fn nibble_color(n: u8) -> (&'static str, &'static str) {
    let i = (n & 0x0F) as usize;
    (NIBBLE_BG[i], NIBBLE_FG[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_nibbles_per_byte_high_first() {
        let seq = to_nibbles(&[0x61, 0x31]);
        assert_eq!(seq.as_slice(), &[6, 1, 3, 1]);
        assert!(!seq.is_terminated());
    }

    #[test]
    fn keybytes_adds_terminator_and_strip_removes_it() {
        let seq = keybytes_to_hex(&[0xAB]);
        assert_eq!(seq.to_raw(), vec![0xA, 0xB, 16]);
        assert_eq!(seq.len(), 2);
        let plain = seq.strip_terminator();
        assert_eq!(plain.to_raw(), vec![0xA, 0xB]);
    }

    #[test]
    fn from_raw_accepts_trailing_terminator_only() {
        let seq = NibbleSeq::from_raw(&[1, 2, 16]).unwrap();
        assert!(seq.is_terminated());
        assert_eq!(seq.as_slice(), &[1, 2]);

        let err = NibbleSeq::from_raw(&[1, 16, 2]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VizError>(),
            Some(VizError::InvalidNibble { pos: 1, value: 16 })
        ));
    }

    #[test]
    fn roundtrip_empty_and_odd_byte_lengths() {
        let cases: [&[u8]; 4] = [b"", b"a", b"abc", &[0x00, 0xFF, 0x10]];
        for bytes in cases {
            assert_eq!(from_nibbles(&to_nibbles(bytes)), bytes);
            assert_eq!(from_nibbles(&keybytes_to_hex(bytes)), bytes);
        }
    }

    #[test]
    fn odd_nibble_count_pads_low_nibble() {
        let seq = NibbleSeq::from_raw(&[0xA, 0xB, 0xC]).unwrap();
        assert_eq!(from_nibbles(&seq), vec![0xAB, 0xC0]);
    }

    #[test]
    fn palette_lookups() {
        assert_eq!(nibble_label(0), '0');
        assert_eq!(nibble_label(0xA), 'a');
        assert_eq!(nibble_color(0), ("#FFFFFF", "#000000"));
        assert_eq!(nibble_color(0xF), ("#000000", "#FFFFFF"));
    }
}
