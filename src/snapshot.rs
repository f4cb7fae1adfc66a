//! snapshot — read-only view of a key-value store at one point in time.
//!
//! The differ only needs two capabilities: one full scan and point lookups.
//! `MemSnapshot` is the in-process implementation (ordered by key); it can be
//! loaded from / saved to a JSONL dump with one
//! `{"key_hex": "...", "value_hex": "..."}` object per line.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::VizError;
use crate::util::{decode_hex, to_hex};

pub trait Snapshot {
    /// Full single-pass scan. Stops at the first error returned by `cb`
    /// and hands that error back.
    fn scan_stream(&self, cb: &mut dyn FnMut(&[u8], &[u8]) -> Result<()>) -> Result<()>;

    /// Point lookup; `Ok(None)` when the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
}

impl<T: Snapshot + ?Sized> Snapshot for &T {
    fn scan_stream(&self, cb: &mut dyn FnMut(&[u8], &[u8]) -> Result<()>) -> Result<()> {
        (**self).scan_stream(cb)
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }
}

#[derive(Serialize, Deserialize)]
struct DumpRecord {
    key_hex: String,
    value_hex: String,
}

/// In-memory snapshot; iteration is in key order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemSnapshot {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_vec(), v.as_ref().to_vec()))
            .collect();
        Self { map }
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.map.insert(key.to_vec(), value.to_vec());
    }

    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.map.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Load a JSONL dump. Blank lines are skipped; a repeated key keeps the last value.
    pub fn load_jsonl(path: &Path) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("open dump {}", path.display()))?;
        let mut snap = Self::new();
        for (i, line) in BufReader::new(f).lines().enumerate() {
            let line = line.with_context(|| format!("read dump {}", path.display()))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let dump_err = |reason: String| VizError::Dump {
                path: path.to_path_buf(),
                line: i + 1,
                reason,
            };
            let rec: DumpRecord =
                serde_json::from_str(line).map_err(|e| dump_err(e.to_string()))?;
            let k = decode_hex(&rec.key_hex).map_err(|e| dump_err(format!("key_hex: {e}")))?;
            let v =
                decode_hex(&rec.value_hex).map_err(|e| dump_err(format!("value_hex: {e}")))?;
            snap.map.insert(k, v);
        }
        Ok(snap)
    }

    pub fn write_jsonl(&self, path: &Path) -> Result<()> {
        let f = File::create(path).with_context(|| format!("create dump {}", path.display()))?;
        let mut w = BufWriter::new(f);
        for (k, v) in &self.map {
            let rec = DumpRecord {
                key_hex: to_hex(k),
                value_hex: to_hex(v),
            };
            serde_json::to_writer(&mut w, &rec)?;
            w.write_all(b"\n")?;
        }
        w.flush()?;
        Ok(())
    }
}

impl Snapshot for MemSnapshot {
    fn scan_stream(&self, cb: &mut dyn FnMut(&[u8], &[u8]) -> Result<()>) -> Result<()> {
        for (k, v) in &self.map {
            cb(k, v)?;
        }
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_is_key_ordered_and_get_reports_absent() -> Result<()> {
        let snap = MemSnapshot::from_pairs([(&b"b"[..], &b"2"[..]), (&b"a"[..], &b"1"[..])]);
        let mut keys = Vec::new();
        snap.scan_stream(&mut |k, _| {
            keys.push(k.to_vec());
            Ok(())
        })?;
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(snap.get(b"a")?, Some(b"1".to_vec()));
        assert_eq!(snap.get(b"zz")?, None);
        Ok(())
    }

    #[test]
    fn scan_stops_on_callback_error() {
        let snap = MemSnapshot::from_pairs([(&b"a"[..], &b"1"[..]), (&b"b"[..], &b"2"[..])]);
        let mut seen = 0;
        let res = snap.scan_stream(&mut |_, _| {
            seen += 1;
            Err(anyhow::anyhow!("stop"))
        });
        assert!(res.is_err());
        assert_eq!(seen, 1);
    }

    #[test]
    fn put_delete_and_copy() {
        let mut a = MemSnapshot::new();
        a.put(b"k", b"v");
        let b = a.clone();
        assert!(a.delete(b"k"));
        assert!(a.is_empty());
        assert_eq!(b.len(), 1);
    }
}
