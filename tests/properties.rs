use anyhow::Result;

use snapviz::layout::{compression_for_budget, plan_grid, plan_linear};
use snapviz::{diff, from_nibbles, keybytes_to_hex, to_nibbles, MemSnapshot, Snapshot, Taxonomy};

fn random_bytes(rng: &mut oorandom::Rand32, max_len: u32) -> Vec<u8> {
    let len = rng.rand_range(0..max_len + 1) as usize;
    (0..len).map(|_| rng.rand_range(0..256) as u8).collect()
}

/// to_nibbles/keybytes_to_hex → from_nibbles восстанавливает байты, длина = 2 * n.
#[test]
fn nibble_roundtrip_random() -> Result<()> {
    let mut rng = oorandom::Rand32::new(0x5EED_0001);
    for _ in 0..500 {
        let bytes = random_bytes(&mut rng, 40);
        let seq = to_nibbles(&bytes);
        assert_eq!(seq.len(), bytes.len() * 2);
        assert!(seq.as_slice().iter().all(|&n| n < 16));
        assert_eq!(from_nibbles(&seq), bytes);

        let key = keybytes_to_hex(&bytes);
        assert!(key.is_terminated());
        assert_eq!(from_nibbles(&key), bytes);
    }
    Ok(())
}

/// Сжатая строка: число явных клеток не зависит от длины, элизия ровно одна.
#[test]
fn linear_compression_is_length_independent() -> Result<()> {
    let mut rng = oorandom::Rand32::new(0x5EED_0002);
    for _ in 0..200 {
        let len = rng.rand_range(8..400) as usize;
        let raw: Vec<u8> = (0..len).map(|_| rng.rand_range(0..16) as u8).collect();
        let seq = snapviz::NibbleSeq::from_raw(&raw)?;
        let plan = plan_linear(&seq, 0, len, compression_for_budget(len, 6));
        assert_eq!(plan.explicit_count(), 6, "len={len}");
        assert_eq!(plan.elision_count(), 1, "len={len}");
    }
    Ok(())
}

/// Сжатая сетка: число строк и nibble-клеток фиксировано для любых длинных значений.
#[test]
fn grid_compression_is_length_independent() -> Result<()> {
    let mut rng = oorandom::Rand32::new(0x5EED_0003);
    for _ in 0..100 {
        // полные строки, чтобы последняя строка тоже была полной
        let rows = rng.rand_range(6..60) as usize;
        let bytes: Vec<u8> = (0..rows * 8).map(|_| rng.rand_u32() as u8).collect();
        let plan = plan_grid(&to_nibbles(&bytes), 16, true, false);
        assert_eq!(plan.total_rows, rows);
        assert_eq!(plan.rows.len(), 5);
        assert_eq!(plan.spacer_rows(), 1);
        assert_eq!(plan.nibble_cells(), 4 * 4);
    }
    Ok(())
}

/// Каждый ключ `after`, отсутствующий или изменённый в `before`, попадает в diff,
/// и ничего сверх этого; seq идут подряд в порядке сканирования.
#[test]
fn diff_reports_exactly_new_and_changed_keys() -> Result<()> {
    let mut rng = oorandom::Rand32::new(0x5EED_0004);
    let tax = Taxonomy::chain_db();
    let alphabet = b"hrbHltnBxyz";

    for _ in 0..50 {
        let mut before = MemSnapshot::new();
        let mut after = MemSnapshot::new();
        for _ in 0..rng.rand_range(0..40) {
            let mut k = vec![alphabet[rng.rand_range(0..alphabet.len() as u32) as usize]];
            k.extend(random_bytes(&mut rng, 3));
            let v = random_bytes(&mut rng, 2);
            match rng.rand_range(0..4) {
                0 => before.put(&k, &v),
                1 => after.put(&k, &v),
                2 => {
                    before.put(&k, &v);
                    after.put(&k, &v);
                }
                _ => {
                    before.put(&k, &v);
                    let mut v2 = v.clone();
                    v2.push(0xEE);
                    after.put(&k, &v2);
                }
            }
        }

        let mut expected = Vec::new();
        after.scan_stream(&mut |k, v| {
            if before.get(k)?.as_deref() != Some(v) {
                expected.push(k.to_vec());
            }
            Ok(())
        })?;

        let got = diff(&before, &after, &tax)?;
        let keys: Vec<Vec<u8>> = got.iter().map(|e| e.key.clone()).collect();
        assert_eq!(keys, expected);
        for (i, e) in got.iter().enumerate() {
            assert_eq!(e.seq, i);
            assert_eq!(e.class, tax.classify(&e.key));
        }
    }
    Ok(())
}
