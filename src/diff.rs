//! diff — what changed between two snapshots.
//!
//! Policy: insertions and updates only. The pass walks `after` once and looks
//! every key up in `before`; a key present in `before` with a byte-identical
//! value is skipped, anything else becomes a [`ChangedEntry`]. Keys that exist
//! only in `before` (deletions) are not reported.
//!
//! `seq` counts changed entries from 0 in the scan order of `after`. It is the
//! identity of an entry in every diagram produced from it.

use anyhow::{anyhow, Result};
use log::debug;

use crate::error::VizError;
use crate::metrics::{record_entry_changed, record_entry_compared};
use crate::snapshot::Snapshot;
use crate::taxonomy::{Classification, Taxonomy};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangedEntry {
    pub seq: usize,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub class: Classification,
}

/// Stream changed entries to `cb` in scan order of `after`.
/// Returns the number of entries emitted.
///
/// Snapshot failures surface as [`VizError::SnapshotAccess`]; an error
/// returned by `cb` aborts the scan and is returned unchanged.
pub fn diff_stream<B, A, F>(before: &B, after: &A, taxonomy: &Taxonomy, mut cb: F) -> Result<usize>
where
    B: Snapshot + ?Sized,
    A: Snapshot + ?Sized,
    F: FnMut(ChangedEntry) -> Result<()>,
{
    let mut seq = 0usize;
    let mut cb_err: Option<anyhow::Error> = None;

    let scan = after.scan_stream(&mut |k, v| {
        record_entry_compared();
        let old = before.get(k).map_err(|e| VizError::SnapshotAccess {
            side: "before",
            reason: format!("{:#}", e),
        })?;
        if old.as_deref() == Some(v) {
            return Ok(());
        }
        let entry = ChangedEntry {
            seq,
            key: k.to_vec(),
            value: v.to_vec(),
            class: taxonomy.classify(k),
        };
        debug!(
            "changed #{} key={} ({} B) value={} B category={:?}",
            seq,
            crate::util::display_text(k),
            k.len(),
            v.len(),
            entry.class.category
        );
        seq += 1;
        record_entry_changed();
        if let Err(e) = cb(entry) {
            cb_err = Some(e);
            return Err(anyhow!("diff aborted by consumer"));
        }
        Ok(())
    });

    match (scan, cb_err) {
        (_, Some(e)) => Err(e),
        (Ok(()), None) => Ok(seq),
        (Err(e), None) => {
            // SnapshotAccess уже пришёл из lookup в `before`; остальное считаем сбоем скана `after`
            if matches!(e.downcast_ref::<VizError>(), Some(VizError::SnapshotAccess { .. })) {
                Err(e)
            } else {
                Err(VizError::SnapshotAccess {
                    side: "after",
                    reason: format!("{:#}", e),
                }
                .into())
            }
        }
    }
}

/// Collect every changed entry.
pub fn diff<B, A>(before: &B, after: &A, taxonomy: &Taxonomy) -> Result<Vec<ChangedEntry>>
where
    B: Snapshot + ?Sized,
    A: Snapshot + ?Sized,
{
    let mut out = Vec::new();
    diff_stream(before, after, taxonomy, |e| {
        out.push(e);
        Ok(())
    })?;
    Ok(out)
}
