//! Lightweight global metrics for snapviz.
//!
//! Потокобезопасные атомарные счётчики по всем прогонам процесса:
//! - сравнение снапшотов (просмотренные / изменённые записи)
//! - выходные файлы (.dot)
//! - внешний рендер (успех / ошибки)

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// ----- Diff -----
static ENTRIES_COMPARED: AtomicU64 = AtomicU64::new(0);
static ENTRIES_CHANGED: AtomicU64 = AtomicU64::new(0);
static RUNS_COMPLETED: AtomicU64 = AtomicU64::new(0);
static RUNS_ABORTED: AtomicU64 = AtomicU64::new(0);

// ----- Output -----
static DOT_FILES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static DOT_BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);

// ----- Render -----
static RENDERS_OK: AtomicU64 = AtomicU64::new(0);
static RENDER_FAILURES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub entries_compared: u64,
    pub entries_changed: u64,
    pub runs_completed: u64,
    pub runs_aborted: u64,

    pub dot_files_written: u64,
    pub dot_bytes_written: u64,

    pub renders_ok: u64,
    pub render_failures: u64,
}

impl MetricsSnapshot {
    pub fn changed_ratio(&self) -> f64 {
        if self.entries_compared == 0 {
            0.0
        } else {
            self.entries_changed as f64 / self.entries_compared as f64
        }
    }
}

// ----- Recorders -----
pub fn record_entry_compared() {
    ENTRIES_COMPARED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_entry_changed() {
    ENTRIES_CHANGED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_run_completed() {
    RUNS_COMPLETED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_run_aborted() {
    RUNS_ABORTED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_dot_file_written(bytes: u64) {
    DOT_FILES_WRITTEN.fetch_add(1, Ordering::Relaxed);
    DOT_BYTES_WRITTEN.fetch_add(bytes, Ordering::Relaxed);
}

pub fn record_render(ok: bool) {
    if ok {
        RENDERS_OK.fetch_add(1, Ordering::Relaxed);
    } else {
        RENDER_FAILURES.fetch_add(1, Ordering::Relaxed);
    }
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        entries_compared: ENTRIES_COMPARED.load(Ordering::Relaxed),
        entries_changed: ENTRIES_CHANGED.load(Ordering::Relaxed),
        runs_completed: RUNS_COMPLETED.load(Ordering::Relaxed),
        runs_aborted: RUNS_ABORTED.load(Ordering::Relaxed),

        dot_files_written: DOT_FILES_WRITTEN.load(Ordering::Relaxed),
        dot_bytes_written: DOT_BYTES_WRITTEN.load(Ordering::Relaxed),

        renders_ok: RENDERS_OK.load(Ordering::Relaxed),
        render_failures: RENDER_FAILURES.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    ENTRIES_COMPARED.store(0, Ordering::Relaxed);
    ENTRIES_CHANGED.store(0, Ordering::Relaxed);
    RUNS_COMPLETED.store(0, Ordering::Relaxed);
    RUNS_ABORTED.store(0, Ordering::Relaxed);

    DOT_FILES_WRITTEN.store(0, Ordering::Relaxed);
    DOT_BYTES_WRITTEN.store(0, Ordering::Relaxed);

    RENDERS_OK.store(0, Ordering::Relaxed);
    RENDER_FAILURES.store(0, Ordering::Relaxed);
}
