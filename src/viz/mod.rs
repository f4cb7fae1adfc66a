//! viz — one comparison run: diff two snapshots and write the diagrams.
//!
//! Output of run `number`:
//! - `<prefix>_<number>.dot`: every changed entry, nodes grouped in one
//!   cluster per non-empty category (taxonomy order) plus the trailing
//!   catch-all cluster;
//! - `<prefix>_<number>_<bucket>_<k>.dot`: one per non-empty category, `k`
//!   being the order in which the bucket files were opened. Key rows skip the
//!   matched prefix and every nibble is labelled.
//!
//! Submodules:
//! - streams.rs: output files (global + lazily opened per-bucket streams).
//! - render.rs: external renderer (`dot`), non-fatal.

mod render;
mod streams;

pub use render::{DotCommand, NoRender, Renderer};

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::config::VizConfig;
use crate::diff::{diff_stream, ChangedEntry};
use crate::dot::{DotWriter, NodeId};
use crate::error::VizError;
use crate::layout::{compression_for_budget, plan_grid, plan_linear};
use crate::metrics::{record_run_aborted, record_run_completed};
use crate::nibble::{keybytes_to_hex, to_nibbles};
use crate::snapshot::Snapshot;
use crate::taxonomy::{CategoryId, Taxonomy};

use render::render_reported;
use streams::{abandon_dot, close_dot, create_dot, global_path, BucketStreams, FileDot};

/// Which diagram an entry is drawn into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// Full key, colours only.
    Global,
    /// Key without its category prefix, every nibble labelled.
    Bucket,
}

#[derive(Clone, Debug, Serialize)]
pub struct BucketReport {
    pub bucket: String,
    pub label: String,
    pub entries: usize,
    pub file: PathBuf,
}

/// Summary of one run.
#[derive(Clone, Debug, Serialize)]
pub struct DiffReport {
    pub number: usize,
    pub changed: usize,
    pub global_file: PathBuf,
    /// In the order the bucket files were opened.
    pub buckets: Vec<BucketReport>,
    pub rendered: usize,
    pub render_failures: Vec<String>,
}

/// Cluster member bookkeeping: only the index and whether a value node exists.
#[derive(Clone, Copy, Debug)]
struct Member {
    seq: usize,
    has_value: bool,
}

/// Category → ordered members, taxonomy order, catch-all last.
struct Buckets {
    configured: Vec<Vec<Member>>,
    unclassified: Vec<Member>,
}

impl Buckets {
    fn new(taxonomy: &Taxonomy) -> Self {
        Self {
            configured: vec![Vec::new(); taxonomy.len()],
            unclassified: Vec::new(),
        }
    }

    fn push(&mut self, id: CategoryId, m: Member) {
        match id {
            CategoryId::Configured(i) => self.configured[i].push(m),
            CategoryId::Unclassified => self.unclassified.push(m),
        }
    }

    fn write_clusters<W: Write>(&self, w: &mut DotWriter<W>, taxonomy: &Taxonomy) -> std::io::Result<()> {
        for c in taxonomy.categories() {
            let members = &self.configured[c.ordinal];
            if members.is_empty() {
                continue;
            }
            w.begin_cluster(c.ordinal, &c.label)?;
            w.cluster_members(&member_nodes(members))?;
            w.end_cluster()?;
        }
        let id = CategoryId::Unclassified;
        w.begin_cluster(taxonomy.ordinal(id), taxonomy.label(id))?;
        w.cluster_members(&member_nodes(&self.unclassified))?;
        w.end_cluster()
    }
}

fn member_nodes(members: &[Member]) -> Vec<NodeId> {
    let mut out = Vec::with_capacity(members.len() * 2);
    for m in members {
        out.push(NodeId::key(m.seq));
        if m.has_value {
            out.push(NodeId::value(m.seq));
        }
    }
    out
}

/// Draw one entry (key node, value node, edge). Returns whether a value node
/// was written; empty values get no node and no edge.
pub fn emit_entry<W: Write>(
    w: &mut DotWriter<W>,
    entry: &ChangedEntry,
    view: View,
    cfg: &VizConfig,
) -> std::io::Result<bool> {
    let key = keybytes_to_hex(&entry.key);
    let matched = entry.class.matched_len;
    let (skip, highlighted) = match view {
        View::Global => (0, 0),
        // ключ, совпадающий с префиксом целиком, рисуем полностью
        View::Bucket if matched < entry.key.len() => (2 * matched, key.len()),
        View::Bucket => (0, key.len()),
    };
    // бюджет считается по видимой части ключа (после skip)
    let compression = match cfg.key_cells {
        0 => 0,
        cells => compression_for_budget(key.len() - skip, cells),
    };
    w.key_row(entry.seq, &plan_linear(&key, skip, highlighted, compression))?;

    let val = to_nibbles(&entry.value);
    if val.is_empty() {
        return Ok(false);
    }
    let labeled = view == View::Bucket;
    if val.len() > cfg.grid_threshold {
        let plan = plan_grid(&val, cfg.grid_columns, cfg.compress_values, labeled);
        w.value_grid(entry.seq, &plan)?;
    } else {
        let highlighted = if labeled { val.len() } else { 0 };
        w.value_row(entry.seq, &plan_linear(&val, 0, highlighted, 0))?;
    }
    w.edge(NodeId::key(entry.seq), NodeId::value(entry.seq))?;
    Ok(true)
}

pub struct Visualizer<'a> {
    cfg: &'a VizConfig,
    taxonomy: &'a Taxonomy,
    renderer: &'a dyn Renderer,
}

impl<'a> Visualizer<'a> {
    pub fn new(cfg: &'a VizConfig, taxonomy: &'a Taxonomy, renderer: &'a dyn Renderer) -> Self {
        Self {
            cfg,
            taxonomy,
            renderer,
        }
    }

    /// Compare `before` with `after` and write run `number`'s diagrams.
    ///
    /// Fatal errors (snapshot access, output files) abort the run after every
    /// opened file has been flushed and closed. Render failures are only
    /// reported in the returned [`DiffReport`].
    pub fn compare<B, A>(&self, before: &B, after: &A, number: usize) -> Result<DiffReport>
    where
        B: Snapshot + ?Sized,
        A: Snapshot + ?Sized,
    {
        self.cfg.validate()?;
        std::fs::create_dir_all(&self.cfg.out_dir)
            .with_context(|| format!("create out dir {}", self.cfg.out_dir.display()))?;

        let gpath = global_path(&self.cfg.out_dir, &self.cfg.file_prefix, number);
        let mut global = create_dot(&gpath)?;
        let mut streams = BucketStreams::new(&self.cfg.out_dir, &self.cfg.file_prefix, number);
        let mut buckets = Buckets::new(self.taxonomy);

        let pass = global
            .begin_graph()
            .map_err(|e| anyhow::Error::from(VizError::output(&gpath, e)))
            .and_then(|_| {
                diff_stream(before, after, self.taxonomy, |entry| {
                    self.write_entry(&entry, &gpath, &mut global, &mut streams, &mut buckets)
                })
            })
            .and_then(|changed| {
                buckets
                    .write_clusters(&mut global, self.taxonomy)
                    .and_then(|_| global.end_graph())
                    .map_err(|e| VizError::output(&gpath, e))?;
                Ok(changed)
            });

        let changed = match pass {
            Ok(n) => n,
            Err(e) => {
                warn!("run {} aborted: {:#}", number, e);
                record_run_aborted();
                if let Err(ce) = abandon_dot(&gpath, global) {
                    warn!("abort: {}", ce);
                }
                streams.abort();
                return Err(e);
            }
        };

        info!(
            "run {}: {} changed entries, {} bucket file(s)",
            number,
            changed,
            streams.len()
        );

        let global_closed = close_dot(&gpath, global);
        if let Err(e) = global_closed {
            record_run_aborted();
            streams.abort();
            return Err(e.into());
        }
        let closed = match streams.close_all() {
            Ok(c) => c,
            Err(e) => {
                record_run_aborted();
                return Err(e.into());
            }
        };

        let mut report = DiffReport {
            number,
            changed,
            global_file: gpath.clone(),
            buckets: Vec::with_capacity(closed.len()),
            rendered: 0,
            render_failures: Vec::new(),
        };
        self.render(&gpath, &mut report);
        for b in closed {
            self.render(&b.path, &mut report);
            report.buckets.push(BucketReport {
                bucket: self.taxonomy.bucket_name(b.id).to_string(),
                label: self.taxonomy.label(b.id).to_string(),
                entries: b.entries,
                file: b.path,
            });
        }
        record_run_completed();
        Ok(report)
    }

    fn write_entry(
        &self,
        entry: &ChangedEntry,
        gpath: &Path,
        global: &mut FileDot,
        streams: &mut BucketStreams,
        buckets: &mut Buckets,
    ) -> Result<()> {
        let has_value = emit_entry(global, entry, View::Global, self.cfg)
            .map_err(|e| VizError::output(gpath, e))?;

        let id = entry.class.category;
        let stream = streams.get_or_open(id, self.taxonomy)?;
        emit_entry(&mut stream.w, entry, View::Bucket, self.cfg)
            .map_err(|e| VizError::output(&stream.path, e))?;
        stream.entries += 1;

        buckets.push(
            id,
            Member {
                seq: entry.seq,
                has_value,
            },
        );
        Ok(())
    }

    fn render(&self, path: &Path, report: &mut DiffReport) {
        if !self.cfg.render {
            return;
        }
        match render_reported(self.renderer, path) {
            None => report.rendered += 1,
            Some(msg) => report.render_failures.push(msg),
        }
    }
}

/// Compare consecutive snapshots: (s0, s1) is run 0, (s1, s2) run 1, ...
pub fn compare_series<S: Snapshot>(viz: &Visualizer<'_>, snapshots: &[S]) -> Result<Vec<DiffReport>> {
    let mut out = Vec::with_capacity(snapshots.len().saturating_sub(1));
    for (number, pair) in snapshots.windows(2).enumerate() {
        out.push(viz.compare(&pair[0], &pair[1], number)?);
    }
    Ok(out)
}
