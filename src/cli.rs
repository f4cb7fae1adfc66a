use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::VizConfig;
use crate::metrics;
use crate::snapshot::MemSnapshot;
use crate::taxonomy::Taxonomy;
use crate::viz::{compare_series, DiffReport, DotCommand, NoRender, Renderer, Visualizer};

/// Known picture selectors for `pic`.
pub const PICTURES: &[&str] = &["database_map"];

#[derive(Parser, Debug)]
#[command(
    name = "snapviz",
    version,
    about = "Draw what changed between two key-value snapshots (Graphviz DOT)",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

/// Options shared by every drawing command (override SNAPVIZ_* env).
#[derive(Args, Debug, Clone, Default)]
pub struct OutputOpts {
    /// Directory for .dot files and images
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    /// File name prefix
    #[arg(long)]
    pub prefix: Option<String>,
    /// JSON taxonomy file: [{"prefix": "...", "label": "..."}]
    #[arg(long)]
    pub taxonomy: Option<PathBuf>,
    /// Grid columns for long values
    #[arg(long)]
    pub columns: Option<usize>,
    /// Collapse the middle of long value grids
    #[arg(long)]
    pub compress: bool,
    /// Only write .dot files, do not run the renderer
    #[arg(long)]
    pub no_render: bool,
    /// Print run reports as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Compare two JSONL dumps ({"key_hex","value_hex"} per line)
    Diff {
        #[arg(long)]
        before: PathBuf,
        #[arg(long)]
        after: PathBuf,
        /// Run number used in file names
        #[arg(long, default_value_t = 0)]
        number: usize,
        #[command(flatten)]
        out: OutputOpts,
    },
    /// Compare consecutive dumps: (d0,d1) -> run 0, (d1,d2) -> run 1, ...
    Series {
        #[arg(long = "dump", required = true, num_args = 1..)]
        dumps: Vec<PathBuf>,
        #[command(flatten)]
        out: OutputOpts,
    },
    /// Regenerate a named picture
    Pic {
        #[arg(long)]
        name: String,
        /// Directory with the *.jsonl dumps of the picture
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        #[command(flatten)]
        out: OutputOpts,
    },
    /// Print process metrics (JSON)
    Metrics,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    run_cmd(cli.cmd)
}

pub fn run_cmd(cmd: Cmd) -> Result<()> {
    match cmd {
        Cmd::Diff {
            before,
            after,
            number,
            out,
        } => cmd_diff(&before, &after, number, &out),
        Cmd::Series { dumps, out } => cmd_series(&dumps, &out),
        Cmd::Pic { name, dir, out } => cmd_pic(&name, &dir, &out),
        Cmd::Metrics => cmd_metrics_json(),
    }
}

fn build_config(out: &OutputOpts) -> VizConfig {
    let mut cfg = VizConfig::from_env();
    if let Some(d) = &out.out_dir {
        cfg = cfg.with_out_dir(d.clone());
    }
    if let Some(p) = &out.prefix {
        cfg = cfg.with_file_prefix(p.clone());
    }
    if let Some(c) = out.columns {
        cfg = cfg.with_grid_columns(c);
    }
    if out.compress {
        cfg = cfg.with_compress_values(true);
    }
    if out.no_render {
        cfg = cfg.with_render(false);
    }
    cfg
}

fn load_taxonomy(out: &OutputOpts) -> Result<Taxonomy> {
    match &out.taxonomy {
        Some(p) => Taxonomy::from_json_file(p),
        None => Ok(Taxonomy::chain_db()),
    }
}

fn renderer_for(cfg: &VizConfig) -> Box<dyn Renderer> {
    if cfg.render {
        Box::new(DotCommand::from_config(cfg))
    } else {
        Box::new(NoRender)
    }
}

pub fn cmd_diff(before: &Path, after: &Path, number: usize, out: &OutputOpts) -> Result<()> {
    let cfg = build_config(out);
    let taxonomy = load_taxonomy(out)?;
    let renderer = renderer_for(&cfg);
    let b = MemSnapshot::load_jsonl(before)?;
    let a = MemSnapshot::load_jsonl(after)?;

    let viz = Visualizer::new(&cfg, &taxonomy, renderer.as_ref());
    let report = viz.compare(&b, &a, number)?;
    print_reports(std::slice::from_ref(&report), out.json)
}

pub fn cmd_series(dumps: &[PathBuf], out: &OutputOpts) -> Result<()> {
    if dumps.len() < 2 {
        return Err(anyhow!("series needs at least two dumps, got {}", dumps.len()));
    }
    let cfg = build_config(out);
    let taxonomy = load_taxonomy(out)?;
    let renderer = renderer_for(&cfg);
    let snaps = dumps
        .iter()
        .map(|p| MemSnapshot::load_jsonl(p))
        .collect::<Result<Vec<_>>>()?;

    let viz = Visualizer::new(&cfg, &taxonomy, renderer.as_ref());
    let reports = compare_series(&viz, &snaps)?;
    print_reports(&reports, out.json)
}

pub fn cmd_pic(name: &str, dir: &Path, out: &OutputOpts) -> Result<()> {
    match name {
        "database_map" => {
            let dumps = list_dumps(dir)?;
            cmd_series(&dumps, out)
        }
        other => {
            println!(
                "unknown picture '{}'; usage: snapviz pic --name <{}> [--dir DIR]",
                other,
                PICTURES.join("|")
            );
            Ok(())
        }
    }
}

/// `*.jsonl` files of `dir`, sorted by name.
pub fn list_dumps(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for e in std::fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let p = e?.path();
        if p.extension().map(|x| x == "jsonl").unwrap_or(false) {
            out.push(p);
        }
    }
    out.sort();
    Ok(out)
}

pub fn cmd_metrics_json() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&metrics::snapshot())?);
    Ok(())
}

fn print_reports(reports: &[DiffReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }
    for r in reports {
        println!(
            "run {}: {} changed -> {}",
            r.number,
            r.changed,
            r.global_file.display()
        );
        for b in &r.buckets {
            println!("  {:<20} {:>5}  {}", b.label, b.entries, b.file.display());
        }
        for f in &r.render_failures {
            println!("  render failed: {}", f);
        }
    }
    Ok(())
}
