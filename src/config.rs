//! Centralized configuration for a visualization run.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - VizConfig::from_env() reads SNAPVIZ_* variables; unparsable values keep the default.
//! - Fluent with_* setters for programmatic overrides (CLI flags, tests).
//!
//! Defaults reproduce the classic diagrams:
//! - values longer than 64 nibbles are drawn as a 64-column grid, uncompressed;
//! - key rows are never shortened (`key_cells == 0`);
//! - every written .dot file is handed to `dot -Tpng:gd -O`.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::consts::{
    DEFAULT_DOT_BIN, DEFAULT_FILE_PREFIX, DEFAULT_GRID_COLUMNS, DEFAULT_GRID_THRESHOLD,
    DEFAULT_RENDER_FORMAT,
};

#[derive(Clone, Debug)]
pub struct VizConfig {
    /// Directory receiving the .dot files (and rendered images).
    /// Env: SNAPVIZ_OUT_DIR (default ".")
    pub out_dir: PathBuf,

    /// File name prefix: <prefix>_<number>.dot, <prefix>_<number>_<bucket>_<k>.dot
    /// Env: SNAPVIZ_FILE_PREFIX (default "changes")
    pub file_prefix: String,

    /// Values with more nibbles than this are drawn as a grid.
    /// Env: SNAPVIZ_GRID_THRESHOLD (default 64)
    pub grid_threshold: usize,

    /// Cells per grid row.
    /// Env: SNAPVIZ_GRID_COLUMNS (default 64)
    pub grid_columns: usize,

    /// Collapse the middle rows/columns of value grids.
    /// Env: SNAPVIZ_COMPRESS_VALUES (default false)
    pub compress_values: bool,

    /// Explicit cells per key row; longer keys collapse their middle into
    /// one elision so every key row has the same width (0 = off).
    /// Env: SNAPVIZ_KEY_CELLS (default 0)
    pub key_cells: usize,

    /// Run the external renderer after each file is written.
    /// Env: SNAPVIZ_RENDER (default true)
    pub render: bool,

    /// Renderer executable.
    /// Env: SNAPVIZ_DOT_BIN (default "dot")
    pub dot_binary: String,

    /// Renderer output format (-T argument).
    /// Env: SNAPVIZ_RENDER_FORMAT (default "png:gd")
    pub render_format: String,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            grid_threshold: DEFAULT_GRID_THRESHOLD,
            grid_columns: DEFAULT_GRID_COLUMNS,
            compress_values: false,
            key_cells: 0,
            render: true,
            dot_binary: DEFAULT_DOT_BIN.to_string(),
            render_format: DEFAULT_RENDER_FORMAT.to_string(),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        let s = v.trim().to_ascii_lowercase();
        s == "1" || s == "true" || s == "on" || s == "yes"
    })
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<usize>().ok())
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl VizConfig {
    /// Defaults overridden by SNAPVIZ_* environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(s) = env_string("SNAPVIZ_OUT_DIR") {
            cfg.out_dir = PathBuf::from(s);
        }
        if let Some(s) = env_string("SNAPVIZ_FILE_PREFIX") {
            cfg.file_prefix = s;
        }
        if let Some(n) = env_usize("SNAPVIZ_GRID_THRESHOLD") {
            cfg.grid_threshold = n;
        }
        if let Some(n) = env_usize("SNAPVIZ_GRID_COLUMNS") {
            cfg.grid_columns = n;
        }
        if let Some(on) = env_flag("SNAPVIZ_COMPRESS_VALUES") {
            cfg.compress_values = on;
        }
        if let Some(n) = env_usize("SNAPVIZ_KEY_CELLS") {
            cfg.key_cells = n;
        }
        if let Some(on) = env_flag("SNAPVIZ_RENDER") {
            cfg.render = on;
        }
        if let Some(s) = env_string("SNAPVIZ_DOT_BIN") {
            cfg.dot_binary = s;
        }
        if let Some(s) = env_string("SNAPVIZ_RENDER_FORMAT") {
            cfg.render_format = s;
        }

        cfg
    }

    pub fn with_out_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.out_dir = dir.into();
        self
    }

    pub fn with_file_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn with_grid_threshold(mut self, nibbles: usize) -> Self {
        self.grid_threshold = nibbles;
        self
    }

    pub fn with_grid_columns(mut self, columns: usize) -> Self {
        self.grid_columns = columns;
        self
    }

    pub fn with_compress_values(mut self, on: bool) -> Self {
        self.compress_values = on;
        self
    }

    pub fn with_key_cells(mut self, cells: usize) -> Self {
        self.key_cells = cells;
        self
    }

    pub fn with_render(mut self, on: bool) -> Self {
        self.render = on;
        self
    }

    pub fn with_dot_binary<S: Into<String>>(mut self, bin: S) -> Self {
        self.dot_binary = bin.into();
        self
    }

    pub fn with_render_format<S: Into<String>>(mut self, format: S) -> Self {
        self.render_format = format.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_columns == 0 {
            return Err(anyhow!("grid_columns must be > 0"));
        }
        if self.file_prefix.is_empty() {
            return Err(anyhow!("file_prefix must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_builder() {
        let cfg = VizConfig::default();
        assert_eq!(cfg.grid_columns, 64);
        assert_eq!(cfg.grid_threshold, 64);
        assert!(!cfg.compress_values);
        assert!(cfg.render);
        assert!(cfg.validate().is_ok());

        let cfg = cfg
            .with_grid_columns(16)
            .with_compress_values(true)
            .with_render(false)
            .with_file_prefix("geth_changes");
        assert_eq!(cfg.grid_columns, 16);
        assert!(cfg.compress_values);
        assert!(!cfg.render);
        assert_eq!(cfg.file_prefix, "geth_changes");
    }

    #[test]
    fn validate_rejects_zero_columns_and_empty_prefix() {
        assert!(VizConfig::default().with_grid_columns(0).validate().is_err());
        assert!(VizConfig::default().with_file_prefix("").validate().is_err());
    }
}
