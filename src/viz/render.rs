//! Hand written .dot files to an external renderer.
//!
//! Rendering never fails a run: the caller logs the error, counts it and
//! moves on to the next file. There is no retry.

use std::path::Path;
use std::process::Command;

use log::{debug, warn};

use crate::config::VizConfig;
use crate::error::VizError;
use crate::metrics::record_render;

pub trait Renderer {
    fn render(&self, dot_file: &Path) -> Result<(), VizError>;
}

/// `dot -T<format> -O <file>`: writes `<file>.<ext>` next to the input.
#[derive(Clone, Debug)]
pub struct DotCommand {
    pub binary: String,
    pub format: String,
}

impl DotCommand {
    pub fn from_config(cfg: &VizConfig) -> Self {
        Self {
            binary: cfg.dot_binary.clone(),
            format: cfg.render_format.clone(),
        }
    }
}

impl Renderer for DotCommand {
    fn render(&self, dot_file: &Path) -> Result<(), VizError> {
        let out = Command::new(&self.binary)
            .arg(format!("-T{}", self.format))
            .arg("-O")
            .arg(dot_file)
            .output()
            .map_err(|e| VizError::Render {
                path: dot_file.to_path_buf(),
                reason: format!("spawn {}: {}", self.binary, e),
            })?;
        if !out.status.success() {
            let mut text = String::from_utf8_lossy(&out.stderr).trim().to_string();
            if text.is_empty() {
                text = String::from_utf8_lossy(&out.stdout).trim().to_string();
            }
            return Err(VizError::Render {
                path: dot_file.to_path_buf(),
                reason: format!("{}: {}", out.status, text),
            });
        }
        debug!("rendered {}", dot_file.display());
        Ok(())
    }
}

/// Renderer that does nothing (rendering disabled).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRender;

impl Renderer for NoRender {
    fn render(&self, _dot_file: &Path) -> Result<(), VizError> {
        Ok(())
    }
}

/// Render one file; a failure is logged, counted and returned as a message.
pub(crate) fn render_reported(r: &dyn Renderer, dot_file: &Path) -> Option<String> {
    match r.render(dot_file) {
        Ok(()) => {
            record_render(true);
            None
        }
        Err(e) => {
            record_render(false);
            warn!("{}", e);
            Some(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_a_render_error() {
        let r = DotCommand {
            binary: "snapviz-no-such-renderer".into(),
            format: "png".into(),
        };
        let err = r.render(Path::new("nothing.dot")).unwrap_err();
        assert!(matches!(err, VizError::Render { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn reported_failure_becomes_message() {
        let r = DotCommand {
            binary: "snapviz-no-such-renderer".into(),
            format: "png".into(),
        };
        let msg = render_reported(&r, Path::new("x.dot")).expect("must fail");
        assert!(msg.contains("x.dot"));
        assert!(render_reported(&NoRender, Path::new("x.dot")).is_none());
    }
}
