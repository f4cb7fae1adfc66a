//! Output files of one run: the global diagram plus one per bucket.
//!
//! Bucket files are opened lazily, on the first entry of their category, and
//! live in `BucketStreams` for the duration of the run. They are closed
//! exactly once: by `close_all` at the end of the pass, or by `abort` when
//! the pass fails (flush + close, errors only logged).

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::consts::DOT_EXT;
use crate::dot::DotWriter;
use crate::error::VizError;
use crate::metrics::record_dot_file_written;
use crate::taxonomy::{CategoryId, Taxonomy};
use crate::util::file_component;

pub(crate) type FileDot = DotWriter<BufWriter<File>>;

pub(crate) fn create_dot(path: &Path) -> Result<FileDot, VizError> {
    let f = File::create(path).map_err(|e| VizError::output(path, e))?;
    Ok(DotWriter::new(BufWriter::new(f)))
}

/// Flush and close; the file is complete only if this returns Ok.
pub(crate) fn close_dot(path: &Path, w: FileDot) -> Result<(), VizError> {
    let f = w
        .into_inner()
        .into_inner()
        .map_err(|e| VizError::output(path, e.into_error()))?;
    f.sync_all().map_err(|e| VizError::output(path, e))?;
    let bytes = f.metadata().map(|m| m.len()).unwrap_or(0);
    drop(f);
    record_dot_file_written(bytes);
    info!("wrote {} ({} B)", path.display(), bytes);
    Ok(())
}

/// Flush and close a file that was never terminated. Not counted as written.
pub(crate) fn abandon_dot(path: &Path, w: FileDot) -> Result<(), VizError> {
    let f = w
        .into_inner()
        .into_inner()
        .map_err(|e| VizError::output(path, e.into_error()))?;
    f.sync_all().map_err(|e| VizError::output(path, e))?;
    warn!("left unfinished: {}", path.display());
    Ok(())
}

pub(crate) fn global_path(out_dir: &Path, prefix: &str, number: usize) -> PathBuf {
    out_dir.join(format!("{}_{}.{}", prefix, number, DOT_EXT))
}

pub(crate) fn bucket_path(
    out_dir: &Path,
    prefix: &str,
    number: usize,
    bucket: &str,
    open_index: usize,
) -> PathBuf {
    out_dir.join(format!(
        "{}_{}_{}_{}.{}",
        prefix,
        number,
        file_component(bucket),
        open_index,
        DOT_EXT
    ))
}

pub(crate) struct BucketStream {
    pub id: CategoryId,
    pub path: PathBuf,
    pub entries: usize,
    pub w: FileDot,
}

/// A bucket file that was closed successfully.
#[derive(Clone, Debug)]
pub(crate) struct ClosedBucket {
    pub id: CategoryId,
    pub path: PathBuf,
    pub entries: usize,
}

pub(crate) struct BucketStreams {
    out_dir: PathBuf,
    prefix: String,
    number: usize,
    // порядок открытия = порядок закрытия и рендера
    streams: Vec<BucketStream>,
    index: HashMap<CategoryId, usize>,
}

impl BucketStreams {
    pub fn new(out_dir: &Path, prefix: &str, number: usize) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            prefix: prefix.to_string(),
            number,
            streams: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Stream of `id`, created (graph + bucket cluster opened) on first use.
    pub fn get_or_open(&mut self, id: CategoryId, taxonomy: &Taxonomy) -> Result<&mut BucketStream, VizError> {
        if let Some(&i) = self.index.get(&id) {
            return Ok(&mut self.streams[i]);
        }
        let open_index = self.streams.len();
        let path = bucket_path(
            &self.out_dir,
            &self.prefix,
            self.number,
            taxonomy.bucket_name(id),
            open_index,
        );
        let mut w = create_dot(&path)?;
        w.begin_graph()
            .and_then(|_| w.begin_cluster(0, taxonomy.label(id)))
            .map_err(|e| VizError::output(&path, e))?;
        self.streams.push(BucketStream {
            id,
            path,
            entries: 0,
            w,
        });
        self.index.insert(id, open_index);
        Ok(&mut self.streams[open_index])
    }

    /// Terminate and close every stream, in opening order. A failure does not
    /// stop the remaining streams from being closed; the first one is returned.
    pub fn close_all(self) -> Result<Vec<ClosedBucket>, VizError> {
        let mut closed = Vec::with_capacity(self.streams.len());
        let mut first_err: Option<VizError> = None;
        for mut s in self.streams {
            let trailer = s
                .w
                .newline()
                .and_then(|_| s.w.end_cluster())
                .and_then(|_| s.w.end_graph())
                .map_err(|e| VizError::output(&s.path, e));
            let res = trailer.and_then(|_| close_dot(&s.path, s.w));
            match res {
                Ok(()) => closed.push(ClosedBucket {
                    id: s.id,
                    path: s.path,
                    entries: s.entries,
                }),
                Err(e) => {
                    warn!("{}", e);
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(closed),
        }
    }

    /// Flush and close everything without terminating the documents.
    pub fn abort(self) {
        for s in self.streams {
            if let Err(e) = abandon_dot(&s.path, s.w) {
                warn!("abort: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_deterministic() {
        let dir = Path::new("/tmp/out");
        assert_eq!(
            global_path(dir, "changes", 3),
            PathBuf::from("/tmp/out/changes_3.dot")
        );
        assert_eq!(
            bucket_path(dir, "changes", 3, "ethereum-config-", 1),
            PathBuf::from("/tmp/out/changes_3_ethereum-config-_1.dot")
        );
        assert_eq!(
            bucket_path(dir, "changes", 0, "a/b", 0),
            PathBuf::from("/tmp/out/changes_0_a_b_0.dot")
        );
    }
}
