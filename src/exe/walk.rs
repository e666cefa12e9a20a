//! Depth-bounded executable discovery
//!
//! Traversal is delegated to `walkdir`. Every per-entry error it reports is
//! recorded in [`WalkDiagnostics`] and the walk carries on with the siblings
//! of the directory that failed.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::debug;
use walkdir::WalkDir;

/// Decides whether a directory may be listed. Consulted for each directory
/// the walk reaches before its contents are read; a refusal is reported the
/// same way as an OS read error.
pub trait DirFilter: Sync {
    fn admit(&self, dir: &Path) -> io::Result<()>;
}

/// Lists everything the OS lets us list
#[derive(Debug, Clone, Copy, Default)]
pub struct AllDirs;

impl DirFilter for AllDirs {
    fn admit(&self, _dir: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// A directory that could not be listed
#[derive(Debug, Clone)]
pub struct SkippedDir {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct WalkDiagnostics {
    /// Directories whose contents were listed
    pub dirs_visited: usize,
    pub skipped: Vec<SkippedDir>,
    pub timed_out: bool,
}

impl WalkDiagnostics {
    pub fn merge(&mut self, other: WalkDiagnostics) {
        self.dirs_visited += other.dirs_visited;
        self.skipped.extend(other.skipped);
        self.timed_out |= other.timed_out;
    }

    fn skip(&mut self, path: PathBuf, error: String) {
        debug!(dir = %path.display(), error = %error, "skipping unreadable entry");
        self.skipped.push(SkippedDir { path, error });
    }
}

/// An executable found on disk
#[derive(Debug, Clone)]
pub struct Found {
    pub path: PathBuf,
    pub canonical: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct Walk {
    pub found: Vec<Found>,
    pub diagnostics: WalkDiagnostics,
}

#[derive(Debug, Clone, Copy)]
pub struct WalkOptions<'a> {
    pub extension: &'a str,
    pub max_depth: usize,
    pub deadline: Option<Instant>,
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    match path.extension() {
        Some(ext) => ext.to_string_lossy().eq_ignore_ascii_case(extension),
        None => extension.is_empty(),
    }
}

/// Collect executables under `root`; `root` itself is depth 0 and files
/// directly inside a directory at `max_depth` are still collected
pub fn walk_root(filter: &dyn DirFilter, root: &Path, options: WalkOptions<'_>) -> Walk {
    let mut walk = Walk::default();
    let mut seen = HashSet::new();
    // Last directory counted as listed, so a read error that follows it can
    // take the count back
    let mut listed: Option<PathBuf> = None;

    let mut entries = WalkDir::new(root)
        .max_depth(options.max_depth.saturating_add(1))
        .follow_links(false)
        .into_iter();

    while let Some(item) = entries.next() {
        if options.deadline.is_some_and(|d| Instant::now() >= d) {
            walk.diagnostics.timed_out = true;
            break;
        }

        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                if e.io_error().is_some() && listed.as_deref() == Some(path.as_path()) {
                    walk.diagnostics.dirs_visited -= 1;
                    listed = None;
                }
                walk.diagnostics.skip(path, e.to_string());
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            if entry.depth() > options.max_depth {
                continue;
            }
            if let Err(e) = filter.admit(entry.path()) {
                walk.diagnostics.skip(entry.path().to_path_buf(), e.to_string());
                entries.skip_current_dir();
                continue;
            }
            walk.diagnostics.dirs_visited += 1;
            listed = Some(entry.path().to_path_buf());
            continue;
        }

        let path = entry.path();
        let is_file = file_type.is_file() || (file_type.is_symlink() && path.is_file());
        if is_file && has_extension(path, options.extension) {
            let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if seen.insert(canonical.clone()) {
                walk.found.push(Found {
                    path: entry.into_path(),
                    canonical,
                });
            }
        }
    }

    walk
}

/// Every filesystem root visible to the process
#[cfg(windows)]
pub fn drive_roots() -> Vec<PathBuf> {
    (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|root| root.exists())
        .collect()
}

/// Every filesystem root visible to the process
#[cfg(not(windows))]
pub fn drive_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/")]
}
