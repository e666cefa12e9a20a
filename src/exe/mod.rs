//! Executable resolution - find the program a loosely spoken name refers to
//!
//! Used as a fallback when launching by name fails: every drive root is
//! walked to a bounded depth, each executable found is scored against the
//! requested name, and the best candidate wins. Ties are broken by path so
//! the same filesystem always yields the same answer.

pub mod score;
pub mod walk;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::ExecutableConfig;
use score::{PathRules, Signals, Target};
use walk::{AllDirs, DirFilter, Walk, WalkDiagnostics, WalkOptions, drive_roots, walk_root};

/// How many top candidates are logged at debug level
const LOG_TOP: usize = 7;

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub path: PathBuf,
    pub score: f64,
    pub signals: Signals,
}

/// Ranked candidates of one search, best first
#[derive(Debug, Clone, Default)]
pub struct Search {
    pub candidates: Vec<ScoredCandidate>,
    pub diagnostics: WalkDiagnostics,
}

impl Search {
    pub fn best(&self) -> Option<&ScoredCandidate> {
        self.candidates.first()
    }

    pub fn best_path(&self) -> Option<&Path> {
        self.best().map(|c| c.path.as_path())
    }
}

pub struct ExecutableResolver {
    config: ExecutableConfig,
    rules: PathRules,
    filter: Box<dyn DirFilter>,
}

impl ExecutableResolver {
    pub fn new(config: &ExecutableConfig) -> Self {
        Self::with_filter(config, AllDirs)
    }

    /// Resolver that only lists the directories `filter` admits
    pub fn with_filter(config: &ExecutableConfig, filter: impl DirFilter + 'static) -> Self {
        Self {
            config: config.clone(),
            rules: PathRules::new(config),
            filter: Box::new(filter),
        }
    }

    /// Path of the best matching executable, if any was found
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.rank(name).best_path().map(Path::to_path_buf)
    }

    /// Every executable found, ranked, at the configured depth
    pub fn rank(&self, name: &str) -> Search {
        self.rank_at_depth(name, self.config.max_depth)
    }

    #[hotpath::measure]
    pub fn rank_at_depth(&self, name: &str, max_depth: usize) -> Search {
        let target = Target::new(name, &self.config.extension);
        if target.is_empty() {
            return Search::default();
        }

        let roots = if self.config.roots.is_empty() {
            drive_roots()
        } else {
            self.config.roots.clone()
        };

        let started = Instant::now();
        let options = WalkOptions {
            extension: &self.config.extension,
            max_depth,
            deadline: self
                .config
                .timeout_secs
                .and_then(|s| Duration::try_from_secs_f64(s).ok())
                .and_then(|d| started.checked_add(d)),
        };

        let filter = self.filter.as_ref();
        let walks: Vec<Walk> = if self.config.parallel {
            roots
                .par_iter()
                .map(|root| walk_root(filter, root, options))
                .collect()
        } else {
            roots
                .iter()
                .map(|root| walk_root(filter, root, options))
                .collect()
        };

        let mut diagnostics = WalkDiagnostics::default();
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for walk in walks {
            diagnostics.merge(walk.diagnostics);
            for found in walk.found {
                if seen.insert(found.canonical) {
                    paths.push(found.path);
                }
            }
        }

        let mut candidates: Vec<ScoredCandidate> = paths
            .into_par_iter()
            .map(|path| {
                let signals = self.rules.score(&path, &target, &self.config.extension);
                ScoredCandidate {
                    score: signals.total(),
                    path,
                    signals,
                }
            })
            .collect();

        // Ties go to the path string, not Path's per-component order
        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.path.as_os_str().cmp(b.path.as_os_str()))
        });

        info!(
            target = %target.normalized,
            candidates = candidates.len(),
            dirs = diagnostics.dirs_visited,
            skipped = diagnostics.skipped.len(),
            timed_out = diagnostics.timed_out,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "executable search finished"
        );
        for (i, c) in candidates.iter().take(LOG_TOP).enumerate() {
            debug!("{}. score {:.3} {} {:?}", i + 1, c.score, c.path.display(), c.signals);
        }

        Search {
            candidates,
            diagnostics,
        }
    }
}
