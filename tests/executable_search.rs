use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jarvis_match::config::ExecutableConfig;
use jarvis_match::exe::walk::DirFilter;
use jarvis_match::exe::{ExecutableResolver, Search};
use tempfile::TempDir;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

fn config(root: &Path) -> ExecutableConfig {
    ExecutableConfig {
        roots: vec![root.to_path_buf()],
        ..ExecutableConfig::default()
    }
}

fn score_of(search: &Search, root: &Path, rel: &str) -> f64 {
    let path = root.join(rel);
    search
        .candidates
        .iter()
        .find(|c| c.path == path)
        .map(|c| c.score)
        .unwrap_or_else(|| panic!("{} not ranked", path.display()))
}

/// Refuses one directory, like a permission error would
struct LockedDir {
    locked: PathBuf,
}

impl DirFilter for LockedDir {
    fn admit(&self, dir: &Path) -> io::Result<()> {
        if dir == self.locked {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"));
        }
        Ok(())
    }
}

#[test]
fn ties_break_by_path() {
    let tmp = TempDir::new().unwrap();
    touch(tmp.path(), "b/foo.exe");
    touch(tmp.path(), "a/foo.exe");

    let resolver = ExecutableResolver::new(&config(tmp.path()));
    let first = resolver.rank("foo");
    assert_eq!(first.candidates.len(), 2);
    assert_eq!(first.candidates[0].score, first.candidates[1].score);
    assert_eq!(first.candidates[0].path, tmp.path().join("a/foo.exe"));

    for _ in 0..5 {
        let again = resolver.rank("foo");
        let paths: Vec<_> = again.candidates.iter().map(|c| &c.path).collect();
        let expected: Vec<_> = first.candidates.iter().map(|c| &c.path).collect();
        assert_eq!(paths, expected);
        assert_eq!(resolver.resolve("foo"), Some(tmp.path().join("a/foo.exe")));
    }
}

#[test]
fn ties_compare_whole_path_strings() {
    let tmp = TempDir::new().unwrap();
    touch(tmp.path(), "x/foo.exe");
    touch(tmp.path(), "x-y/foo.exe");

    let search = ExecutableResolver::new(&config(tmp.path())).rank("foo");
    assert_eq!(search.candidates.len(), 2);
    assert_eq!(search.candidates[0].score, search.candidates[1].score);
    // '-' sorts before '/', so "x-y/" precedes "x/" as a string
    assert_eq!(search.candidates[0].path, tmp.path().join("x-y/foo.exe"));
    assert_eq!(search.candidates[1].path, tmp.path().join("x/foo.exe"));
}

#[test]
fn installer_marker_ranks_lower() {
    let tmp = TempDir::new().unwrap();
    touch(tmp.path(), "vendor/player/player.exe");
    touch(tmp.path(), "vendor/installer/player/player.exe");

    let search = ExecutableResolver::new(&config(tmp.path())).rank("player");
    let clean = score_of(&search, tmp.path(), "vendor/player/player.exe");
    let installer = score_of(&search, tmp.path(), "vendor/installer/player/player.exe");
    assert!(installer < clean);
    assert_eq!(search.best_path(), Some(tmp.path().join("vendor/player/player.exe").as_path()));
}

#[test]
fn folder_named_after_target_ranks_higher() {
    let tmp = TempDir::new().unwrap();
    touch(tmp.path(), "games/steam/steam.exe");
    touch(tmp.path(), "games/valve/steam.exe");

    let search = ExecutableResolver::new(&config(tmp.path())).rank("Steam");
    let named = score_of(&search, tmp.path(), "games/steam/steam.exe");
    let other = score_of(&search, tmp.path(), "games/valve/steam.exe");
    assert!(named > other);
}

#[test]
fn unreadable_subtree_does_not_stop_search() {
    let tmp = TempDir::new().unwrap();
    touch(tmp.path(), "locked/editor.exe");
    touch(tmp.path(), "open/editor.exe");
    touch(tmp.path(), "open/nested/viewer.exe");

    let resolver = ExecutableResolver::with_filter(
        &config(tmp.path()),
        LockedDir {
            locked: tmp.path().join("locked"),
        },
    );
    let search = resolver.rank("editor");

    assert_eq!(search.best_path(), Some(tmp.path().join("open/editor.exe").as_path()));
    assert_eq!(search.candidates.len(), 2);
    assert_eq!(search.diagnostics.skipped.len(), 1);
    assert_eq!(search.diagnostics.skipped[0].path, tmp.path().join("locked"));
}

#[test]
fn exact_name_beats_longer_names() {
    let tmp = TempDir::new().unwrap();
    touch(tmp.path(), "Program Files/Google/Chrome/Application/chrome.exe");
    touch(tmp.path(), "Program Files/Google/Chrome/Application/chrome_proxy.exe");
    touch(tmp.path(), "Program Files/Google/Update/GoogleUpdateSetup.exe");

    let resolver = ExecutableResolver::new(&config(tmp.path()));
    let best = resolver.resolve("chrome.exe").unwrap();
    assert!(best.ends_with("Application/chrome.exe"));
}

#[test]
fn no_candidates_is_none() {
    let tmp = TempDir::new().unwrap();
    touch(tmp.path(), "docs/readme.md");
    let resolver = ExecutableResolver::new(&config(tmp.path()));
    assert!(resolver.resolve("readme").is_none());
    assert!(resolver.rank("readme").candidates.is_empty());
}
