use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Turn command-line arguments into the raw path list the builder consumes.
///
/// With `textfile`, every argument is a UTF-8 list of paths (one per line).
/// Directories are replaced by the files inside them, sorted by name, down to
/// `directory_depth` levels. Everything else passes through untouched; the
/// catalog decides later whether it is usable.
pub fn collect_paths(args: &[PathBuf], textfile: bool, directory_depth: usize) -> Result<Vec<PathBuf>> {
    let listed = if textfile {
        let mut listed = Vec::new();
        for list in args {
            listed.extend(read_list(list)?);
        }
        listed
    } else {
        args.to_vec()
    };

    let mut paths = Vec::with_capacity(listed.len());
    for path in listed {
        if path.is_dir() {
            paths.extend(walk_dir(&path, directory_depth));
        } else {
            paths.push(path);
        }
    }
    Ok(paths)
}

fn read_list(list: &Path) -> Result<Vec<PathBuf>> {
    let bytes = fs::read(list).with_context(|| format!("reading {}", list.display()))?;
    let content = String::from_utf8(bytes).with_context(|| {
        format!("List of files to play in {} must be UTF-8 encoded", list.display())
    })?;

    Ok(content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

fn walk_dir(dir: &Path, depth: usize) -> Vec<PathBuf> {
    let files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(depth.max(1))
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    debug!(dir = %dir.display(), files = files.len(), "expanded directory");
    files
}
