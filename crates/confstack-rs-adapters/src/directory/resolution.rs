//! Directory scanning and load ordering.

use super::specifier::ExtensionMap;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One candidate file found in a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub dir: PathBuf,
    /// Basename without the matched extension.
    pub name: String,
    /// Matched extension, including the leading `.`.
    pub ext: String,
    dir_index: usize,
    name_index: usize,
}

impl ResolvedFile {
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}{}", self.name, self.ext))
    }
}

/// Find every allowed file in `dirs` and sort them lowest precedence first.
///
/// Files are ordered by their basename's position in `allowed`, then by the
/// position of their directory in `dirs`, then by file name.
pub(crate) fn resolve_files(
    dirs: &[PathBuf],
    allowed: &[String],
    extensions: &ExtensionMap,
) -> io::Result<Vec<ResolvedFile>> {
    let mut files = Vec::new();
    for (dir_index, dir) in dirs.iter().enumerate() {
        scan_directory(dir, dir_index, allowed, extensions, &mut files)?;
    }
    files.sort_by(|a, b| {
        a.name_index
            .cmp(&b.name_index)
            .then(a.dir_index.cmp(&b.dir_index))
            .then_with(|| (&a.name, &a.ext).cmp(&(&b.name, &b.ext)))
    });
    Ok(files)
}

fn scan_directory(
    dir: &Path,
    dir_index: usize,
    allowed: &[String],
    extensions: &ExtensionMap,
    files: &mut Vec<ResolvedFile>,
) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Some((name, ext)) = extensions.split(&file_name) else {
            continue;
        };
        let Some(name_index) = allowed.iter().position(|allowed| allowed == name) else {
            continue;
        };
        if !entry.path().is_file() {
            debug!("skipping non-file entry {}", entry.path().display());
            continue;
        }
        files.push(ResolvedFile {
            dir: dir.to_path_buf(),
            name: name.to_string(),
            ext: ext.to_string(),
            dir_index,
            name_index,
        });
    }
    Ok(())
}
