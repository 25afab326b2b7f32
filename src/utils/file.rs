//! File utilities for corpus ingestion.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Read file content with size limit.
pub fn read_file_content(path: &Path, max_size: u64) -> std::io::Result<String> {
    let metadata = fs::metadata(path)?;

    if metadata.len() > max_size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "file exceeds maximum size: {} > {}",
                metadata.len(),
                max_size
            ),
        ));
    }

    fs::read_to_string(path)
}

pub fn is_markdown_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Every directory named `markdowns` below `root`, sorted.
pub fn find_markdown_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir() && e.file_name() == "markdowns")
        .map(|e| e.into_path())
        .collect();
    dirs.sort();
    dirs
}

/// Every `*.md` file below `dir`, sorted for a stable ingestion order.
pub fn collect_markdown_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .map(|e| e.into_path())
        .filter(|p| is_markdown_file(p))
        .collect();
    files.sort();
    files
}

/// Markdown files under several directories, each path once even when
/// one directory is nested in another.
pub fn collect_markdown_files_in(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = dirs
        .iter()
        .flat_map(|dir| collect_markdown_files(dir))
        .collect();
    files.sort();
    files.dedup();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_file_content_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "0123456789").unwrap();

        assert_eq!(read_file_content(&path, 100).unwrap(), "0123456789");
        let err = read_file_content(&path, 5).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_markdown_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let md_dir = dir.path().join("batch1").join("markdowns");
        fs::create_dir_all(md_dir.join("nested")).unwrap();
        fs::write(md_dir.join("b.md"), "b").unwrap();
        fs::write(md_dir.join("nested").join("a.MD"), "a").unwrap();
        fs::write(md_dir.join("skip.txt"), "x").unwrap();

        let dirs = find_markdown_dirs(dir.path());
        assert_eq!(dirs, vec![md_dir.clone()]);

        let files = collect_markdown_files(&md_dir);
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("b.md"));
        assert!(files[1].ends_with("nested/a.MD"));
    }

    #[test]
    fn test_nested_markdown_dirs_collect_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let outer = dir.path().join("markdowns");
        let inner = outer.join("extra").join("markdowns");
        fs::create_dir_all(&inner).unwrap();
        fs::write(outer.join("a.md"), "a").unwrap();
        fs::write(inner.join("b.md"), "b").unwrap();

        let dirs = find_markdown_dirs(dir.path());
        assert_eq!(dirs.len(), 2);

        let files = collect_markdown_files_in(&dirs);
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.md"));
        assert!(files[1].ends_with("extra/markdowns/b.md"));
    }

    #[test]
    fn test_no_markdown_dirs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_markdown_dirs(dir.path()).is_empty());
    }
}
