//! Utility modules.

pub mod file;
pub mod text;

pub use file::{collect_markdown_files, collect_markdown_files_in, find_markdown_dirs, read_file_content};
pub use text::preview;
