use crate::OutputFormat;
use std::path::{Path, PathBuf};

const MAX_FILENAME_CHARS: usize = 200;
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strips characters rejected by common filesystems, collapses whitespace and
/// caps the length at 200 characters.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect()
}

pub fn base_filename(artist: &str, title: &str) -> String {
    sanitize_filename(&format!("{} - {}", artist, title))
}

pub fn expected_output_path(output_dir: &Path, base_name: &str, format: OutputFormat) -> PathBuf {
    output_dir.join(format!("{}.{}", base_name, format.extension()))
}
