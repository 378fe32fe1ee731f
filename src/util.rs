use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// First `max_chars` characters of `input`, never splitting a code point.
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((index, _)) => &input[..index],
        None => input,
    }
}

pub fn char_count(input: &str) -> usize {
    input.chars().count()
}

/// Character offset of a byte index that lies on a char boundary.
pub fn char_offset(input: &str, byte_index: usize) -> usize {
    input[..byte_index].chars().count()
}

/// Literal containment where ASCII needles match ASCII-case-insensitively
/// and everything else matches exactly. `lowered` must be
/// `haystack.to_ascii_lowercase()`, which keeps byte offsets aligned.
pub fn find_literal(haystack: &str, lowered: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    if needle.is_ascii() {
        lowered.find(&needle.to_ascii_lowercase())
    } else {
        haystack.find(needle)
    }
}

pub fn contains_literal(haystack: &str, lowered: &str, needle: &str) -> bool {
    find_literal(haystack, lowered, needle).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_respects_multibyte_boundaries() {
        assert_eq!(truncate_chars("服务器配置", 3), "服务器");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 2), "");
    }

    #[test]
    fn find_literal_is_case_insensitive_only_for_ascii_needles() {
        let text = "采购 Memory 64GB 内存";
        let lowered = text.to_ascii_lowercase();
        assert_eq!(find_literal(text, &lowered, "memory"), Some(7));
        assert!(contains_literal(text, &lowered, "内存"));
        assert!(!contains_literal(text, &lowered, ""));
        assert_eq!(char_offset(text, 7), 3);
    }

    #[test]
    fn sha256_hex_matches_known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn normalize_whitespace_collapses_runs() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
    }
}
