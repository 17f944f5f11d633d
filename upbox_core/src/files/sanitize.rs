//! Derives on-disk names from untrusted client file names.

use lazy_static::lazy_static;
use regex::Regex;

use super::validation::extension_of;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
}

/// Stem used when nothing usable survives sanitization.
pub const PLACEHOLDER_STEM: &str = "file";

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`, one per character.
///
/// Case is preserved and runs are not collapsed. The result never contains a
/// path separator and is never empty, `.` or `..`.
pub fn sanitize(raw_name: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(raw_name, "_").into_owned();

    match cleaned.as_str() {
        "" | "." | ".." => placeholder_for(raw_name),
        _ => cleaned,
    }
}

fn placeholder_for(raw_name: &str) -> String {
    let extension = extension_of(raw_name);
    let safe_extension = !extension.is_empty() && !UNSAFE_CHARS.is_match(&extension);

    if safe_extension {
        format!("{}.{}", PLACEHOLDER_STEM, extension)
    } else {
        PLACEHOLDER_STEM.to_string()
    }
}

/// Name for the `index`-th collision of `name`: `stem_N.ext`. Index 0 is the name itself.
pub fn collision_name(name: &str, index: u32) -> String {
    if index == 0 {
        return name.to_string();
    }

    match name.rsplit_once('.') {
        Some((stem, extension)) => format!("{}_{}.{}", stem, index, extension),
        None => format!("{}_{}", name, index),
    }
}

/// Strips any directory prefix, `/` or `\` separated.
pub fn base_name(name: &str) -> &str {
    name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name)
}
