//! Seed naming conventions
//!
//! Seed files are named `YYYY_MM_DD_HHMMSS_<slug>.<ext>`. The identifier is the
//! file name without its extension, and the unit's class name is the slug in
//! StudlyCase.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Number of `_`-separated segments making up the timestamp prefix
pub const TIMESTAMP_SEGMENTS: usize = 4;

/// Optional role marker between the identifier and the extension
pub const ROLE_MARKER: &str = ".seed";

/// Extensions recognised as seed files
pub const SEED_EXTENSIONS: &[&str] = &["sql", "rs"];

static CONVENTIONAL_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}_\d{2}_\d{2}_\d{6}_\w+$").expect("valid identifier regex"));

static SEED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid name regex"));

/// Convert a snake, kebab or space separated name to StudlyCase
pub fn studly(value: &str) -> String {
    value
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Class name of the unit behind a seed identifier
pub fn class_name(identifier: &str) -> String {
    let slug: Vec<&str> = identifier.split('_').skip(TIMESTAMP_SEGMENTS).collect();
    studly(&slug.join("_"))
}

/// Derive the seed identifier from a file path
///
/// Returns `None` when the path has no recognised seed extension.
pub fn identifier_from_path(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?;
    if !SEED_EXTENSIONS.contains(&extension) {
        return None;
    }

    let stem = path.file_stem()?.to_str()?;
    let identifier = stem.strip_suffix(ROLE_MARKER).unwrap_or(stem);

    if identifier.is_empty() {
        None
    } else {
        Some(identifier.to_string())
    }
}

/// Whether an identifier follows the timestamp-prefixed convention
pub fn is_conventional(identifier: &str) -> bool {
    CONVENTIONAL_IDENTIFIER.is_match(identifier)
}

/// Whether a name can be used for a new seed
pub fn is_valid_seed_name(name: &str) -> bool {
    SEED_NAME.is_match(name)
}

/// Timestamp prefix for a newly created seed
pub fn date_prefix() -> String {
    chrono::Utc::now().format("%Y_%m_%d_%H%M%S").to_string()
}
