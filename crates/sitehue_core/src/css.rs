//! Color scanning over raw stylesheet text.
//!
//! This is a heuristic: palette roles are assigned purely by first-seen order,
//! not by what the CSS rule actually styles.

use std::collections::HashSet;

use regex::Regex;

use crate::color::normalize;
use crate::palette::Palette;

lazy_static::lazy_static! {
    static ref COLOR_TOKEN: Regex =
        Regex::new(r"(?i)#(?:[0-9a-f]{6}|[0-9a-f]{3})\b|rgba?\([^)]+\)").unwrap();
}

/// Maximum number of entries in the CSS color list.
pub const CSS_COLOR_LIMIT: usize = 20;

/// Every color token in `css`, in scan order, duplicates included.
pub fn scan_colors(css: &str) -> Vec<&str> {
    COLOR_TOKEN.find_iter(css).map(|m| m.as_str()).collect()
}

/// Palette from the first four distinct tokens, normalized.
pub fn extract_palette(css: &str) -> Palette {
    let unique = dedupe(scan_colors(css));
    Palette::from_candidates(unique.iter().take(4).map(|token| normalize(token)))
}

/// Sorted, normalized, deduplicated CSS color list capped at [`CSS_COLOR_LIMIT`].
pub fn color_list(css: &str) -> Vec<String> {
    let lowered = dedupe(scan_colors(css).into_iter().map(str::to_lowercase));
    let mut colors = dedupe(lowered.iter().map(|c| normalize(c)));
    colors.truncate(CSS_COLOR_LIMIT);
    colors.sort();
    colors
}

/// Remove repeats, keeping the first occurrence of each value.
pub fn dedupe<T, I>(items: I) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    T: Eq + std::hash::Hash + Clone,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
