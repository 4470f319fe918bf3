//! Label cleaning for bank operation descriptions.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static NOT_WORD_OR_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\s]").expect("valid regex"));
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize a free-text label to `[A-Z0-9 ]`, single-spaced and trimmed.
///
/// Accented letters are folded to their base letter first (`é` -> `e`).
/// Anything still outside ASCII letters, digits and whitespace becomes a
/// space, whitespace runs collapse to one space, and the result is
/// upper-cased. Cleaning a cleaned label is a no-op.
pub fn clean_label(label: &str) -> String {
    let folded: String = label.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let label = NOT_WORD_OR_SPACE.replace_all(&folded, " ");
    let label = WHITESPACE_RUN.replace_all(&label, " ");
    label.trim().to_ascii_uppercase()
}
