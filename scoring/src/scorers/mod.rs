pub mod keyword;
pub mod structural;

pub use keyword::*;
pub use structural::*;

/// Number of `keywords` found in `lower_text` by substring containment.
pub(crate) fn count_keyword_hits(lower_text: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|keyword| lower_text.contains(*keyword))
        .count()
}
