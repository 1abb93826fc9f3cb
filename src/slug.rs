// src/slug.rs
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::store::{ArticleStore, StoreError};

/// Derive a canonical URL-safe identifier from a title.
///
/// Lowercases and trims, spells out `&` as `-and-`, collapses every run of
/// whitespace/punctuation/dashes into a single dash and strips dashes at the
/// ends. Total and idempotent: `slugify(slugify(t)) == slugify(t)`.
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let spelled = lowered.replace('&', "-and-");

    static RE_SEP: OnceCell<Regex> = OnceCell::new();
    let re_sep = RE_SEP.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());
    let dashed = re_sep.replace_all(&spelled, "-");

    dashed.trim_matches('-').to_string()
}

/// Pick a slug that is free among persisted articles.
///
/// Starts from `slugify(title)`; when the base is already taken, scans every
/// persisted slug of the form `base` or `base-N` and returns `base-(max N + 1)`.
/// If the pattern scan comes back empty even though the exact probe hit (the
/// store changed between the two reads), falls back to `base-1`.
///
/// Two concurrent callers with the same title can both be handed the same
/// suffix; the store's uniqueness constraint inside `insert_many` is what
/// finally arbitrates, not this function.
pub async fn generate_unique_slug(
    store: &dyn ArticleStore,
    title: &str,
) -> Result<String, StoreError> {
    let base = slugify(title);
    if store.find_by_slug(&base).await?.is_none() {
        return Ok(base);
    }

    let taken = store.find_slugs_matching(&base).await?;
    let mut max_suffix: Option<u64> = None;
    for slug in &taken {
        let suffix = if slug == &base {
            Some(0)
        } else {
            numeric_suffix(slug, &base)
        };
        if let Some(n) = suffix {
            max_suffix = Some(max_suffix.map_or(n, |m| m.max(n)));
        }
    }

    match max_suffix {
        Some(n) => Ok(format!("{base}-{}", n + 1)),
        None => Ok(format!("{base}-1")),
    }
}

fn numeric_suffix(slug: &str, base: &str) -> Option<u64> {
    slug.strip_prefix(base)?.strip_prefix('-')?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_handles_punctuation_and_case() {
        assert_eq!(
            slugify("NVIDIA Announces RTX 5090!"),
            "nvidia-announces-rtx-5090"
        );
        assert_eq!(slugify("  Rust & Tokio, revisited  "), "rust-and-tokio-revisited");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn slugify_is_idempotent() {
        for title in ["Breaking: AI Writes Code?!", "a & b & c", "  spaced   out  "] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn numeric_suffix_parses_only_well_formed() {
        assert_eq!(numeric_suffix("post-3", "post"), Some(3));
        assert_eq!(numeric_suffix("post", "post"), None);
        assert_eq!(numeric_suffix("post-x", "post"), None);
        assert_eq!(numeric_suffix("poster-1", "post"), None);
    }
}
