//! Deterministic draft text synthesis.

pub fn initial_draft(main_keyword: &str, secondary_keywords: &[String]) -> String {
    format!(
        "Draft for {main_keyword} with secondary keywords: {}",
        secondary_keywords.join(", ")
    )
}

/// Text for the `regeneration`-th regenerate action (1-based).
pub fn regenerated_draft(
    main_keyword: &str,
    secondary_keywords: &[String],
    regeneration: u32,
) -> String {
    format!(
        "Regenerated draft for {main_keyword} (regen {regeneration}) with keywords: {}",
        secondary_keywords.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_draft_lists_secondaries() {
        let secondaries = vec!["best seo".to_string(), "top seo".to_string()];
        assert_eq!(
            initial_draft("seo tools", &secondaries),
            "Draft for seo tools with secondary keywords: best seo, top seo"
        );
    }

    #[test]
    fn regenerated_draft_depends_on_count() {
        let a = regenerated_draft("rust", &[], 1);
        let b = regenerated_draft("rust", &[], 2);
        assert_eq!(a, "Regenerated draft for rust (regen 1) with keywords: ");
        assert_ne!(a, b);
        assert_eq!(a, regenerated_draft("rust", &[], 1));
    }
}
