//! Excel sheet-name rules: at most 31 characters, none of `: \ / ? * [ ]`,
//! and no leading or trailing apostrophe.

pub const MAX_SHEET_NAME: usize = 31;
const FORBIDDEN: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
const FALLBACK: &str = "Sheet";

pub fn sanitize_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    let truncated: String = trim(&replaced).chars().take(MAX_SHEET_NAME).collect();
    // truncation can expose trailing whitespace
    let out = trim(&truncated);
    if out.is_empty() {
        FALLBACK.to_string()
    } else {
        out.to_string()
    }
}

fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\'')
}

/// Excel treats sheet names case-insensitively.
pub fn same_sheet_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// `base` itself if unused, otherwise `base_2`, `base_3`, ... cut to fit 31 chars.
pub fn unique_sheet_name<'a, I>(base: &str, taken: I) -> String
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let is_taken = |candidate: &str| {
        taken
            .clone()
            .into_iter()
            .any(|t| same_sheet_name(t, candidate))
    };
    let base = sanitize_sheet_name(base);
    if !is_taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let suffix = format!("_{n}");
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
        let stem: String = base.chars().take(keep).collect();
        let candidate = format!("{}{suffix}", stem.trim_end());
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn replaces_forbidden_characters() {
        assert_eq!(sanitize_sheet_name("Spec: A/B*Test[1]"), "Spec_ A_B_Test_1_");
        assert_eq!(sanitize_sheet_name(r"a\b?c"), "a_b_c");
    }

    #[test]
    fn truncates_to_31_chars() {
        let long = "3.3 エラーハンドリングシナリオ と 追加の非常に長い説明文です";
        let out = sanitize_sheet_name(long);
        assert_eq!(out.chars().count(), MAX_SHEET_NAME);
        assert!(long.starts_with(&out));
    }

    #[test]
    fn trims_and_falls_back() {
        assert_eq!(sanitize_sheet_name("  UST-001  "), "UST-001");
        assert_eq!(sanitize_sheet_name("   "), "Sheet");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
    }

    #[test]
    fn unique_names() {
        let taken = ["Table", "Table_2"];
        assert_eq!(unique_sheet_name("Other", taken.iter().copied()), "Other");
        assert_eq!(unique_sheet_name("Table", taken.iter().copied()), "Table_3");

        let long = "x".repeat(40);
        let first = sanitize_sheet_name(&long);
        let next = unique_sheet_name(&long, [first.as_str()]);
        assert_eq!(next.chars().count(), MAX_SHEET_NAME);
        assert!(next.ends_with("_2"));
    }

    #[test]
    fn names_collide_ignoring_case() {
        assert!(same_sheet_name("UST-001_Login", "ust-001_LOGIN"));
        assert!(same_sheet_name("Ärger", "ärger"));
        assert!(!same_sheet_name("3.1", "3.2"));
        assert_eq!(unique_sheet_name("table", ["Table"]), "table_2");
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(name in "\\PC{0,60}") {
            let once = sanitize_sheet_name(&name);
            let twice = sanitize_sheet_name(&once);
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.chars().count() <= MAX_SHEET_NAME);
            prop_assert!(!once.contains(FORBIDDEN));
        }
    }
}
