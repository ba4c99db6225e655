//! Shared extraction helpers used by every source scraper.
//!
//! These are thin wrappers over the `scraper` crate plus the text and URL
//! policies that all sources share: whitespace-collapsed text, the minimum
//! title length, absolute URL resolution against a source origin, and
//! pattern search for date-looking substrings in free text.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

/// Ordered date patterns searched in free text: month-name day year, numeric
/// slash date, ISO date, month-name day without a year.
static TEXT_DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\w{3,9}\s+\d{1,2},?\s+\d{4})",
        r"(\d{1,2}/\d{1,2}/\d{4})",
        r"(\d{4}-\d{2}-\d{2})",
        r"(?i)(\w{3,9}\s+\d{1,2})",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid text date pattern"))
    .collect()
});

/// Collapse runs of whitespace and trim.
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All text under an element, cleaned.
pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Cleaned text of the first descendant matching `selector`, when non-empty.
pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).next().and_then(|node| {
        let cleaned = inner_text(node);
        if cleaned.is_empty() { None } else { Some(cleaned) }
    })
}

/// Attribute of the first descendant matching `selector`.
pub fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|node| node.value().attr(attr))
        .map(str::to_string)
}

/// Resolve a possibly-relative link against a source origin. Unresolvable
/// links are dropped rather than exported relative.
pub fn absolute_url(base: &str, href: Option<String>) -> Option<String> {
    let href = href?;
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href);
    }
    let base_url = Url::parse(base).ok()?;
    base_url.join(&href).ok().map(|u| u.to_string())
}

/// Apply the shared title policy: trim, then reject anything shorter than
/// three characters.
pub fn accept_title(candidate: Option<String>) -> Option<String> {
    let title = clean_text(&candidate?);
    if title.chars().count() < 3 {
        None
    } else {
        Some(title)
    }
}

/// Search free text for the first date-looking substring.
pub fn find_date_in_text(text: &str) -> Option<String> {
    for pattern in TEXT_DATE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            return Some(captures[1].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Jazz \n  Night \t "), "Jazz Night");
    }

    #[test]
    fn test_first_text_skips_empty_matches() {
        let html = Html::parse_fragment("<div><h3>  </h3><p>Jazz Night</p></div>");
        let root = html.root_element();
        let heading = Selector::parse("h3").unwrap();
        let paragraph = Selector::parse("p").unwrap();
        assert_eq!(first_text(&root, &heading), None);
        assert_eq!(first_text(&root, &paragraph), Some("Jazz Night".to_string()));
    }

    #[test]
    fn test_absolute_url_resolution() {
        assert_eq!(
            absolute_url("https://fargounderground.com", Some("/event/jazz/".to_string())),
            Some("https://fargounderground.com/event/jazz/".to_string())
        );
        assert_eq!(
            absolute_url(
                "https://fargounderground.com",
                Some("https://other.example/e".to_string())
            ),
            Some("https://other.example/e".to_string())
        );
        assert_eq!(absolute_url("https://fargounderground.com", None), None);
    }

    #[test]
    fn test_accept_title_rejects_short_titles() {
        assert_eq!(accept_title(Some("  AB ".to_string())), None);
        assert_eq!(accept_title(Some("".to_string())), None);
        assert_eq!(accept_title(None), None);
        assert_eq!(
            accept_title(Some(" Jazz  Night ".to_string())),
            Some("Jazz Night".to_string())
        );
    }

    #[test]
    fn test_find_date_in_text() {
        assert_eq!(
            find_date_in_text("Join us June 15, 2025 at the park"),
            Some("June 15, 2025".to_string())
        );
        assert_eq!(
            find_date_in_text("Doors open 6/15/2025 at 7pm"),
            Some("6/15/2025".to_string())
        );
        assert_eq!(
            find_date_in_text("posted 2025-06-15 by admin"),
            Some("2025-06-15".to_string())
        );
        assert_eq!(find_date_in_text("no date here"), None);
    }
}
