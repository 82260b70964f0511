//! Feed list and topic filters for article extraction.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

pub const DEFAULT_FEEDS: &[(&str, &str)] = &[
    ("A11y Project", "https://www.a11yproject.com/feed/"),
    ("WebAIM Blog", "https://webaim.org/blog/feed/"),
    ("Deque Blog", "https://www.deque.com/blog/feed/"),
    ("Accessibility.com", "https://www.accessibility.com/blog/feed"),
];

/// The default feeds, or the comma separated `override_list` named
/// `Source 1`, `Source 2`, ...
pub fn feeds(override_list: Option<&str>) -> Vec<FeedSource> {
    match override_list.map(str::trim).filter(|list| !list.is_empty()) {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .enumerate()
            .map(|(index, url)| FeedSource {
                name: format!("Source {}", index + 1),
                url: url.to_string(),
            })
            .collect(),
        None => DEFAULT_FEEDS
            .iter()
            .map(|(name, url)| FeedSource {
                name: (*name).to_string(),
                url: (*url).to_string(),
            })
            .collect(),
    }
}

pub const ACCESSIBILITY_KEYWORDS: &[&str] = &[
    "accessibility",
    "web accessibility",
    "wcag",
    "wcag 2.1",
    "wcag 2.2",
    "wcag 3.0",
    "ada",
    "ada compliance",
    "americans with disabilities act",
    "section 508",
    "accessibility lawsuit",
    "ada lawsuit",
    "digital accessibility",
    "a11y",
    "assistive technology",
    "screen reader",
    "keyboard navigation",
    "aria",
    "inclusive design",
    "accessible design",
    "accessibility compliance",
    "accessibility audit",
    "accessibility testing",
    "accessibility standards",
    "accessibility guidelines",
    "accessibility requirements",
    "accessible website",
    "accessible web",
    "web content accessibility",
];

/// Topics that slip into accessibility feeds without being about it.
pub const OFF_TOPIC_TERMS: &[&str] = &[
    "cybersecurity",
    "meat packaging",
    "food packaging",
    "stock market",
    "cryptocurrency",
    "bitcoin",
    "real estate",
    "automotive",
];

/// Substring match, so short keywords like `ada` also hit inside words.
pub fn is_accessibility_related(text: &str) -> bool {
    let lower = text.to_lowercase();
    ACCESSIBILITY_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Feed items are trusted unless they are about an off-topic subject and
/// never mention accessibility.
pub fn is_off_topic(text: &str) -> bool {
    let lower = text.to_lowercase();
    OFF_TOPIC_TERMS.iter().any(|term| lower.contains(term)) && !is_accessibility_related(&lower)
}

const NEWS_QUERY_TERMS: &[&str] = &[
    "web accessibility",
    "website accessibility",
    "WCAG",
    "WCAG 2.2",
    "WCAG guidelines",
    "WCAG compliance",
    "ADA compliance",
    "ADA website",
    "ADA lawsuit",
    "accessibility lawsuit",
    "digital accessibility",
    "Section 508",
    "accessible website",
    "accessible design",
    "screen reader",
    "keyboard navigation",
    "ARIA",
    "accessibility standards",
    "accessibility audit",
    "accessibility testing",
    "inclusive design",
    "a11y",
];

pub fn news_query() -> String {
    NEWS_QUERY_TERMS.join(" OR ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_feed_list() {
        let list = feeds(None);
        assert_eq!(list.len(), 4);
        assert_eq!(list[1].name, "WebAIM Blog");
        assert_eq!(feeds(Some("  ")), list);
    }

    #[test]
    fn override_list_is_numbered() {
        let list = feeds(Some("https://a.example/feed, ,https://b.example/rss "));
        assert_eq!(
            list,
            vec![
                FeedSource {
                    name: "Source 1".into(),
                    url: "https://a.example/feed".into()
                },
                FeedSource {
                    name: "Source 2".into(),
                    url: "https://b.example/rss".into()
                },
            ]
        );
    }

    #[test]
    fn keyword_matching_ignores_case() {
        assert!(is_accessibility_related("New WCAG 2.2 techniques"));
        assert!(is_accessibility_related("Testing with a Screen Reader"));
        assert!(!is_accessibility_related("Quarterly earnings call"));
    }

    #[test]
    fn off_topic_needs_both_conditions() {
        assert!(is_off_topic("Bitcoin hits a new high"));
        assert!(!is_off_topic("Bitcoin exchange sued over accessibility"));
        assert!(!is_off_topic("Focus order tips"));
    }

    #[test]
    fn news_query_joins_terms() {
        let query = news_query();
        assert!(query.starts_with("web accessibility OR website accessibility OR"));
        assert!(query.ends_with(" OR a11y"));
    }
}
