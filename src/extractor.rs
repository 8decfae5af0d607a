use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

/// URI scheme identifying content inside a native application.
pub const DEEP_LINK_SCHEME: &str = "android-app://";

/// JSON-LD fragment shape carrying an app-invocable action. Unknown fields
/// are ignored; real pages bury this next to arbitrary schema.org noise.
#[derive(Debug, Deserialize)]
struct PageSchema {
    #[serde(rename = "potentialAction")]
    potential_action: Option<PotentialAction>,
}

#[derive(Debug, Deserialize)]
struct PotentialAction {
    #[serde(rename = "@type")]
    action_type: Option<String>,
    target: Option<String>,
}

/// Extracts deep-link URIs from page markup via two independent strategies:
/// `link rel="alternate"` elements and JSON-LD `ViewAction` targets.
#[derive(Debug, Default)]
pub struct LinkExtractor;

impl LinkExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Returns the merged, scheme-filtered, duplicate-free link list for one
    /// page. Alternate-link results come first, then view-action results,
    /// each in document order. Never fails; malformed fragments contribute
    /// nothing.
    pub fn extract(&self, page: &str) -> Vec<String> {
        let document = Html::parse_document(page);

        let mut candidates = self.alternate_links(&document);
        candidates.extend(self.view_action_targets(&document));

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|candidate| is_deep_link(candidate))
            .filter(|candidate| seen.insert(candidate.clone()))
            .collect()
    }

    fn alternate_links(&self, document: &Html) -> Vec<String> {
        let selector = Selector::parse("link").unwrap();

        document
            .select(&selector)
            .filter(|element| {
                element
                    .value()
                    .attr("rel")
                    .map(str::trim)
                    .is_some_and(|rel| rel.eq_ignore_ascii_case("alternate"))
            })
            .filter_map(|element| element.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn view_action_targets(&self, document: &Html) -> Vec<String> {
        let selector = Selector::parse("script").unwrap();
        let mut targets = Vec::new();

        for script in document.select(&selector) {
            let is_ld_json = script
                .value()
                .attr("type")
                .map(str::trim)
                .is_some_and(|kind| kind.eq_ignore_ascii_case("application/ld+json"));

            if !is_ld_json {
                continue;
            }

            let raw = script.text().collect::<String>();
            let schema: PageSchema = match serde_json::from_str(&raw) {
                Ok(schema) => schema,
                Err(e) => {
                    debug!("Skipping unparseable ld+json block: {}", e);
                    continue;
                }
            };

            let Some(action) = schema.potential_action else {
                continue;
            };

            let is_view_action = action
                .action_type
                .as_deref()
                .is_some_and(|kind| kind.eq_ignore_ascii_case("ViewAction"));

            if !is_view_action {
                continue;
            }

            if let Some(target) = action.target {
                let target = target.trim();
                if !target.is_empty() {
                    targets.push(target.to_string());
                }
            }
        }

        targets
    }
}

/// Case-insensitive scheme prefix check, safe on multi-byte input.
fn is_deep_link(candidate: &str) -> bool {
    candidate
        .get(..DEEP_LINK_SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(DEEP_LINK_SCHEME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(page: &str) -> Vec<String> {
        LinkExtractor::new().extract(page)
    }

    #[test]
    fn alternate_links_before_view_actions() {
        let page = r#"
            <html>
            <head>
                <link rel="alternate" href="android-app://pkg/path">
                <script type="application/ld+json">
                    {"potentialAction": {"@type": "ViewAction", "target": "android-app://pkg/other"}}
                </script>
            </head>
            </html>
        "#;

        assert_eq!(
            extract(page),
            vec!["android-app://pkg/path", "android-app://pkg/other"]
        );
    }

    #[test]
    fn non_deep_link_schemes_are_excluded() {
        let page = r#"
            <link rel="alternate" href="http://example.com">
            <link rel="alternate" href="android-app://pkg/kept">
        "#;

        assert_eq!(extract(page), vec!["android-app://pkg/kept"]);
    }

    #[test]
    fn duplicates_collapse_preserving_first_occurrence() {
        let page = r#"
            <link rel="alternate" href="android-app://x/y">
            <link rel="alternate" href="android-app://x/z">
            <link rel="alternate" href="android-app://x/y">
            <script type="application/ld+json">
                {"potentialAction": {"@type": "ViewAction", "target": "android-app://x/y"}}
            </script>
        "#;

        assert_eq!(extract(page), vec!["android-app://x/y", "android-app://x/z"]);
    }

    #[test]
    fn rel_and_type_match_case_insensitively_after_trim() {
        let page = r#"
            <link rel="  ALTERNATE  " href="  android-app://pkg/a  ">
            <script type="  Application/LD+JSON  ">
                {"potentialAction": {"@type": "viewaction", "target": "ANDROID-APP://pkg/b"}}
            </script>
        "#;

        assert_eq!(
            extract(page),
            vec!["android-app://pkg/a", "ANDROID-APP://pkg/b"]
        );
    }

    #[test]
    fn empty_href_and_partial_rel_are_skipped() {
        let page = r#"
            <link rel="alternate" href="   ">
            <link rel="alternate stylesheet" href="android-app://pkg/ignored">
            <link href="android-app://pkg/no-rel">
        "#;

        assert!(extract(page).is_empty());
    }

    #[test]
    fn malformed_json_ld_is_skipped_silently() {
        let page = r#"
            <script type="application/ld+json">not json at all</script>
            <script type="application/ld+json">{"potentialAction": "wrong shape"}</script>
            <script type="application/ld+json">
                {"potentialAction": {"@type": "ViewAction", "target": "android-app://pkg/good"}}
            </script>
        "#;

        assert_eq!(extract(page), vec!["android-app://pkg/good"]);
    }

    #[test]
    fn non_view_actions_yield_nothing() {
        let page = r#"
            <script type="application/ld+json">
                {"potentialAction": {"@type": "SearchAction", "target": "android-app://pkg/search"}}
            </script>
            <script type="application/ld+json">
                {"@context": "https://schema.org", "@type": "WebPage"}
            </script>
        "#;

        assert!(extract(page).is_empty());
    }

    #[test]
    fn missing_or_empty_target_yields_nothing() {
        let page = r#"
            <script type="application/ld+json">
                {"potentialAction": {"@type": "ViewAction"}}
            </script>
            <script type="application/ld+json">
                {"potentialAction": {"@type": "ViewAction", "target": "   "}}
            </script>
        "#;

        assert!(extract(page).is_empty());
    }

    #[test]
    fn prefix_check_survives_multibyte_input() {
        let page = r#"<link rel="alternate" href="ünïcödé-scheme://x">"#;
        assert!(extract(page).is_empty());
    }
}
