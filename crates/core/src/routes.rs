//! Route table and request classification.
//!
//! The route table is an ordered list of rules. The first rule whose
//! pattern matches the absolute request URL decides the caching strategy,
//! the target partition and the max-age. No match means network-only.

use crate::cache::Partition;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Caching strategy selected by a route rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
    NetworkOnly,
    CacheOnly,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
            Strategy::NetworkOnly => "network-only",
            Strategy::CacheOnly => "cache-only",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRuleConfig {
    /// Regular expression matched against the absolute request URL.
    pub pattern: String,
    pub strategy: Strategy,
    pub partition: Partition,
    pub max_age_secs: u64,
}

impl RouteRuleConfig {
    pub fn new(pattern: &str, strategy: Strategy, partition: Partition, max_age_secs: u64) -> Self {
        Self { pattern: pattern.to_string(), strategy, partition, max_age_secs }
    }
}

/// A compiled route rule.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub pattern: Regex,
    pub strategy: Strategy,
    pub partition: Partition,
    pub max_age_secs: u64,
}

impl RouteRule {
    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }
}

/// Ordered, immutable route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Compile configured rules, keeping their order.
    pub fn compile(rules: &[RouteRuleConfig]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|r| {
                Ok(RouteRule {
                    pattern: Regex::new(&r.pattern)?,
                    strategy: r.strategy,
                    partition: r.partition,
                    max_age_secs: r.max_age_secs,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// First rule matching `url`, in declared order.
    pub fn classify(&self, url: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| rule.matches(url))
    }

    /// Rule for `url`, or the partition used for unmatched URLs that must
    /// still be stored (e.g. explicit cache updates).
    pub fn partition_for(&self, url: &str) -> (Partition, Option<u64>) {
        match self.classify(url) {
            Some(rule) => (rule.partition, Some(rule.max_age_secs)),
            None => (Partition::Dynamic, None),
        }
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Built-in route table for a typical static site with an API.
pub fn default_rules() -> Vec<RouteRuleConfig> {
    vec![
        RouteRuleConfig::new(r"/api/", Strategy::NetworkFirst, Partition::Api, 300),
        RouteRuleConfig::new(
            r"\.(?:png|jpe?g|gif|svg|webp|avif|ico)(?:\?.*)?$",
            Strategy::CacheFirst,
            Partition::Image,
            30 * 24 * 60 * 60,
        ),
        RouteRuleConfig::new(
            r"(?:/_next/static/|\.(?:js|css|woff2?|ttf|otf)(?:\?.*)?$)",
            Strategy::CacheFirst,
            Partition::Static,
            365 * 24 * 60 * 60,
        ),
        RouteRuleConfig::new(
            r"^https?://[^/]+(?:/[^.?#]*)?(?:\?[^#]*)?$",
            Strategy::StaleWhileRevalidate,
            Partition::Dynamic,
            24 * 60 * 60,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::compile(&default_rules()).unwrap()
    }

    #[test]
    fn test_classify_api() {
        let table = table();
        let rule = table.classify("https://example.com/api/projects").unwrap();
        assert_eq!(rule.strategy, Strategy::NetworkFirst);
        assert_eq!(rule.partition, Partition::Api);
        assert_eq!(rule.max_age_secs, 300);
    }

    #[test]
    fn test_classify_assets() {
        let table = table();
        let image = table.classify("https://example.com/images/hero.webp").unwrap();
        assert_eq!(image.partition, Partition::Image);
        assert_eq!(image.strategy, Strategy::CacheFirst);

        let bundle = table.classify("https://example.com/_next/static/chunks/main.js").unwrap();
        assert_eq!(bundle.partition, Partition::Static);

        let font = table.classify("https://example.com/fonts/inter.woff2?v=3").unwrap();
        assert_eq!(font.partition, Partition::Static);
    }

    #[test]
    fn test_classify_pages() {
        let table = table();
        for url in ["https://example.com", "https://example.com/", "https://example.com/about", "https://example.com/projects?tag=rust"] {
            let rule = table.classify(url).unwrap();
            assert_eq!(rule.strategy, Strategy::StaleWhileRevalidate, "{url}");
            assert_eq!(rule.partition, Partition::Dynamic);
        }
    }

    #[test]
    fn test_classify_no_match() {
        let table = table();
        assert!(table.classify("https://example.com/resume.pdf").is_none());
        assert!(RouteTable::default().classify("https://example.com/").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let table = RouteTable::compile(&[
            RouteRuleConfig::new("/about", Strategy::CacheOnly, Partition::Static, 1),
            RouteRuleConfig::new(".*", Strategy::NetworkOnly, Partition::Dynamic, 2),
        ])
        .unwrap();

        let rule = table.classify("https://example.com/about").unwrap();
        assert_eq!(rule.strategy, Strategy::CacheOnly);
        let rule = table.classify("https://example.com/contact").unwrap();
        assert_eq!(rule.strategy, Strategy::NetworkOnly);
    }

    #[test]
    fn test_classify_deterministic() {
        let table = table();
        let urls = ["https://example.com/api/a.png", "https://example.com/logo.svg", "https://example.com/blog"];
        for url in urls {
            let first = table.classify(url).map(|r| (r.strategy, r.partition, r.max_age_secs));
            for _ in 0..10 {
                assert_eq!(table.classify(url).map(|r| (r.strategy, r.partition, r.max_age_secs)), first);
            }
        }
        // api rule is declared before the image rule
        assert_eq!(table.classify(urls[0]).unwrap().partition, Partition::Api);
    }

    #[test]
    fn test_partition_for_unmatched() {
        let table = table();
        assert_eq!(table.partition_for("https://example.com/cv.pdf"), (Partition::Dynamic, None));
        assert_eq!(table.partition_for("https://example.com/api/x"), (Partition::Api, Some(300)));
    }

    #[test]
    fn test_compile_invalid_pattern() {
        let result = RouteTable::compile(&[RouteRuleConfig::new("(", Strategy::CacheFirst, Partition::Static, 1)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_strategy_serde() {
        let s: Strategy = serde_json::from_str("\"stale-while-revalidate\"").unwrap();
        assert_eq!(s, Strategy::StaleWhileRevalidate);
        assert_eq!(serde_json::to_string(&Strategy::CacheOnly).unwrap(), "\"cache-only\"");
    }
}
