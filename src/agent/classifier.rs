//! User-Agent classification predicates.
//!
//! Both predicates are total and evaluated against the registry as it is at
//! call time. Empty input fails closed: it counts as automated and never as
//! a browser.

use std::sync::Arc;

use serde::Serialize;

use crate::agent::registry::{PatternCategory, PatternRegistry};

/// Descriptive classification, for logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    /// No User-Agent at all.
    Empty,
    /// A listed search engine or preview crawler.
    Crawler,
    /// Matches an automation marker.
    Automated,
    /// Browser tokens and no automation marker.
    Browser,
    /// Nothing matched.
    Unknown,
}

impl ClientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::Empty => "empty",
            ClientKind::Crawler => "crawler",
            ClientKind::Automated => "automated",
            ClientKind::Browser => "browser",
            ClientKind::Unknown => "unknown",
        }
    }
}

/// Classifies declared client strings against a shared registry.
#[derive(Debug, Clone, Default)]
pub struct ClientClassifier {
    registry: Arc<PatternRegistry>,
}

impl ClientClassifier {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    /// Whether `user_agent` belongs to an automated client.
    ///
    /// With `allow_legitimate`, a crawler match wins over any automation
    /// marker in the same string.
    pub fn is_automated(&self, user_agent: &str, allow_legitimate: bool) -> bool {
        let ua = user_agent.to_lowercase();
        if ua.is_empty() {
            return true;
        }

        if allow_legitimate && self.registry.matches_normalized(PatternCategory::Crawler, &ua) {
            return false;
        }

        self.registry.matches_normalized(PatternCategory::Automation, &ua)
    }

    /// Whether `user_agent` looks like a real browser.
    ///
    /// Any automation marker vetoes browser tokens.
    pub fn is_browser(&self, user_agent: &str) -> bool {
        let ua = user_agent.to_lowercase();
        if ua.is_empty() {
            return false;
        }

        if self.registry.matches_normalized(PatternCategory::Automation, &ua) {
            return false;
        }

        self.registry.matches_normalized(PatternCategory::Browser, &ua)
    }

    /// Best single label for `user_agent`.
    pub fn kind(&self, user_agent: &str) -> ClientKind {
        let ua = user_agent.to_lowercase();
        if ua.is_empty() {
            ClientKind::Empty
        } else if self.registry.matches_normalized(PatternCategory::Crawler, &ua) {
            ClientKind::Crawler
        } else if self.registry.matches_normalized(PatternCategory::Automation, &ua) {
            ClientKind::Automated
        } else if self.registry.matches_normalized(PatternCategory::Browser, &ua) {
            ClientKind::Browser
        } else {
            ClientKind::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

    fn classifier() -> ClientClassifier {
        ClientClassifier::default()
    }

    #[test]
    fn test_library_clients_are_automated() {
        let c = classifier();
        assert!(c.is_automated("python-requests/2.28.1", false));
        assert!(c.is_automated("python-requests/2.28.1", true));
        assert!(c.is_automated("curl/7.68.0", false));
        assert!(c.is_automated("Wget/1.21", false));
        assert!(c.is_automated("Go-http-client/1.1", false));
        assert!(c.is_automated("sqlmap/1.7", false));
        assert!(c.is_automated("Mozilla/5.0 HeadlessChrome/120.0", false));
    }

    #[test]
    fn test_legitimate_crawlers() {
        let c = classifier();
        assert!(!c.is_automated("Googlebot/2.1", true));
        assert!(c.is_automated("Googlebot/2.1", false));
        assert!(!c.is_automated(GOOGLEBOT, true));
        assert!(c.is_automated(GOOGLEBOT, false));
        assert!(!c.is_automated("facebookexternalhit/1.1", true));
    }

    #[test]
    fn test_browsers_are_not_automated() {
        let c = classifier();
        assert!(!c.is_automated(CHROME, false));
        assert!(!c.is_automated("Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/91.0", false));
        assert!(!c.is_automated("SomethingUnlisted/1.0", false));
    }

    #[test]
    fn test_empty_user_agent() {
        let c = classifier();
        assert!(c.is_automated("", false));
        assert!(c.is_automated("", true));
        assert!(!c.is_browser(""));
        assert_eq!(c.kind(""), ClientKind::Empty);
    }

    #[test]
    fn test_is_browser() {
        let c = classifier();
        assert!(c.is_browser(CHROME));
        assert!(c.is_browser(
            "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0"
        ));
        assert!(c.is_browser("Opera/9.80 (Windows NT 6.1)"));

        assert!(!c.is_browser("curl/7.68.0"));
        assert!(!c.is_browser("SomethingUnlisted/1.0"));
    }

    #[test]
    fn test_automation_marker_vetoes_browser() {
        let c = classifier();
        assert!(!c.is_browser(GOOGLEBOT));
        assert!(!c.is_browser("Mozilla/5.0 (compatible; Scrapy/2.11)"));
        assert!(!c.is_browser("Mozilla/5.0 HeadlessChrome/120.0 Safari/537.36"));
    }

    #[test]
    fn test_kind() {
        let c = classifier();
        assert_eq!(c.kind(GOOGLEBOT), ClientKind::Crawler);
        assert_eq!(c.kind("curl/8.0"), ClientKind::Automated);
        assert_eq!(c.kind(CHROME), ClientKind::Browser);
        assert_eq!(c.kind("Lynx/2.8"), ClientKind::Unknown);
    }

    #[test]
    fn test_runtime_patterns_take_effect() {
        let registry = Arc::new(PatternRegistry::with_defaults());
        let c = ClientClassifier::new(registry.clone());

        assert!(!c.is_automated("MyMonitor/1.0", false));
        let mut handle = registry.add(PatternCategory::Automation, "MyMonitor");
        assert!(c.is_automated("MyMonitor/1.0", false));
        assert!(!c.is_browser("Mozilla/5.0 MyMonitor/1.0"));

        handle.release(&registry);
        assert!(!c.is_automated("MyMonitor/1.0", false));
        assert!(c.is_browser("Mozilla/5.0 MyMonitor/1.0"));

        let _crawler = registry.add(PatternCategory::Crawler, "MyMonitor");
        let _marker = registry.add(PatternCategory::Automation, "MyMonitor");
        assert!(!c.is_automated("MyMonitor/1.0", true));
    }

    #[test]
    fn test_empty_registry() {
        let c = ClientClassifier::new(Arc::new(PatternRegistry::empty()));
        assert!(!c.is_automated("curl/8.0", false));
        assert!(c.is_automated("", false));
        assert!(!c.is_browser(CHROME));
    }
}
