//! Built-in User-Agent pattern lists.
//!
//! All entries are lowercase substrings.

/// Automation tools, scraping frameworks, headless engines, scanners.
pub const AUTOMATION: &[&str] = &[
    // HTTP client libraries and fetch tools
    "python-requests",
    "python-urllib",
    "curl",
    "wget",
    "java/",
    "okhttp",
    "go-http-client",
    "apache-httpclient",
    // Scraping frameworks and headless browsers
    "scrapy",
    "selenium",
    "phantomjs",
    "headless",
    // Security scanners
    "nmap",
    "masscan",
    "nikto",
    "sqlmap",
    "nessus",
    "openvas",
    "acunetix",
    // Generic
    "bot",
    "crawler",
    "spider",
    "scraper",
];

/// Search engine and link preview crawlers.
pub const CRAWLER: &[&str] = &[
    "googlebot",
    "bingbot",
    "slurp", // Yahoo
    "duckduckbot",
    "baiduspider",
    "yandexbot",
    "facebookexternalhit",
    "twitterbot",
    "linkedinbot",
    "slackbot",
    "discordbot",
    "telegrambot",
];

/// Engine and vendor tokens seen in real browser User-Agents.
pub const BROWSER: &[&str] = &[
    "mozilla/",
    "chrome/",
    "safari/",
    "firefox/",
    "edge/",
    "edg/", // Chromium Edge
    "opera/",
    "opr/", // Chromium Opera
    "brave/",
    "vivaldi/",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_lists_are_lowercase() {
        for p in AUTOMATION.iter().chain(CRAWLER).chain(BROWSER) {
            assert!(!p.is_empty());
            assert_eq!(*p, p.to_lowercase(), "pattern {p} must be lowercase");
        }
    }
}
