//! robots.txt evaluation
//!
//! Allow/deny matching is delegated to the robotstxt crate (a port of
//! Google's matcher). Crawl-delay is not part of that matcher, so it is
//! read here directly.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Longest crawl-delay honored; larger values are clamped to it
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(300);

/// A robots.txt body ready for matching
///
/// An empty body allows everything; so does anything unparseable, since the
/// matcher ignores lines it does not understand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRobots {
    content: String,
}

impl ParsedRobots {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Policy used when robots.txt is missing or unreachable
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn is_allow_all(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks a full URL (or a path) against the rules for `robots_token`
    pub fn is_allowed(&self, url: &str, robots_token: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, robots_token, url)
    }

    /// Crawl-delay declared for `robots_token`, falling back to the `*` group
    pub fn crawl_delay(&self, robots_token: &str) -> Option<Duration> {
        if self.is_allow_all() {
            return None;
        }

        let token = robots_token.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut for_agent = None;
        let mut for_wildcard = None;

        for line in self.content.lines() {
            // Drop trailing comments
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Some(delay) = parse_delay(value) else {
                        continue;
                    };
                    if group.iter().any(|agent| agent != "*" && token.contains(agent.as_str())) {
                        for_agent.get_or_insert(delay);
                    } else if group.iter().any(|agent| agent == "*") {
                        for_wildcard.get_or_insert(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        for_agent.or(for_wildcard)
    }
}

fn parse_delay(value: &str) -> Option<Duration> {
    let seconds: f64 = value.parse().ok()?;
    if seconds.is_nan() || seconds < 0.0 {
        return None;
    }
    let delay = Duration::try_from_secs_f64(seconds).unwrap_or(MAX_CRAWL_DELAY);
    Some(delay.min(MAX_CRAWL_DELAY))
}
