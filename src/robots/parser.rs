//! Robots.txt parser implementation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate; Crawl-delay is
//! not covered by that crate, so it is parsed here.

use robotstxt::DefaultMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rules {
    AllowAll,
    DisallowAll,
    Parsed,
}

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    content: String,
    rules: Rules,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            rules: Rules::Parsed,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when robots.txt is missing or cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            rules: Rules::AllowAll,
        }
    }

    /// Creates a ParsedRobots that denies everything
    ///
    /// Used when the site answers robots.txt with 401 or 403.
    pub fn disallow_all() -> Self {
        Self {
            content: String::new(),
            rules: Rules::DisallowAll,
        }
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL (or bare path) to check
    /// * `user_agent` - The crawler's product token, e.g. "FrontierCrawl"
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self.rules {
            Rules::AllowAll => true,
            Rules::DisallowAll => false,
            Rules::Parsed if self.content.trim().is_empty() => true,
            Rules::Parsed => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
            }
        }
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// A group naming the agent wins over the `*` group. Consecutive
    /// `User-agent` lines form one group; any other directive closes the list
    /// of agents, so the next `User-agent` line starts a new group.
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no applicable crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.rules != Rules::Parsed {
            return None;
        }

        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut collecting_agents = false;
        let mut wildcard_delay = None;
        let mut agent_delay = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                if !collecting_agents {
                    group.clear();
                    collecting_agents = true;
                }
                group.push(value.to_lowercase());
                continue;
            }
            collecting_agents = false;

            if key != "crawl-delay" {
                continue;
            }
            let Ok(delay) = value.parse::<f64>() else {
                continue;
            };
            if !delay.is_finite() || delay < 0.0 {
                continue;
            }

            if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                agent_delay.get_or_insert(delay);
            } else if group.iter().any(|ua| ua == "*") {
                wildcard_delay.get_or_insert(delay);
            }
        }

        agent_delay.or(wildcard_delay)
    }
}
