//! Route matching module
//!
//! Implements exact, prefix and pattern path matching for routes.

use regex::Regex;

/// Route matching conditions
#[derive(Debug, Clone, Default)]
pub struct RouteMatch {
    /// Exact path match
    pub path: Option<String>,
    /// Path prefix match (e.g., "/api" matches "/api/users")
    pub prefix: Option<String>,
    /// Regular expression anchored at the start of the path
    pub pattern: Option<Regex>,
}

impl RouteMatch {
    pub fn exact(path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Self::default()
        }
    }

    pub fn prefix(prefix: &str) -> Self {
        Self {
            prefix: Some(prefix.to_string()),
            ..Self::default()
        }
    }

    /// Match paths starting with `pattern`; its groups become captures
    ///
    /// The pattern only has to match a leading part of the path, so end it
    /// with `$` to require the whole path.
    ///
    /// # Examples
    /// ```
    /// use conneg::routing::{match_path, RouteMatch};
    ///
    /// let rule = RouteMatch::pattern(r"/users/(\d+)$").unwrap();
    /// let matched = match_path(&rule, "/users/42").unwrap();
    /// assert_eq!(matched.captures, [Some("42")]);
    /// assert!(match_path(&rule, "/users/me").is_none());
    /// ```
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Some(Regex::new(&format!("^(?:{pattern})"))?),
            ..Self::default()
        })
    }

    /// Human-readable form of the rule, for error messages
    pub fn describe(&self) -> String {
        if let Some(path) = &self.path {
            return path.clone();
        }
        if let Some(prefix) = &self.prefix {
            return format!("{prefix}*");
        }
        self.pattern
            .as_ref()
            .map_or_else(|| "*".to_string(), |re| re.as_str().to_string())
    }
}

/// Successful match of a path against a rule
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PathMatch<'p> {
    /// Part of the path after the matched portion
    pub remainder: &'p str,
    /// Pattern groups in order; `None` for a group that did not take part
    pub captures: Vec<Option<&'p str>>,
}

/// Check a path against a rule
///
/// An exact match leaves an empty remainder; a rule with no condition
/// matches everything.
pub fn match_path<'p>(rule: &RouteMatch, path: &'p str) -> Option<PathMatch<'p>> {
    // Exact path match takes priority
    if let Some(exact) = &rule.path {
        return (path == exact).then(PathMatch::default);
    }

    if let Some(prefix) = &rule.prefix {
        return path.strip_prefix(prefix.as_str()).map(|remainder| PathMatch {
            remainder,
            captures: Vec::new(),
        });
    }

    if let Some(pattern) = &rule.pattern {
        let caps = pattern.captures(path)?;
        let end = caps.get(0).map_or(0, |m| m.end());
        return Some(PathMatch {
            remainder: &path[end..],
            captures: caps.iter().skip(1).map(|g| g.map(|m| m.as_str())).collect(),
        });
    }

    Some(PathMatch {
        remainder: path,
        captures: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remainder<'p>(rule: &RouteMatch, path: &'p str) -> Option<&'p str> {
        match_path(rule, path).map(|m| m.remainder)
    }

    #[test]
    fn test_match_path_exact() {
        let rule = RouteMatch::exact("/about");
        assert_eq!(remainder(&rule, "/about"), Some(""));
        assert_eq!(remainder(&rule, "/about/"), None);
        assert_eq!(remainder(&rule, "/about/team"), None);
    }

    #[test]
    fn test_match_path_prefix() {
        let rule = RouteMatch::prefix("/api");
        assert_eq!(remainder(&rule, "/api"), Some(""));
        assert_eq!(remainder(&rule, "/api/users"), Some("/users"));
        assert_eq!(remainder(&rule, "/about"), None);
    }

    #[test]
    fn test_match_path_pattern() {
        let rule = RouteMatch::pattern(r"/posts/(\d{4})/(\w+)(?:\.(json|txt))?").unwrap();

        let matched = match_path(&rule, "/posts/2024/hello.json").unwrap();
        assert_eq!(matched.captures, [Some("2024"), Some("hello"), Some("json")]);
        assert_eq!(matched.remainder, "");

        let matched = match_path(&rule, "/posts/2024/hello/comments").unwrap();
        assert_eq!(matched.captures, [Some("2024"), Some("hello"), None]);
        assert_eq!(matched.remainder, "/comments");

        // Anchored at the start only
        assert!(match_path(&rule, "/v2/posts/2024/hello").is_none());
        assert!(match_path(&rule, "/posts/24/hello").is_none());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(RouteMatch::pattern("/users/(").is_err());
    }

    #[test]
    fn test_describe() {
        assert_eq!(RouteMatch::exact("/a").describe(), "/a");
        assert_eq!(RouteMatch::prefix("/a").describe(), "/a*");
        assert_eq!(RouteMatch::pattern("/a/(b)").unwrap().describe(), "^(?:/a/(b))");
        assert_eq!(RouteMatch::default().describe(), "*");
    }

    #[test]
    fn test_match_path_no_rule() {
        assert_eq!(remainder(&RouteMatch::default(), "/anything"), Some("/anything"));
    }
}
