//! Legacy URL redirects.
//!
//! A rule's `from` pattern is matched segment by segment. `:name` captures
//! one segment and a trailing `*` captures the rest of the path as `:splat`.
//! Captures are substituted into `to`.

use std::collections::HashMap;

use serde::Deserialize;

use crate::errors::RelayError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RedirectRule {
    pub from: String,
    pub to: String,
    #[serde(default = "default_permanent")]
    pub permanent: bool,
}

const fn default_permanent() -> bool {
    true
}

impl RedirectRule {
    #[must_use]
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            permanent: true,
        }
    }

    /// Destination for `path` if this rule matches it.
    #[must_use]
    pub fn apply(&self, path: &str) -> Option<String> {
        let captures = match_pattern(&self.from, path)?;
        let mut out = self.to.clone();
        // Longest names first so `:id` does not clobber `:idx`.
        let mut names: Vec<&String> = captures.keys().collect();
        names.sort_by_key(|n| std::cmp::Reverse(n.len()));
        for name in names {
            out = out.replace(&format!(":{name}"), &captures[name]);
        }
        Some(out)
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_pattern(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts = segments(pattern);
    let path_parts = segments(path);
    let mut captures = HashMap::new();

    for (i, part) in pattern_parts.iter().enumerate() {
        if *part == "*" {
            captures.insert("splat".to_string(), path_parts.get(i..)?.join("/"));
            return Some(captures);
        }
        let actual = path_parts.get(i)?;
        if let Some(name) = part.strip_prefix(':') {
            captures.insert(name.to_string(), (*actual).to_string());
        } else if !part.eq_ignore_ascii_case(actual) {
            return None;
        }
    }

    (pattern_parts.len() == path_parts.len()).then_some(captures)
}

/// URL scheme of the previous site, mapped onto the current routes.
#[must_use]
pub fn builtin_rules() -> Vec<RedirectRule> {
    vec![
        RedirectRule::new("/inmuebles", "/properties"),
        RedirectRule::new("/inmuebles/:slug", "/properties/:slug"),
        RedirectRule::new("/propiedades/*", "/properties/:splat"),
        RedirectRule::new("/ficha/:id", "/properties/:id"),
        RedirectRule::new("/noticias", "/blog"),
        RedirectRule::new("/noticias/:slug", "/blog/:slug"),
        RedirectRule::new("/contacto", "/contact"),
        RedirectRule::new("/vender", "/sell"),
        RedirectRule::new("/tasacion", "/sell"),
        RedirectRule::new("/favoritos", "/favorites"),
    ]
}

#[derive(Debug, Clone)]
pub struct Redirects {
    rules: Vec<RedirectRule>,
}

impl Redirects {
    #[must_use]
    pub fn new(rules: Vec<RedirectRule>) -> Self {
        Self { rules }
    }

    /// Built-in rules followed by the JSON-configured ones.
    ///
    /// # Errors
    ///
    /// `ConfigError` if `json` is not an array of rules.
    pub fn from_config(json: Option<&str>) -> Result<Self, RelayError> {
        let mut rules = builtin_rules();
        if let Some(json) = json {
            let extra: Vec<RedirectRule> = serde_json::from_str(json)
                .map_err(|e| RelayError::ConfigError(format!("REDIRECT_RULES: {e}")))?;
            rules.extend(extra);
        }
        Ok(Self { rules })
    }

    /// First matching rule's destination, with the query string carried over,
    /// and whether it is permanent.
    #[must_use]
    pub fn resolve(&self, path: &str, query: Option<&str>) -> Option<(String, bool)> {
        self.rules.iter().find_map(|rule| {
            let mut target = rule.apply(path)?;
            if let Some(q) = query.filter(|q| !q.is_empty()) {
                target.push(if target.contains('?') { '&' } else { '?' });
                target.push_str(q);
            }
            Some((target, rule.permanent))
        })
    }
}
