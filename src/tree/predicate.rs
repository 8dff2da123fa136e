//! Search predicates shared by every query operation

use super::NodeData;
use crate::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;

/// How a node's accessible name is compared
#[derive(Debug, Clone)]
pub enum NameMatch {
    /// The name must be exactly equal
    Exact(String),
    /// The name must match the regular expression somewhere
    Pattern(Regex),
}

impl NameMatch {
    /// Parse a name filter. `/.../` is a regular expression, anything else an
    /// exact name.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() >= 2 && s.starts_with('/') && s.ends_with('/') {
            let re = Regex::new(&s[1..s.len() - 1])
                .map_err(|e| Error::ConfigError(format!("bad name pattern {}: {}", s, e)))?;
            Ok(NameMatch::Pattern(re))
        } else {
            Ok(NameMatch::Exact(s.to_string()))
        }
    }

    pub fn matches(&self, name: Option<&str>) -> bool {
        match (self, name) {
            (NameMatch::Exact(want), Some(n)) => want == n,
            (NameMatch::Pattern(re), Some(n)) => re.is_match(n),
            (_, None) => false,
        }
    }
}

/// `{role, name, attributes}` search record. Every absent field matches
/// anything, so the default predicate matches every node.
#[derive(Debug, Clone, Default)]
pub struct SearchPredicate {
    pub role: Option<String>,
    pub name: Option<NameMatch>,
    pub attributes: BTreeMap<String, String>,
}

impl SearchPredicate {
    /// Any node
    pub fn any() -> Self {
        Self::default()
    }

    /// Nodes with the given role, any name
    pub fn role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            ..Default::default()
        }
    }

    /// Role plus exact name; an empty name means "any name"
    pub fn new(role: impl Into<String>, name: &str) -> Self {
        let p = Self::role(role);
        if name.is_empty() {
            p
        } else {
            p.named(name)
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(NameMatch::Exact(name.into()));
        self
    }

    pub fn name_matching(mut self, pattern: Regex) -> Self {
        self.name = Some(NameMatch::Pattern(pattern));
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn matches(&self, node: &NodeData) -> bool {
        if let Some(role) = &self.role {
            if *role != node.role {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !name.matches(node.name.as_deref()) {
                return false;
            }
        }
        self.attributes
            .iter()
            .all(|(k, v)| node.attributes.get(k) == Some(v))
    }
}

impl From<&str> for SearchPredicate {
    fn from(role: &str) -> Self {
        SearchPredicate::role(role)
    }
}

impl std::fmt::Display for SearchPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{role: {}", self.role.as_deref().unwrap_or("*"))?;
        match &self.name {
            Some(NameMatch::Exact(n)) => write!(f, ", name: \"{}\"", n)?,
            Some(NameMatch::Pattern(re)) => write!(f, ", name: /{}/", re.as_str())?,
            None => {}
        }
        for (k, v) in &self.attributes {
            write!(f, ", {}: \"{}\"", k, v)?;
        }
        write!(f, "}}")
    }
}
