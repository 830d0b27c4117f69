//! Per-request routing values.

use std::collections::BTreeMap;

use super::content::ContentNode;

pub const CONTROLLER_KEY: &str = "controller";
pub const ACTION_KEY: &str = "action";
pub const SURFACE_CONTROLLER: &str = "surface";

/// String-keyed route values for the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteData {
    values: BTreeMap<String, String>,
}

impl RouteData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route values for serving a content node through the surface controller.
    pub fn for_content(node: &ContentNode) -> Self {
        Self::new()
            .with(CONTROLLER_KEY, SURFACE_CONTROLLER)
            .with(ACTION_KEY, node.template.as_str())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The `action` value exactly as routed, unless it is missing or blank.
    pub fn action(&self) -> Option<&str> {
        self.get(ACTION_KEY)
            .filter(|value| !value.trim().is_empty())
    }
}
