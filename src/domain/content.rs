//! Published content as seen by the front end.

use std::collections::BTreeMap;

use serde::Serialize;
use url::Url;

/// A published content node: the page being served for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    pub id: i64,
    pub name: String,
    /// Site-relative path, always starting with `/`.
    pub path: String,
    /// Template alias used as the route's `action`.
    pub template: String,
    pub url: Url,
    pub properties: BTreeMap<String, String>,
}

impl ContentNode {
    pub fn absolute_url(&self) -> &Url {
        &self.url
    }
}

/// Model handed to the default front-end action.
#[derive(Debug, Clone, Serialize)]
pub struct RenderModel {
    pub content: ContentView,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentView {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub url: String,
    pub properties: BTreeMap<String, String>,
}

impl From<&ContentNode> for RenderModel {
    fn from(node: &ContentNode) -> Self {
        Self {
            content: ContentView {
                id: node.id,
                name: node.name.clone(),
                path: node.path.clone(),
                url: node.url.to_string(),
                properties: node.properties.clone(),
            },
        }
    }
}

/// Normalise a request path so that `/about`, `/about/` and `about` compare equal.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}
