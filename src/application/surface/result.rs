use axum::http::StatusCode;
use serde_json::Value as JsonValue;

/// Outcome of a surface action, executed by the host into an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// Render a named view with a model.
    View(ViewResult),
    /// Pre-rendered markup.
    Html { status: StatusCode, body: String },
    /// No body, 404.
    NotFound,
}

impl ActionResult {
    pub fn view(template: impl Into<String>, model: JsonValue) -> Self {
        Self::View(ViewResult {
            template: template.into(),
            model,
            status: StatusCode::OK,
        })
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ActionResult::View(view) => view.status,
            ActionResult::Html { status, .. } => *status,
            ActionResult::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewResult {
    pub template: String,
    pub model: JsonValue,
    pub status: StatusCode,
}
