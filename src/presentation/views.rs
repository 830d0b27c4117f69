use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing_error::SpanTrace;

use crate::application::{
    error::ErrorReport,
    surface::{ActionResult, ExceptionContext, ViewResult},
};

#[derive(Debug, Error)]
pub enum ViewRenderError {
    #[error("view `{template}` has no template file")]
    Missing { template: String },
    #[error("view `{template}` failed to render")]
    Template {
        template: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Renders a resolved view into markup.
pub trait ViewEngine: Send + Sync {
    fn render(&self, view: &ViewResult) -> Result<String, ViewRenderError>;
}

/// Execute an action result into a response.
pub fn render_action_result(
    result: ActionResult,
    views: &dyn ViewEngine,
) -> Result<Response, ViewRenderError> {
    match result {
        ActionResult::View(view) => {
            let body = views.render(&view)?;
            Ok((view.status, Html(body)).into_response())
        }
        ActionResult::Html { status, body } => Ok((status, Html(body)).into_response()),
        // The controller warns when it resolves a missing template.
        ActionResult::NotFound => Ok(render_not_found_response(
            ErrorReport::from_message(
                "presentation::views::render_action_result",
                StatusCode::NOT_FOUND,
                "No template file backs the requested view",
            )
            .already_logged(),
        )),
    }
}

pub fn render_not_found_response(report: ErrorReport) -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    report.attach(&mut response);
    response
}

/// Plain-text diagnostic shown for unhandled failures in debug mode.
pub fn diagnostic_page(context: &ExceptionContext) -> String {
    let mut page = String::from("Unhandled error while serving request\n\n");

    if let Some(action) = context.route().action() {
        page.push_str(&format!("action: {action}\n\n"));
    }

    for (depth, message) in context.error_chain().iter().enumerate() {
        page.push_str(&format!("{depth}: {message}\n"));
    }

    let span_trace = SpanTrace::capture().to_string();
    if !span_trace.trim().is_empty() {
        page.push_str("\nspan trace:\n");
        page.push_str(&span_trace);
        page.push('\n');
    }

    page
}
