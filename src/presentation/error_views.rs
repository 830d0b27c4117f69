//! Error views swapped in for failed requests outside debug mode.

use std::sync::Arc;

use askama::Template;
use axum::http::StatusCode;
use serde_json::json;
use tracing::error;

use crate::{
    application::surface::{
        ActionResult, ErrorViewBuilder, ExceptionContext, ViewResolver, ViewResult,
    },
    domain::content::ContentNode,
};

const STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPageTemplate<'a> {
    page_name: &'a str,
    home_href: &'a str,
}

/// Compiled-in error page for sites without an error template.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticErrorView;

impl ErrorViewBuilder for StaticErrorView {
    fn build_error_view(&self, _context: &ExceptionContext, node: &ContentNode) -> ActionResult {
        let mut home = node.absolute_url().clone();
        home.set_path("/");
        home.set_query(None);

        let page = ErrorPageTemplate {
            page_name: &node.name,
            home_href: home.as_str(),
        };
        let body = page.render().unwrap_or_else(|err| {
            error!(
                target: "veneer::presentation",
                error = %err,
                "static error page failed to render"
            );
            "Something went wrong.".to_string()
        });

        ActionResult::Html { status: STATUS, body }
    }
}

/// Renders a named template from the views directory as the error page.
///
/// Falls back to [`StaticErrorView`] when the template has no file.
pub struct TemplateErrorView {
    template: String,
    views: Arc<dyn ViewResolver>,
}

impl TemplateErrorView {
    pub fn new(template: impl Into<String>, views: Arc<dyn ViewResolver>) -> Self {
        Self {
            template: template.into(),
            views,
        }
    }
}

impl ErrorViewBuilder for TemplateErrorView {
    fn build_error_view(&self, context: &ExceptionContext, node: &ContentNode) -> ActionResult {
        if self.views.find_view(context.route(), &self.template).is_none() {
            return StaticErrorView.build_error_view(context, node);
        }

        let model = json!({
            "status": STATUS.as_u16(),
            "content": {
                "id": node.id,
                "name": node.name,
                "path": node.path,
                "url": node.absolute_url().as_str(),
            },
        });

        ActionResult::View(ViewResult {
            template: self.template.clone(),
            model,
            status: STATUS,
        })
    }
}
