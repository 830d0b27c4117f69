use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::{error, instrument};

use crate::{
    application::{
        error::{AppError, ErrorReport, HttpError},
        surface::{Dispatch, ExceptionContext, Fault, SurfaceActions},
    },
    cache::{CacheState, output_cache_layer},
    domain::{content::RenderModel, error::DomainError, route::RouteData},
    infra::content::ContentTree,
    presentation::views::{ViewEngine, diagnostic_page, render_action_result},
};

use super::{
    health,
    middleware::{log_responses, set_request_context},
};

const SOURCE: &str = "infra::http::public::serve_content";

#[derive(Clone)]
pub struct HttpState {
    pub surface: Arc<dyn SurfaceActions>,
    pub views: Arc<dyn ViewEngine>,
    pub content: Arc<ContentTree>,
    pub cache: Option<CacheState>,
}

pub fn build_router(state: HttpState) -> Router {
    // Every other GET path is looked up in the content tree.
    let content_routes = Router::new()
        .route("/", get(serve_content))
        .fallback(get(serve_content));

    let content_routes = if let Some(cache_state) = state.cache.clone() {
        content_routes.layer(middleware::from_fn_with_state(
            cache_state,
            output_cache_layer,
        ))
    } else {
        content_routes
    };

    let service_routes = Router::new().route("/_health", get(health));

    service_routes
        .merge(content_routes)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[instrument(skip_all, fields(path = %uri.path()))]
async fn serve_content(State(state): State<HttpState>, uri: Uri) -> Response {
    let Some(node) = state.content.resolve(uri.path()) else {
        return AppError::from(DomainError::content_not_found(uri.path())).into_response();
    };

    let model = RenderModel::from(node);
    let controller = state.surface.controller();
    let outcome = controller.dispatch(
        RouteData::for_content(node),
        node,
        |route| -> Result<Response, Fault> {
            let result = state.surface.index(route, &model)?;
            Ok(render_action_result(result, state.views.as_ref())?)
        },
    );

    match outcome {
        Dispatch::Completed(response) => response,
        Dispatch::Handled { result, context } => {
            let status = result.status();
            let mut response = match render_action_result(result, state.views.as_ref()) {
                Ok(response) => response,
                Err(err) => {
                    error!(
                        target: "veneer::http",
                        error = %err,
                        "error view failed to render"
                    );
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
                }
            };
            ErrorReport::from_error(SOURCE, status, context.error())
                .already_logged()
                .attach(&mut response);
            response
        }
        Dispatch::Unhandled(context) => {
            let debug = controller
                .compilation_section()
                .is_some_and(|section| section.debug);
            unhandled_response(&context, debug)
        }
    }
}

fn unhandled_response(context: &ExceptionContext, debug: bool) -> Response {
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    if !debug {
        return HttpError::from_error(SOURCE, status, "Internal server error", context.error())
            .already_logged()
            .into_response();
    }

    let mut response = (status, diagnostic_page(context)).into_response();
    ErrorReport::from_error(SOURCE, status, context.error())
        .already_logged()
        .attach(&mut response);
    response
}
