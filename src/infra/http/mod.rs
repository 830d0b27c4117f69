mod middleware;
mod public;

pub use middleware::RequestContext;
pub use public::{HttpState, build_router};

use axum::http::StatusCode;

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
