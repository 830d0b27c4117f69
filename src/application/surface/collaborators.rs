//! Services the surface controller calls out to.
//!
//! Each is injected at construction so the controller can run without a live
//! host: tests substitute fakes, the binary wires the template directory, the
//! output cache store and the loaded settings.

use std::path::PathBuf;

use crate::domain::{content::ContentNode, route::RouteData};

use super::{exception::ExceptionContext, result::ActionResult};

/// A view that resolved to a physical template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewHandle {
    /// Name the template engine loads the file under.
    pub name: String,
    pub path: PathBuf,
}

pub trait ViewResolver: Send + Sync {
    /// Look up `name` for the current request; `None` when no file backs it.
    fn find_view(&self, route: &RouteData, name: &str) -> Option<ViewHandle>;
}

/// Shared, process-wide output cache.
pub trait OutputCache: Send + Sync {
    /// Drop every cached entry.
    fn remove_all_items(&self);
}

/// The host's compilation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilationSection {
    pub debug: bool,
}

pub trait ConfigurationSource: Send + Sync {
    /// `None` when the compilation section is not configured.
    fn compilation_section(&self) -> Option<CompilationSection>;
}

impl ConfigurationSource for Option<CompilationSection> {
    fn compilation_section(&self) -> Option<CompilationSection> {
        *self
    }
}

/// Produces the user-facing error page for a failed request.
pub trait ErrorViewBuilder: Send + Sync {
    fn build_error_view(&self, context: &ExceptionContext, node: &ContentNode) -> ActionResult;
}
