use std::error::Error as StdError;

use crate::domain::route::RouteData;

use super::result::ActionResult;

/// Boxed failure raised while processing a request.
pub type Fault = Box<dyn StdError + Send + Sync + 'static>;

/// An in-flight unhandled failure.
///
/// Starts unhandled with an empty result slot. Exception handling either
/// leaves it untouched (the failure propagates) or fills the slot and marks it
/// handled.
#[derive(Debug)]
pub struct ExceptionContext {
    route: RouteData,
    error: Fault,
    handled: bool,
    result: Option<ActionResult>,
}

impl ExceptionContext {
    pub fn new(route: RouteData, error: impl Into<Fault>) -> Self {
        Self {
            route,
            error: error.into(),
            handled: false,
            result: None,
        }
    }

    pub fn route(&self) -> &RouteData {
        &self.route
    }

    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.error.as_ref()
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn result(&self) -> Option<&ActionResult> {
        self.result.as_ref()
    }

    /// Replace the failure with `result` and mark the context handled.
    pub fn handle_with(&mut self, result: ActionResult) {
        self.result = Some(result);
        self.handled = true;
    }

    pub fn set_handled(&mut self, handled: bool) {
        self.handled = handled;
    }

    /// The replacement result, if the failure was handled with one.
    pub fn take_handled_result(&mut self) -> Option<ActionResult> {
        if self.handled { self.result.take() } else { None }
    }

    /// Messages for the error and each of its sources, outermost first.
    pub fn error_chain(&self) -> Vec<String> {
        let mut messages = vec![self.error.to_string()];
        let mut current = self.error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        messages
    }
}
