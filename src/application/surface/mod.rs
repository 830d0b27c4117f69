//! Surface controller: front-end request handling policy.
//!
//! Renders the template named by the route's `action` value and, when a
//! request fails, logs the failure, purges the output cache and swaps in a
//! custom error view unless the host runs in debug mode.

mod collaborators;
mod exception;
mod result;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::domain::{
    content::{ContentNode, RenderModel},
    route::RouteData,
};

pub use collaborators::{
    CompilationSection, ConfigurationSource, ErrorViewBuilder, OutputCache, ViewHandle,
    ViewResolver,
};
pub use exception::{ExceptionContext, Fault};
pub use result::{ActionResult, ViewResult};

const TARGET: &str = "veneer::surface";

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("route data has no `action` value")]
    MissingAction,
    #[error("model for template `{template}` could not be serialized")]
    Model {
        template: String,
        #[source]
        source: serde_json::Error,
    },
}

pub struct SurfaceController {
    views: Arc<dyn ViewResolver>,
    output_cache: Arc<dyn OutputCache>,
    configuration: Arc<dyn ConfigurationSource>,
    error_views: Arc<dyn ErrorViewBuilder>,
}

impl SurfaceController {
    pub fn new(
        views: Arc<dyn ViewResolver>,
        output_cache: Arc<dyn OutputCache>,
        configuration: Arc<dyn ConfigurationSource>,
        error_views: Arc<dyn ErrorViewBuilder>,
    ) -> Self {
        Self {
            views,
            output_cache,
            configuration,
            error_views,
        }
    }

    pub fn compilation_section(&self) -> Option<CompilationSection> {
        self.configuration.compilation_section()
    }

    /// Checks that a physical view file backs `template`.
    pub fn ensure_view_exists(&self, route: &RouteData, template: &str) -> bool {
        if self.views.find_view(route, template).is_none() {
            warn!(
                target: TARGET,
                template,
                "No physical template file was found for template {template}"
            );
            return false;
        }

        true
    }

    /// Renders the template named by the route's `action` with `model`.
    ///
    /// Returns [`ActionResult::NotFound`] when the template has no file.
    pub fn render_current_template<T: Serialize>(
        &self,
        route: &RouteData,
        model: &T,
    ) -> Result<ActionResult, SurfaceError> {
        let template = route.action().ok_or(SurfaceError::MissingAction)?;

        if !self.ensure_view_exists(route, template) {
            return Ok(ActionResult::NotFound);
        }

        let model = serde_json::to_value(model).map_err(|source| SurfaceError::Model {
            template: template.to_string(),
            source,
        })?;

        Ok(ActionResult::view(template, model))
    }

    /// Exception interception for a failed request.
    pub fn on_exception(&self, context: &mut ExceptionContext, node: &ContentNode) {
        if context.is_handled() {
            return;
        }

        let message = format!(
            "surface controller error on page '{}' [{}] {}",
            node.name,
            node.id,
            node.absolute_url()
        );
        error!(
            target: TARGET,
            page_id = node.id,
            page_name = %node.name,
            url = %node.absolute_url(),
            error = %context.error(),
            chain = ?context.error_chain(),
            "{message}"
        );

        self.output_cache.remove_all_items();

        let Some(compilation) = self.configuration.compilation_section() else {
            debug!(
                target: TARGET,
                page_id = node.id,
                "compilation section unavailable; leaving exception unhandled"
            );
            return;
        };

        if !compilation.debug {
            let result = self.error_views.build_error_view(context, node);
            context.handle_with(result);
        }
    }

    /// Runs `action` for `node`, passing any failure through [`Self::on_exception`].
    pub fn dispatch<T, E, F>(&self, route: RouteData, node: &ContentNode, action: F) -> Dispatch<T>
    where
        F: FnOnce(&RouteData) -> Result<T, E>,
        E: Into<Fault>,
    {
        match action(&route) {
            Ok(output) => Dispatch::Completed(output),
            Err(err) => {
                let mut context = ExceptionContext::new(route, err);
                self.on_exception(&mut context, node);
                match context.take_handled_result() {
                    Some(result) => Dispatch::Handled { result, context },
                    None => Dispatch::Unhandled(context),
                }
            }
        }
    }
}

/// Outcome of [`SurfaceController::dispatch`].
#[derive(Debug)]
pub enum Dispatch<T> {
    /// The action succeeded.
    Completed(T),
    /// The action failed and an error view replaced its result.
    Handled {
        result: ActionResult,
        context: ExceptionContext,
    },
    /// The action failed and nothing handled it; the host decides the response.
    Unhandled(ExceptionContext),
}

/// Front-end actions served by a surface controller.
///
/// Implementors may override [`SurfaceActions::index`] to customise the front
/// page; the default renders the current template.
pub trait SurfaceActions: Send + Sync {
    fn controller(&self) -> &SurfaceController;

    fn index(&self, route: &RouteData, model: &RenderModel) -> Result<ActionResult, SurfaceError> {
        self.controller().render_current_template(route, model)
    }
}

impl SurfaceActions for SurfaceController {
    fn controller(&self) -> &SurfaceController {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{BTreeMap, HashSet},
        fmt::{self, Write as _},
        io,
        path::PathBuf,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use axum::http::StatusCode;
    use serde_json::json;
    use tracing::{
        Event, Level, Subscriber,
        field::{Field, Visit},
    };
    use tracing_subscriber::{
        layer::{Context, Layer, SubscriberExt},
        registry,
    };
    use url::Url;

    use super::*;
    use crate::domain::route::ACTION_KEY;

    struct KnownViews(HashSet<&'static str>);

    impl ViewResolver for KnownViews {
        fn find_view(&self, _route: &RouteData, name: &str) -> Option<ViewHandle> {
            self.0.contains(name).then(|| ViewHandle {
                name: format!("{name}.html"),
                path: PathBuf::from(format!("views/{name}.html")),
            })
        }
    }

    #[derive(Default)]
    struct CountingCache(AtomicUsize);

    impl OutputCache for CountingCache {
        fn remove_all_items(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FixedErrorView;

    impl ErrorViewBuilder for FixedErrorView {
        fn build_error_view(&self, _context: &ExceptionContext, node: &ContentNode) -> ActionResult {
            ActionResult::Html {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: format!("sorry, {} is broken", node.name),
            }
        }
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

    impl CapturedLogs {
        fn at(&self, level: Level) -> Vec<String> {
            self.0
                .lock()
                .expect("log capture lock")
                .iter()
                .filter(|(entry_level, _)| *entry_level == level)
                .map(|(_, text)| text.clone())
                .collect()
        }

        fn len(&self) -> usize {
            self.0.lock().expect("log capture lock").len()
        }
    }

    #[derive(Default)]
    struct FieldText(String);

    impl Visit for FieldText {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            let _ = write!(self.0, "{}={:?} ", field.name(), value);
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            let _ = write!(self.0, "{}={} ", field.name(), value);
        }
    }

    impl<S: Subscriber> Layer<S> for CapturedLogs {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut text = FieldText::default();
            event.record(&mut text);
            self.0
                .lock()
                .expect("log capture lock")
                .push((*event.metadata().level(), text.0));
        }
    }

    fn with_logs<R>(f: impl FnOnce() -> R) -> (R, CapturedLogs) {
        let logs = CapturedLogs::default();
        let subscriber = registry().with(logs.clone());
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, logs)
    }

    struct Fixture {
        controller: SurfaceController,
        cache: Arc<CountingCache>,
    }

    fn fixture(compilation: Option<CompilationSection>) -> Fixture {
        let cache = Arc::new(CountingCache::default());
        let controller = SurfaceController::new(
            Arc::new(KnownViews(HashSet::from(["home", "page"]))),
            cache.clone(),
            Arc::new(compilation),
            Arc::new(FixedErrorView),
        );
        Fixture { controller, cache }
    }

    fn sample_node() -> ContentNode {
        ContentNode {
            id: 1204,
            name: "Contact".to_string(),
            path: "/contact".to_string(),
            template: "page".to_string(),
            url: Url::parse("https://example.test/contact").expect("valid url"),
            properties: BTreeMap::new(),
        }
    }

    fn route(action: &str) -> RouteData {
        RouteData::new().with(ACTION_KEY, action)
    }

    fn failure() -> ExceptionContext {
        ExceptionContext::new(route("page"), io::Error::other("database went away"))
    }

    #[test]
    fn resolvable_template_renders_with_model() {
        let fx = fixture(None);
        let model = json!({ "title": "Welcome" });

        let result = fx
            .controller
            .render_current_template(&route("home"), &model)
            .expect("render result");

        assert_eq!(result, ActionResult::view("home", model));
        assert_eq!(result.status(), StatusCode::OK);
    }

    #[test]
    fn missing_template_returns_not_found_and_warns_once() {
        let fx = fixture(None);

        let (result, logs) = with_logs(|| {
            fx.controller
                .render_current_template(&route("missing-page"), &json!({}))
        });

        assert_eq!(result.expect("not found result"), ActionResult::NotFound);
        let warnings = logs.at(Level::WARN);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("missing-page"));
        assert_eq!(logs.len(), 1);
    }

    #[test]
    fn missing_action_fails_fast() {
        let fx = fixture(None);
        let err = fx
            .controller
            .render_current_template(&RouteData::new(), &json!({}))
            .expect_err("missing action");
        assert!(matches!(err, SurfaceError::MissingAction));

        let err = fx
            .controller
            .render_current_template(&route("  "), &json!({}))
            .expect_err("blank action");
        assert!(matches!(err, SurfaceError::MissingAction));
    }

    #[test]
    fn padded_action_names_a_different_template() {
        let fx = fixture(None);

        let (result, logs) = with_logs(|| {
            fx.controller
                .render_current_template(&route(" home "), &json!({}))
        });

        assert_eq!(result.expect("not found result"), ActionResult::NotFound);
        assert!(logs.at(Level::WARN)[0].contains("template= home "));
    }

    #[test]
    fn index_uses_route_action() {
        let fx = fixture(None);
        let node = sample_node();
        let model = RenderModel::from(&node);

        let result = fx
            .controller
            .index(&RouteData::for_content(&node), &model)
            .expect("index result");

        let expected = fx
            .controller
            .render_current_template(&route("page"), &model)
            .expect("render result");
        assert_eq!(result, expected);
    }

    #[test]
    fn overridden_index_replaces_default() {
        struct Maintenance(SurfaceController);

        impl SurfaceActions for Maintenance {
            fn controller(&self) -> &SurfaceController {
                &self.0
            }

            fn index(
                &self,
                _route: &RouteData,
                _model: &RenderModel,
            ) -> Result<ActionResult, SurfaceError> {
                Ok(ActionResult::Html {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    body: "back soon".to_string(),
                })
            }
        }

        let actions = Maintenance(fixture(None).controller);
        let node = sample_node();
        let result = actions
            .index(&RouteData::for_content(&node), &RenderModel::from(&node))
            .expect("index result");
        assert_eq!(result.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn already_handled_context_is_left_alone() {
        let fx = fixture(Some(CompilationSection { debug: false }));
        let mut context = failure();
        context.set_handled(true);

        let ((), logs) = with_logs(|| fx.controller.on_exception(&mut context, &sample_node()));

        assert_eq!(logs.len(), 0);
        assert_eq!(fx.cache.0.load(Ordering::SeqCst), 0);
        assert!(context.result().is_none());
        assert!(context.is_handled());
    }

    #[test]
    fn debug_mode_logs_and_purges_without_handling() {
        let fx = fixture(Some(CompilationSection { debug: true }));
        let mut context = failure();

        let ((), logs) = with_logs(|| fx.controller.on_exception(&mut context, &sample_node()));

        assert_eq!(logs.at(Level::ERROR).len(), 1);
        assert_eq!(fx.cache.0.load(Ordering::SeqCst), 1);
        assert!(!context.is_handled());
        assert!(context.result().is_none());
    }

    #[test]
    fn production_mode_swaps_in_error_view() {
        let fx = fixture(Some(CompilationSection { debug: false }));
        let mut context = failure();
        let node = sample_node();

        let ((), logs) = with_logs(|| fx.controller.on_exception(&mut context, &node));

        let errors = logs.at(Level::ERROR);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Contact"));
        assert!(errors[0].contains("1204"));
        assert!(errors[0].contains("https://example.test/contact"));
        assert!(errors[0].contains("database went away"));
        assert_eq!(fx.cache.0.load(Ordering::SeqCst), 1);
        assert!(context.is_handled());
        assert_eq!(
            context.result(),
            Some(&FixedErrorView.build_error_view(&failure(), &node))
        );
    }

    #[test]
    fn missing_compilation_section_purges_but_does_not_handle() {
        let fx = fixture(None);
        let mut context = failure();

        let ((), logs) = with_logs(|| fx.controller.on_exception(&mut context, &sample_node()));

        assert_eq!(logs.at(Level::ERROR).len(), 1);
        assert_eq!(logs.at(Level::DEBUG).len(), 1);
        assert_eq!(fx.cache.0.load(Ordering::SeqCst), 1);
        assert!(!context.is_handled());
        assert!(context.result().is_none());
    }

    #[test]
    fn dispatch_passes_successful_results_through() {
        let fx = fixture(Some(CompilationSection { debug: false }));
        let node = sample_node();
        let outcome = fx.controller.dispatch(route("page"), &node, |route| {
            fx.controller.render_current_template(route, &json!({}))
        });

        assert!(matches!(outcome, Dispatch::Completed(ActionResult::View(_))));
        assert_eq!(fx.cache.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dispatch_routes_missing_action_through_exception_handling() {
        let fx = fixture(Some(CompilationSection { debug: false }));
        let node = sample_node();
        let outcome = fx.controller.dispatch(RouteData::new(), &node, |route| {
            fx.controller.render_current_template(route, &json!({}))
        });

        let Dispatch::Handled { result, context } = outcome else {
            panic!("expected handled outcome");
        };
        assert_eq!(result.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(context.is_handled());
        assert!(context.error().is::<SurfaceError>());
        assert_eq!(fx.cache.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatch_in_debug_mode_returns_unhandled_context() {
        let fx = fixture(Some(CompilationSection { debug: true }));
        let node = sample_node();
        let outcome = fx.controller.dispatch(route("page"), &node, |_| {
            Err::<ActionResult, _>(io::Error::other("view engine crashed"))
        });

        let Dispatch::Unhandled(context) = outcome else {
            panic!("expected unhandled outcome");
        };
        assert_eq!(context.route().action(), Some("page"));
        assert_eq!(context.error_chain(), vec!["view engine crashed".to_string()]);
    }
}
