//! On-disk view templates rendered through minijinja.

use std::path::{Component, Path, PathBuf};

use minijinja::{Environment, Value, path_loader};

use crate::{
    application::surface::{ViewHandle, ViewResolver, ViewResult},
    domain::route::RouteData,
    presentation::views::{ViewEngine, ViewRenderError},
};

/// Candidate suffixes tried, in order, when resolving a view name.
const VIEW_SUFFIXES: &[&str] = &["", ".html", ".jinja"];

pub struct TemplateDirectory {
    root: PathBuf,
    env: Environment<'static>,
}

impl TemplateDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut env = Environment::new();
        env.set_loader(path_loader(root.clone()));
        Self { root, env }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the file backing `name`, trying each suffix in turn.
    pub fn locate(&self, name: &str) -> Option<ViewHandle> {
        if !is_relative_name(name) {
            return None;
        }

        VIEW_SUFFIXES.iter().find_map(|suffix| {
            let candidate = format!("{name}{suffix}");
            let path = self.root.join(&candidate);
            path.is_file().then_some(ViewHandle {
                name: candidate,
                path,
            })
        })
    }
}

impl ViewResolver for TemplateDirectory {
    fn find_view(&self, _route: &RouteData, name: &str) -> Option<ViewHandle> {
        self.locate(name)
    }
}

impl ViewEngine for TemplateDirectory {
    fn render(&self, view: &ViewResult) -> Result<String, ViewRenderError> {
        let handle = self
            .locate(&view.template)
            .ok_or_else(|| ViewRenderError::Missing {
                template: view.template.clone(),
            })?;

        let template_error = |source| ViewRenderError::Template {
            template: view.template.clone(),
            source,
        };
        let template = self.env.get_template(&handle.name).map_err(template_error)?;
        template
            .render(Value::from_serialize(&view.model))
            .map_err(template_error)
    }
}

/// Names must stay inside the views root: no absolute paths, no `..`.
fn is_relative_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
