use std::{process, sync::Arc};

use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use veneer::{
    application::{
        error::AppError,
        surface::{ErrorViewBuilder, SurfaceController},
    },
    cache::{CacheConfig, CacheState, OutputCacheStore},
    config,
    domain::route::RouteData,
    infra::{
        content::ContentTree,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        views::TemplateDirectory,
    },
    presentation::error_views::{StaticErrorView, TemplateErrorView},
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Check(_) => run_check(settings).await,
    }
}

struct Site {
    views: Arc<TemplateDirectory>,
    content: Arc<ContentTree>,
    controller: Arc<SurfaceController>,
    cache: Option<CacheState>,
}

async fn build_site(settings: &config::Settings) -> Result<Site, AppError> {
    if !settings.views.directory.is_dir() {
        return Err(InfraError::configuration(format!(
            "views directory `{}` does not exist",
            settings.views.directory.display()
        ))
        .into());
    }
    let views = Arc::new(TemplateDirectory::new(settings.views.directory.clone()));
    let content = Arc::new(
        ContentTree::load(&settings.content.file, &settings.content.base_url).await?,
    );

    let cache_config = CacheConfig::from(&settings.cache);
    let store = Arc::new(OutputCacheStore::new(&cache_config));
    let cache = cache_config.enabled.then(|| CacheState {
        config: cache_config.clone(),
        store: store.clone(),
    });

    let error_views: Arc<dyn ErrorViewBuilder> = match settings.surface.error_template.as_deref()
    {
        Some(template) => {
            if views.locate(template).is_none() {
                warn!(
                    template,
                    views = %views.root().display(),
                    "error template has no file; the built-in error page will be used"
                );
            }
            Arc::new(TemplateErrorView::new(template, views.clone()))
        }
        None => Arc::new(StaticErrorView),
    };

    if settings.compilation.is_none() {
        info!("no [compilation] section configured; failed requests will not use error views");
    }

    let controller = Arc::new(SurfaceController::new(
        views.clone(),
        store,
        Arc::new(settings.clone()),
        error_views,
    ));

    Ok(Site {
        views,
        content,
        controller,
        cache,
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let site = build_site(&settings).await?;

    let state = HttpState {
        surface: site.controller,
        views: site.views,
        content: site.content.clone(),
        cache: site.cache,
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        addr = %settings.server.addr,
        nodes = site.content.len(),
        "serving content"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!("server stopped");
    Ok(())
}

/// Verify that every content node resolves to a template file.
async fn run_check(settings: config::Settings) -> Result<(), AppError> {
    let site = build_site(&settings).await?;

    let missing = site
        .content
        .nodes()
        .into_iter()
        .filter(|node| {
            !site
                .controller
                .ensure_view_exists(&RouteData::for_content(node), &node.template)
        })
        .count();

    if missing > 0 {
        return Err(AppError::unexpected(format!(
            "{missing} of {} content nodes reference missing templates",
            site.content.len()
        )));
    }

    info!(nodes = site.content.len(), "all content nodes resolve to templates");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
