mod app;
mod db;
mod prelude;
mod utils;

use anyhow::Context as _;
use axum::{handler::HandlerWithoutStateExt, response::Redirect, routing::IntoMakeService};
use futures::StreamExt;
use utils::config::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::tracing::init_subscriber()?;

    let file = std::env::args().nth(1).context("usage: settings <config.toml>")?;
    let config = Config::load(&file).await?;

    let app = app::build(config.clone()).await?.into_make_service();
    tracing::info!("Live at {}", &config.app.url);

    match &config.acme {
        Some(acme) => serve_https(&config, acme, app).await?,
        // Without ACME there is no certificate, so serve plain HTTP for local development
        None => axum_server::bind(config.net.http_addr).serve(app).await?,
    }

    Ok(())
}

/// Serve the app over HTTPS with a Let's Encrypt certificate, redirecting plain HTTP to it.
async fn serve_https(config: &Config, acme: &AcmeConfig, app: IntoMakeService<axum::Router>) -> anyhow::Result<()> {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let url = config.app.url.clone();
    let redirect = move || async move { Redirect::permanent(&url) };
    let http = axum_server::bind(config.net.http_addr);
    tokio::spawn(async move { http.serve(redirect.into_make_service()).await });

    let mut state = rustls_acme::AcmeConfig::new([&acme.domain])
        .contact_push(format!("mailto:{}", &acme.email))
        .cache(rustls_acme::caches::DirCache::new(acme.dir.clone()))
        .directory_lets_encrypt(acme.prod)
        .state();
    let acceptor = state.axum_acceptor(state.default_rustls_config());

    // Certificate orders and renewals are driven by polling the state
    tokio::spawn(async move {
        while let Some(event) = state.next().await {
            match event {
                Ok(ok) => tracing::debug!("acme: {:?}", ok),
                Err(err) => tracing::error!("acme: {}", err),
            }
        }
    });

    axum_server::bind(config.net.https_addr).acceptor(acceptor).serve(app).await?;
    Ok(())
}
