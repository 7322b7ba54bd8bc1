use crate::config::WebConfig;
use crate::error::{Error, Result};
use crate::metrics::{exposition, Collector};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

#[derive(Clone)]
struct AppState {
    collector: Arc<Collector>,
    landing_page: Arc<str>,
}

/// `GET {telemetry_path}` scrapes upstream; `GET /` serves the landing page.
pub fn router(collector: Arc<Collector>, telemetry_path: &str) -> Router {
    let state = AppState {
        collector,
        landing_page: landing_page(telemetry_path).into(),
    };

    Router::new()
        .route(telemetry_path, get(metrics))
        .route("/", get(index))
        .with_state(state)
}

pub async fn serve(web: &WebConfig, collector: Arc<Collector>) -> Result<()> {
    let address = web.socket_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|source| Error::Bind {
            address: address.clone(),
            source,
        })?;
    log::info!("Listening on {} (metrics at {})", address, web.telemetry_path);

    axum::serve(listener, router(collector, &web.telemetry_path))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutting down...");
        })
        .await?;
    Ok(())
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let samples = state.collector.collect().await;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, exposition::CONTENT_TYPE)],
        exposition::render(&samples),
    )
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.landing_page.to_string())
}

fn landing_page(telemetry_path: &str) -> String {
    format!(
        "<html>\n\
         <head><title>CircleCI Insights Exporter</title></head>\n\
         <body>\n\
         <h1>CircleCI Insights Exporter</h1>\n\
         <p><a href='{}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        telemetry_path
    )
}
