use axum::{
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Router,
};
use rust_embed::RustEmbed;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(RustEmbed)]
#[folder = "ui"]
struct Asset;

use crate::api_routes;
use crate::collector::Collector;

pub fn router(collector: Arc<Collector>) -> Router {
    Router::new()
        .merge(api_routes::api_routes(collector))
        .route("/", get(index_handler))
        .route("/*file", get(static_handler))
        .layer(TraceLayer::new_for_http())
}

pub async fn start_server(
    port: u16,
    open_browser: bool,
    collector: Arc<Collector>,
) -> anyhow::Result<()> {
    let app = router(collector);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("serving diagnostics page at http://{}", addr);
    println!("Diagnostics page at http://{}", addr);

    if open_browser {
        if let Err(err) = open::that(format!("http://{}", addr)) {
            warn!("could not open browser: {err}");
        }
    }

    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler() -> impl IntoResponse {
    static_handler(Uri::from_static("/index.html")).await
}

async fn static_handler(uri: Uri) -> impl IntoResponse {
    let mut path = uri.path().trim_start_matches('/').to_string();

    if path.is_empty() {
        path = "index.html".to_string();
    }

    match Asset::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::router;
    use crate::collector::Collector;
    use crate::host::mock::ScriptedHost;
    use crate::probes::ProbeSettings;
    use crate::services::ServiceClient;
    use axum::http::StatusCode;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn index_page_carries_every_slot_id() {
        let collector = Arc::new(Collector::new(
            Arc::new(ScriptedHost::default()),
            ServiceClient::with_settings(
                "http://127.0.0.1:9/ip",
                "http://127.0.0.1:9/geo",
                Duration::from_secs(1),
                false,
            ),
            ProbeSettings::default(),
        ));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router(collector)).await;
        });

        let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html")));

        let html = response.text().await.unwrap();
        for slot in crate::report::Slot::ALL {
            assert!(
                html.contains(&format!("id=\"{}\"", slot.key())),
                "page is missing slot {slot}"
            );
        }

        let missing = reqwest::get(format!("http://{addr}/nope.js")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        handle.abort();
    }
}
