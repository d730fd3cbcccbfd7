use crate::collector::Collector;
use crate::probes::ProbeKind;
use crate::report::Slot;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

// --- Models ---

#[derive(Debug, Serialize)]
struct SlotDescriptor {
    key: &'static str,
    label: &'static str,
    probe: ProbeKind,
}

/// Payload of one `slot` event: everything a single probe wrote
#[derive(Debug, Serialize)]
struct SlotEvent {
    probe: ProbeKind,
    slots: BTreeMap<Slot, String>,
}

#[derive(Debug, Serialize)]
struct DoneEvent {
    probes: usize,
}

// --- Handlers ---

async fn run_diagnostics(State(collector): State<Arc<Collector>>) -> impl IntoResponse {
    Json(collector.run_all().await)
}

async fn stream_diagnostics(State(collector): State<Arc<Collector>>) -> impl IntoResponse {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Result<Event, Infallible>>();
    let mut outputs = collector.stream();

    tokio::spawn(async move {
        let mut finished = 0;
        while let Some(output) = outputs.recv().await {
            finished += 1;
            let event = SlotEvent {
                probe: output.probe,
                slots: output.values.into_iter().collect(),
            };
            match serde_json::to_string(&event) {
                Ok(payload) => {
                    if tx.send(Ok(Event::default().event("slot").data(payload))).is_err() {
                        debug!("diagnostics stream closed by client");
                        return;
                    }
                }
                Err(err) => debug!(probe = %event.probe, "failed to encode slot event: {err}"),
            }
        }

        let payload = serde_json::to_string(&DoneEvent { probes: finished })
            .unwrap_or_else(|_| format!("{{\"probes\":{finished}}}"));
        let _ = tx.send(Ok(Event::default().event("done").data(payload)));
    });

    Sse::new(UnboundedReceiverStream::new(rx))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(10)))
}

async fn list_slots() -> impl IntoResponse {
    let slots: Vec<SlotDescriptor> = Slot::ALL
        .iter()
        .map(|slot| SlotDescriptor {
            key: slot.key(),
            label: slot.label(),
            probe: slot.owner(),
        })
        .collect();
    Json(slots)
}

pub fn api_routes(collector: Arc<Collector>) -> Router {
    Router::new()
        .route("/api/diagnostics", get(run_diagnostics))
        .route("/api/diagnostics/stream", get(stream_diagnostics))
        .route("/api/slots", get(list_slots))
        .with_state(collector)
}

#[cfg(test)]
mod tests {
    use super::api_routes;
    use crate::collector::Collector;
    use crate::host::mock::ScriptedHost;
    use crate::probes::{ProbeKind, ProbeSettings};
    use crate::report::Slot;
    use crate::services::ServiceClient;
    use axum::http::StatusCode;
    use axum::Router;
    use serde_json::Value;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    async fn spawn_server(app: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (addr, handle)
    }

    fn scripted_collector() -> Arc<Collector> {
        // Lookup services point at a closed port
        let services = ServiceClient::with_settings(
            "http://127.0.0.1:9/ip",
            "http://127.0.0.1:9/geo",
            Duration::from_secs(1),
            false,
        );
        let settings = ProbeSettings {
            adblock_delay: Duration::from_millis(10),
            ..ProbeSettings::default()
        };
        Arc::new(Collector::new(
            Arc::new(ScriptedHost::default()),
            services,
            settings,
        ))
    }

    #[tokio::test]
    async fn diagnostics_returns_full_report() {
        let (app_addr, app_handle) = spawn_server(api_routes(scripted_collector())).await;

        let response = reqwest::Client::new()
            .get(format!("http://{app_addr}/api/diagnostics"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: Value = response.json().await.unwrap();
        let slots = json["slots"].as_object().unwrap();
        assert_eq!(slots.len(), Slot::ALL.len());
        assert_eq!(json["slots"]["ip-wan"], "Unavailable");
        assert_eq!(json["slots"]["cpu-cores"], "8");
        assert_eq!(json["slots"]["os-version"], "Linux");
        assert_eq!(json["slots"]["webrtc-support"], "Supported");
        assert!(json["collected_at"].is_string());

        app_handle.abort();
    }

    #[tokio::test]
    async fn slots_lists_every_slot_with_owner() {
        let (app_addr, app_handle) = spawn_server(api_routes(scripted_collector())).await;

        let json: Value = reqwest::Client::new()
            .get(format!("http://{app_addr}/api/slots"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let slots = json.as_array().unwrap();
        assert_eq!(slots.len(), Slot::ALL.len());
        assert_eq!(slots[0]["key"], "ip-wan");
        assert_eq!(slots[0]["probe"], "public-address");
        assert!(slots
            .iter()
            .any(|s| s["key"] == "adblock" && s["probe"] == "ad-block"));

        app_handle.abort();
    }

    #[tokio::test]
    async fn stream_emits_slot_events_then_done() {
        let (app_addr, app_handle) = spawn_server(api_routes(scripted_collector())).await;

        let body = reqwest::Client::new()
            .get(format!("http://{app_addr}/api/diagnostics/stream"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        let events: Vec<(&str, Value)> = body
            .split("\n\n")
            .filter_map(|block| {
                let mut name = None;
                let mut data = None;
                for line in block.lines() {
                    if let Some(rest) = line.strip_prefix("event:") {
                        name = Some(rest.trim());
                    } else if let Some(rest) = line.strip_prefix("data:") {
                        data = serde_json::from_str(rest.trim()).ok();
                    }
                }
                Some((name?, data?))
            })
            .collect();

        let slot_events: Vec<&Value> = events
            .iter()
            .filter(|(name, _)| *name == "slot")
            .map(|(_, data)| data)
            .collect();
        assert_eq!(slot_events.len(), ProbeKind::ALL.len());

        let browser = slot_events
            .iter()
            .find(|data| data["probe"] == "browser-info")
            .unwrap();
        assert_eq!(browser["slots"]["platform"], "Linux x86_64");
        assert_eq!(browser["slots"]["device-type"], "Desktop");

        let (last_name, last_data) = events.last().unwrap();
        assert_eq!(*last_name, "done");
        assert_eq!(last_data["probes"], ProbeKind::ALL.len());

        app_handle.abort();
    }
}
