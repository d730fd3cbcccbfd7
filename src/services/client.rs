//! Lookup service client
//!
//! Two read-only GETs: one for the public address, one for the coarse
//! location. Each request runs under a deadline; no retries.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::ServicesConfig;
use crate::error::ProbeError;

const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";
const DEFAULT_GEOLOCATION_URL: &str = "https://ipapi.co/json/";

#[derive(Debug, Deserialize)]
struct IpPayload {
    ip: String,
}

#[derive(Debug, Deserialize)]
struct GeoPayload {
    city: Option<String>,
    country_name: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// Coarse location resolved from the public address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoLocation {
    pub city: String,
    pub country_name: String,
}

impl std::fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.city, self.country_name)
    }
}

/// Client for the IP-lookup and geolocation services
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
    ip_lookup_url: String,
    geolocation_url: String,
    deadline: Duration,
}

impl ServiceClient {
    /// Create a client from the `[services]` config section
    pub fn from_config(config: &ServicesConfig) -> Self {
        Self::with_settings(
            &config.ip_lookup_url,
            &config.geolocation_url,
            Duration::from_secs(config.timeout_seconds.max(1)),
            config.cookie_store,
        )
    }

    pub fn with_settings(
        ip_lookup_url: &str,
        geolocation_url: &str,
        deadline: Duration,
        cookie_store: bool,
    ) -> Self {
        let client = Client::builder()
            .timeout(deadline)
            .cookie_store(cookie_store)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        ServiceClient {
            client,
            ip_lookup_url: normalize_url(ip_lookup_url, DEFAULT_IP_LOOKUP_URL),
            geolocation_url: normalize_url(geolocation_url, DEFAULT_GEOLOCATION_URL),
            deadline,
        }
    }

    /// Public address as reported by the IP-lookup service
    pub async fn public_ip(&self) -> Result<String, ProbeError> {
        let payload: IpPayload = self.get_json(&self.ip_lookup_url).await?;
        let ip = payload.ip.trim();
        if ip.is_empty() {
            return Err(ProbeError::Decode("empty ip field".to_string()));
        }
        Ok(ip.to_string())
    }

    /// City and country as reported by the geolocation service
    pub async fn location(&self) -> Result<GeoLocation, ProbeError> {
        let payload: GeoPayload = self.get_json(&self.geolocation_url).await?;

        if payload.error {
            return Err(ProbeError::Rejected(
                payload.reason.unwrap_or_else(|| "unknown reason".to_string()),
            ));
        }

        match (payload.city, payload.country_name) {
            (Some(city), Some(country_name)) => Ok(GeoLocation { city, country_name }),
            _ => Err(ProbeError::Decode(
                "missing city or country_name".to_string(),
            )),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProbeError> {
        debug!(url, "service lookup");

        let request = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|err| ProbeError::from_request(err, self.deadline))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ProbeError::Status {
                    status: status.as_u16(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|err| ProbeError::from_request(err, self.deadline))?;
            serde_json::from_slice::<T>(&body).map_err(|err| ProbeError::Decode(err.to_string()))
        };

        tokio::time::timeout(self.deadline, request)
            .await
            .map_err(|_| ProbeError::Timeout(self.deadline))?
    }
}

fn normalize_url(url: &str, fallback: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn spawn_server(app: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (addr, handle)
    }

    fn client_for(addr: SocketAddr, deadline: Duration) -> ServiceClient {
        ServiceClient::with_settings(
            &format!("http://{addr}/ip"),
            &format!("http://{addr}/geo"),
            deadline,
            false,
        )
    }

    #[test]
    fn test_blank_urls_fall_back_to_defaults() {
        let client = ServiceClient::with_settings("  ", "", Duration::from_secs(5), true);
        assert_eq!(client.ip_lookup_url, DEFAULT_IP_LOOKUP_URL);
        assert_eq!(client.geolocation_url, DEFAULT_GEOLOCATION_URL);
    }

    #[test]
    fn test_location_display() {
        let location = GeoLocation {
            city: "Paris".to_string(),
            country_name: "France".to_string(),
        };
        assert_eq!(location.to_string(), "Paris, France");
    }

    #[tokio::test]
    async fn public_ip_reads_ip_field() {
        let app = Router::new().route(
            "/ip",
            get(|| async { Json(serde_json::json!({ "ip": "1.2.3.4" })) }),
        );
        let (addr, handle) = spawn_server(app).await;

        let client = client_for(addr, Duration::from_secs(5));
        assert_eq!(client.public_ip().await.unwrap(), "1.2.3.4");

        handle.abort();
    }

    #[tokio::test]
    async fn public_ip_rejects_malformed_payload() {
        let app = Router::new().route("/ip", get(|| async { "not json" }));
        let (addr, handle) = spawn_server(app).await;

        let client = client_for(addr, Duration::from_secs(5));
        let err = client.public_ip().await.unwrap_err();
        assert!(matches!(err, ProbeError::Decode(_)));

        handle.abort();
    }

    #[tokio::test]
    async fn public_ip_reports_http_status() {
        let app = Router::new().route(
            "/ip",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let (addr, handle) = spawn_server(app).await;

        let client = client_for(addr, Duration::from_secs(5));
        let err = client.public_ip().await.unwrap_err();
        assert!(matches!(err, ProbeError::Status { status: 503 }));

        handle.abort();
    }

    #[tokio::test]
    async fn location_composes_city_and_country() {
        let app = Router::new().route(
            "/geo",
            get(|| async {
                Json(serde_json::json!({
                    "ip": "1.2.3.4",
                    "city": "Paris",
                    "region": "Ile-de-France",
                    "country_name": "France",
                }))
            }),
        );
        let (addr, handle) = spawn_server(app).await;

        let client = client_for(addr, Duration::from_secs(5));
        let location = client.location().await.unwrap();
        assert_eq!(location.to_string(), "Paris, France");

        handle.abort();
    }

    #[tokio::test]
    async fn location_surfaces_service_rejection() {
        let app = Router::new().route(
            "/geo",
            get(|| async {
                Json(serde_json::json!({ "error": true, "reason": "RateLimited" }))
            }),
        );
        let (addr, handle) = spawn_server(app).await;

        let client = client_for(addr, Duration::from_secs(5));
        match client.location().await {
            Err(ProbeError::Rejected(reason)) => assert_eq!(reason, "RateLimited"),
            other => panic!("expected rejection, got {other:?}"),
        }

        handle.abort();
    }

    #[tokio::test]
    async fn hanging_service_hits_deadline() {
        let app = Router::new().route(
            "/ip",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Json(serde_json::json!({ "ip": "1.2.3.4" }))
            }),
        );
        let (addr, handle) = spawn_server(app).await;

        let client = client_for(addr, Duration::from_millis(200));
        let err = client.public_ip().await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout(_)));

        handle.abort();
    }

    #[tokio::test]
    async fn unreachable_service_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(addr, Duration::from_secs(2));
        let err = client.public_ip().await.unwrap_err();
        assert_eq!(err.display_fallback(), "Unavailable");
    }
}
