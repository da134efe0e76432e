//! HTTP JSON RPC client for the Transmission daemon.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use http::{Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info};

use exporter_core::{Credentials, RpcEndpoint, SessionConfig, SessionStats};

use crate::source::SnapshotSource;
use crate::wire::{
    RpcResponse, SESSION_FIELDS, SESSION_GET, SESSION_STATS, SessionGet, SessionStatsReply,
};
use crate::SourceError;

/// Header carrying Transmission's CSRF token.
pub const SESSION_ID_HEADER: &str = "x-transmission-session-id";

/// One HTTP exchange, before RPC-level interpretation.
struct RawReply {
    status: StatusCode,
    session_id: Option<HeaderValue>,
    body: Bytes,
}

/// A reusable connection to a Transmission daemon.
///
/// Holds one pooled HTTP client for the process lifetime. The session id is
/// renegotiated transparently whenever the daemon answers `409 Conflict`.
pub struct TransmissionClient {
    http: Client<HttpConnector, Full<Bytes>>,
    uri: Uri,
    authorization: Option<HeaderValue>,
    session_id: RwLock<Option<HeaderValue>>,
    timeout: Duration,
}

impl TransmissionClient {
    /// Build a client without contacting the daemon.
    pub fn new(endpoint: &RpcEndpoint) -> Result<Self, SourceError> {
        let uri: Uri = endpoint
            .url()
            .parse()
            .map_err(|e: http::uri::InvalidUri| SourceError::InvalidEndpoint(e.to_string()))?;
        let authorization = endpoint.credentials.as_ref().map(basic_auth).transpose()?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(endpoint.timeout));
        let http = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            http,
            uri,
            authorization,
            session_id: RwLock::new(None),
            timeout: endpoint.timeout,
        })
    }

    /// Connect to the daemon.
    ///
    /// Performs one `session-get` round trip so that an unreachable daemon,
    /// bad credentials, or a broken endpoint surface here and not on the
    /// first collection tick.
    pub async fn connect(endpoint: &RpcEndpoint) -> Result<Self, SourceError> {
        let client = Self::new(endpoint)?;
        client.session_get().await?;
        info!(
            host = %endpoint.host,
            port = endpoint.port,
            authenticated = endpoint.credentials.is_some(),
            "connected to transmission"
        );
        Ok(client)
    }

    /// `session-get`, limited to the fields the exporter needs.
    pub async fn session_get(&self) -> Result<SessionConfig, SourceError> {
        let reply: SessionGet = self
            .call(SESSION_GET, Some(json!({ "fields": SESSION_FIELDS })))
            .await?;
        Ok(reply.into())
    }

    /// `session-stats`.
    pub async fn session_stats(&self) -> Result<SessionStats, SourceError> {
        let reply: SessionStatsReply = self.call(SESSION_STATS, None).await?;
        Ok(reply.into())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        arguments: Option<serde_json::Value>,
    ) -> Result<T, SourceError> {
        let mut request = json!({ "method": method });
        if let Some(arguments) = arguments {
            request["arguments"] = arguments;
        }
        let body = Bytes::from(request.to_string());

        let mut reply = self.send(body.clone()).await?;
        if reply.status == StatusCode::CONFLICT {
            let session_id = reply.session_id.take().ok_or(SourceError::SessionHandshake)?;
            debug!(method, "transmission session id renewed");
            *self.session_id.write().await = Some(session_id);
            reply = self.send(body).await?;
        }

        match reply.status {
            StatusCode::UNAUTHORIZED => return Err(SourceError::Unauthorized),
            StatusCode::CONFLICT => return Err(SourceError::SessionHandshake),
            status if !status.is_success() => return Err(SourceError::Status(status.as_u16())),
            _ => {}
        }

        let response: RpcResponse = serde_json::from_slice(&reply.body)
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        if response.result != "success" {
            return Err(SourceError::Rpc {
                method,
                result: response.result,
            });
        }
        serde_json::from_value(response.arguments).map_err(|e| SourceError::Decode(e.to_string()))
    }

    async fn send(&self, body: Bytes) -> Result<RawReply, SourceError> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.uri.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(auth) = &self.authorization {
            builder = builder.header(AUTHORIZATION, auth.clone());
        }
        if let Some(session_id) = self.session_id.read().await.clone() {
            builder = builder.header(SESSION_ID_HEADER, session_id);
        }
        let req = builder
            .body(Full::new(body))
            .map_err(|e| SourceError::InvalidEndpoint(e.to_string()))?;

        let exchange = async {
            let resp = self
                .http
                .request(req)
                .await
                .map_err(|e| SourceError::Transport(format!("{e:?}")))?;
            let status = resp.status();
            let session_id = resp.headers().get(SESSION_ID_HEADER).cloned();
            let body = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| SourceError::Transport(e.to_string()))?
                .to_bytes();
            Ok::<RawReply, SourceError>(RawReply {
                status,
                session_id,
                body,
            })
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))?
    }
}

impl SnapshotSource for TransmissionClient {
    async fn fetch_config(&self) -> Result<SessionConfig, SourceError> {
        self.session_get().await
    }

    async fn fetch_stats(&self) -> Result<SessionStats, SourceError> {
        self.session_stats().await
    }
}

fn basic_auth(credentials: &Credentials) -> Result<HeaderValue, SourceError> {
    let token = STANDARD.encode(format!("{}:{}", credentials.username, credentials.password));
    let mut value = HeaderValue::from_str(&format!("Basic {token}"))
        .map_err(|e| SourceError::InvalidEndpoint(e.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::Json;
    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;

    const SESSION_ID: &str = "abc123";

    #[derive(Clone, Default)]
    struct Fake {
        conflicts: Arc<AtomicUsize>,
        /// Whether each request carried an `Authorization` header.
        auth_seen: Arc<Mutex<Vec<bool>>>,
        require_auth: Option<&'static str>,
        stats_result: Option<&'static str>,
    }

    fn session_args() -> serde_json::Value {
        json!({
            "speed-limit-down": 100,
            "speed-limit-down-enabled": true,
            "speed-limit-up": 50,
            "speed-limit-up-enabled": false,
            "alt-speed-down": 20,
            "alt-speed-up": 10,
            "alt-speed-time-enabled": false,
            "seedRatioLimit": 2.0,
            "seedRatioLimited": true,
            "download-queue-size": 5,
            "download-queue-enabled": true,
            "seed-queue-size": 10,
            "seed-queue-enabled": false,
            "peer-limit-global": 200,
            "peer-limit-per-torrent": 50,
            "cache-size-mb": 4
        })
    }

    fn stats_args() -> serde_json::Value {
        let window = json!({
            "uploadedBytes": 1,
            "downloadedBytes": 2,
            "filesAdded": 3,
            "sessionCount": 4,
            "secondsActive": 5
        });
        json!({
            "activeTorrentCount": 3,
            "downloadSpeed": 1024,
            "pausedTorrentCount": 1,
            "torrentCount": 4,
            "uploadSpeed": 512,
            "cumulative-stats": window,
            "current-stats": window
        })
    }

    async fn fake_rpc(
        State(fake): State<Fake>,
        headers: HeaderMap,
        Json(req): Json<serde_json::Value>,
    ) -> Response {
        fake.auth_seen
            .lock()
            .unwrap()
            .push(headers.contains_key("authorization"));

        if let Some(expected) = fake.require_auth {
            let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
            if auth != Some(expected) {
                return axum::http::StatusCode::UNAUTHORIZED.into_response();
            }
        }

        let session_ok = headers
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            == Some(SESSION_ID);
        if !session_ok {
            fake.conflicts.fetch_add(1, Ordering::SeqCst);
            return (
                axum::http::StatusCode::CONFLICT,
                [(SESSION_ID_HEADER, SESSION_ID)],
            )
                .into_response();
        }

        match req["method"].as_str() {
            Some("session-get") => {
                Json(json!({ "result": "success", "arguments": session_args() })).into_response()
            }
            Some("session-stats") => match fake.stats_result {
                Some(result) => Json(json!({ "result": result, "arguments": {} })).into_response(),
                None => {
                    Json(json!({ "result": "success", "arguments": stats_args() })).into_response()
                }
            },
            _ => Json(json!({ "result": "method name not recognized" })).into_response(),
        }
    }

    async fn spawn_fake(fake: Fake) -> RpcEndpoint {
        let app = axum::Router::new()
            .route("/transmission/rpc", post(fake_rpc))
            .with_state(fake);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        RpcEndpoint::new("127.0.0.1", port)
    }

    #[tokio::test]
    async fn connect_negotiates_session_id() {
        let fake = Fake::default();
        let conflicts = fake.conflicts.clone();
        let endpoint = spawn_fake(fake).await;

        let client = TransmissionClient::connect(&endpoint).await.unwrap();
        assert_eq!(conflicts.load(Ordering::SeqCst), 1);

        // The negotiated id is reused for later calls.
        client.fetch_stats().await.unwrap();
        client.fetch_config().await.unwrap();
        assert_eq!(conflicts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetches_both_snapshots() {
        let endpoint = spawn_fake(Fake::default()).await;
        let client = TransmissionClient::connect(&endpoint).await.unwrap();

        let config = client.fetch_config().await.unwrap();
        assert_eq!(config.speed_limit_down.value, 100.0);
        assert!(config.speed_limit_down.enabled);
        assert!(!config.alt_speed.enabled);
        assert_eq!(config.cache_size_mb, 4.0);

        let stats = client.fetch_stats().await.unwrap();
        assert_eq!(stats.download_speed, 1024);
        assert_eq!(stats.upload_speed, 512);
        assert_eq!(stats.current.seconds_active, 5);
    }

    #[tokio::test]
    async fn sends_basic_auth_when_configured() {
        // admin:secret
        let fake = Fake {
            require_auth: Some("Basic YWRtaW46c2VjcmV0"),
            ..Default::default()
        };
        let auth_seen = fake.auth_seen.clone();
        let endpoint = spawn_fake(fake).await.with_credentials(Some(Credentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        }));

        assert!(TransmissionClient::connect(&endpoint).await.is_ok());
        let seen = auth_seen.lock().unwrap().clone();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|&sent| sent));
    }

    #[tokio::test]
    async fn no_auth_header_without_credentials() {
        let fake = Fake::default();
        let auth_seen = fake.auth_seen.clone();
        let endpoint = spawn_fake(fake).await;

        let client = TransmissionClient::connect(&endpoint).await.unwrap();
        client.fetch_stats().await.unwrap();

        let seen = auth_seen.lock().unwrap().clone();
        // 409 handshake, replayed session-get, session-stats.
        assert_eq!(seen, vec![false, false, false]);
    }

    #[tokio::test]
    async fn username_alone_sends_no_auth_header() {
        let fake = Fake::default();
        let auth_seen = fake.auth_seen.clone();
        let credentials = Credentials::from_parts(Some("admin".to_string()), None);
        let endpoint = spawn_fake(fake).await.with_credentials(credentials);

        TransmissionClient::connect(&endpoint).await.unwrap();

        let seen = auth_seen.lock().unwrap().clone();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|&sent| !sent));
    }

    #[tokio::test]
    async fn missing_credentials_are_unauthorized() {
        let fake = Fake {
            require_auth: Some("Basic YWRtaW46c2VjcmV0"),
            ..Default::default()
        };
        let endpoint = spawn_fake(fake).await;

        let err = TransmissionClient::connect(&endpoint).await.err().unwrap();
        assert!(matches!(err, SourceError::Unauthorized), "got {err:?}");
    }

    #[tokio::test]
    async fn non_success_result_is_rpc_error() {
        let fake = Fake {
            stats_result: Some("session stats unavailable"),
            ..Default::default()
        };
        let endpoint = spawn_fake(fake).await;
        let client = TransmissionClient::connect(&endpoint).await.unwrap();

        match client.fetch_stats().await {
            Err(SourceError::Rpc { method, result }) => {
                assert_eq!(method, "session-stats");
                assert_eq!(result, "session stats unavailable");
            }
            other => panic!("expected rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint = RpcEndpoint::new("127.0.0.1", port);
        let err = TransmissionClient::connect(&endpoint).await.err().unwrap();
        assert!(matches!(err, SourceError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn slow_daemon_times_out() {
        let app = axum::Router::new().route(
            "/transmission/rpc",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut endpoint = RpcEndpoint::new("127.0.0.1", port);
        endpoint.timeout = Duration::from_millis(100);
        let err = TransmissionClient::connect(&endpoint).await.err().unwrap();
        assert!(matches!(err, SourceError::Timeout(_)), "got {err:?}");
    }

    #[test]
    fn invalid_host_is_rejected() {
        let endpoint = RpcEndpoint::new("bad host", 9091);
        assert!(matches!(
            TransmissionClient::new(&endpoint),
            Err(SourceError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn basic_auth_header() {
        let value = basic_auth(&Credentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        })
        .unwrap();
        assert_eq!(value.to_str().unwrap(), "Basic YWRtaW46c2VjcmV0");
        assert!(value.is_sensitive());
    }
}
