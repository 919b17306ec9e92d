//! The booking backend client.
//!
//! One method per backend verb, all going through a single retrying
//! request helper. Retries cover timeouts, connection failures, and 5xx
//! responses, with exponential backoff. A 429 response sleeps for the
//! advertised `Retry-After` and does not consume an attempt. 404 and 401
//! are terminal.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use frontdesk_core::BookingId;

use crate::error::{BackendError, BackendResult};
use crate::types::{
    AvailabilityResponse, CancelBookingResponse, CreateBookingRequest, CreateBookingResponse,
    GetBookingResponse, HealthResponse, RescheduleBookingResponse, RescheduleRequest,
    ScheduleMeetingRequest, ScheduleMeetingResponse,
};

/// Total per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authentication scheme for the backend.
#[derive(Clone, Default)]
pub enum BackendAuth {
    /// JWT bearer token (`Authorization: Bearer <token>`).
    Jwt(String),
    /// Static API key (`X-API-Key: <key>`).
    ApiKey(String),
    /// No authentication.
    #[default]
    None,
}

impl std::fmt::Debug for BackendAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jwt(_) => write!(f, "BackendAuth::Jwt(..)"),
            Self::ApiKey(_) => write!(f, "BackendAuth::ApiKey(..)"),
            Self::None => write!(f, "BackendAuth::None"),
        }
    }
}

/// Retry behaviour for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts per call.
    pub max_attempts: u32,
    /// Backoff base; the sleep after failed attempt `n` (1-based) is
    /// `base x 2^(n-1)`.
    pub base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(1),
        }
    }
}

/// Async JSON client for the booking/meetings backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl BackendClient {
    /// Create a client for the given base URL and auth scheme.
    ///
    /// # Errors
    ///
    /// Returns an error if the supplied credentials contain characters
    /// invalid in an HTTP header, or the client cannot be constructed.
    pub fn new(base_url: impl Into<String>, auth: BackendAuth) -> BackendResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("X-Source", HeaderValue::from_static("chatbot"));

        match auth {
            BackendAuth::Jwt(token) => {
                let mut value = HeaderValue::try_from(format!("Bearer {token}"))
                    .map_err(|e| BackendError::InvalidResponse(format!("bad auth token: {e}")))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            },
            BackendAuth::ApiKey(key) => {
                let mut value = HeaderValue::try_from(key)
                    .map_err(|e| BackendError::InvalidResponse(format!("bad api key: {e}")))?;
                value.set_sensitive(true);
                headers.insert("X-API-Key", value);
            },
            BackendAuth::None => {},
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Create a client from the environment: `BACKEND_API_URL` plus
    /// `BACKEND_JWT_TOKEN` or `BACKEND_API_KEY` (JWT wins when both are
    /// set).
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is missing or the client cannot be
    /// constructed.
    pub fn from_env() -> BackendResult<Self> {
        let base_url = std::env::var("BACKEND_API_URL")
            .map_err(|_| BackendError::InvalidResponse("BACKEND_API_URL not set".to_string()))?;
        let auth = if let Ok(token) = std::env::var("BACKEND_JWT_TOKEN") {
            BackendAuth::Jwt(token)
        } else if let Ok(key) = std::env::var("BACKEND_API_KEY") {
            BackendAuth::ApiKey(key)
        } else {
            BackendAuth::None
        };
        Self::new(base_url, auth)
    }

    /// Override the retry policy (stub tests use a millisecond base).
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Create a booking.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] after retries are exhausted or on a
    /// terminal status.
    pub async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> BackendResult<CreateBookingResponse> {
        self.request_json(Method::POST, "/bookings", Some(request), &[])
            .await
    }

    /// Look up a booking by reference.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown references; other
    /// variants per the retry policy.
    pub async fn get_booking(&self, id: &BookingId) -> BackendResult<GetBookingResponse> {
        self.request_json::<(), _>(Method::GET, &format!("/bookings/{id}"), None, &[])
            .await
    }

    /// Cancel a booking. No local existence pre-check is performed; an
    /// unknown reference surfaces the backend's not-found error.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] per the retry policy.
    pub async fn cancel_booking(&self, id: &BookingId) -> BackendResult<CancelBookingResponse> {
        self.request_json::<(), _>(Method::DELETE, &format!("/bookings/{id}"), None, &[])
            .await
    }

    /// Move a booking to a new date/time.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] per the retry policy.
    pub async fn reschedule_booking(
        &self,
        id: &BookingId,
        request: &RescheduleRequest,
    ) -> BackendResult<RescheduleBookingResponse> {
        self.request_json(Method::PUT, &format!("/bookings/{id}"), Some(request), &[])
            .await
    }

    /// Open times for a service on a date.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] per the retry policy.
    pub async fn get_available_slots(
        &self,
        service: &str,
        date: &str,
    ) -> BackendResult<AvailabilityResponse> {
        self.request_json::<(), _>(
            Method::GET,
            "/bookings/availability",
            None,
            &[("service", service), ("date", date)],
        )
        .await
    }

    /// Schedule a meeting.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] per the retry policy. A scheduling
    /// conflict comes back as a success-status envelope with
    /// `success: false`; see [`ScheduleMeetingResponse::is_conflict`].
    pub async fn schedule_meeting(
        &self,
        request: &ScheduleMeetingRequest,
    ) -> BackendResult<ScheduleMeetingResponse> {
        self.request_json(Method::POST, "/meetings", Some(request), &[])
            .await
    }

    /// Open meeting times for a type/date/duration.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] per the retry policy.
    pub async fn get_available_meeting_times(
        &self,
        meeting_type: &str,
        date: &str,
        duration: &str,
    ) -> BackendResult<AvailabilityResponse> {
        self.request_json::<(), _>(
            Method::GET,
            "/meetings/availability",
            None,
            &[("type", meeting_type), ("date", date), ("duration", duration)],
        )
        .await
    }

    /// Backend liveness probe.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] per the retry policy.
    pub async fn health_check(&self) -> BackendResult<HealthResponse> {
        self.request_json::<(), _>(Method::GET, "/health", None, &[])
            .await
    }

    /// The retrying request core.
    async fn request_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &[(&str, &str)],
    ) -> BackendResult<T> {
        let url = format!("{}{path}", self.base_url);
        let mut attempt: u32 = 0;

        loop {
            let mut builder = self.http.request(method.clone(), &url);
            if !query.is_empty() {
                builder = builder.query(query);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let error = match builder.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let wait = retry_after(response.headers()).unwrap_or(self.retry.base);
                        warn!(%url, wait_secs = wait.as_secs_f64(), "backend rate limited");
                        // Honoring Retry-After does not consume an attempt.
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    if status.is_success() {
                        return response
                            .json::<T>()
                            .await
                            .map_err(|e| BackendError::InvalidResponse(e.to_string()));
                    }

                    match status {
                        StatusCode::NOT_FOUND => return Err(BackendError::NotFound),
                        StatusCode::UNAUTHORIZED => return Err(BackendError::AuthFailed),
                        s if s.is_server_error() => BackendError::Upstream {
                            status: s.as_u16(),
                            message: server_error_field(response).await,
                        },
                        s => {
                            return Err(BackendError::Upstream {
                                status: s.as_u16(),
                                message: server_error_field(response).await,
                            });
                        },
                    }
                },
                Err(e) if e.is_timeout() => BackendError::Timeout,
                Err(e) if e.is_connect() => BackendError::Connect(e.to_string()),
                Err(e) => return Err(BackendError::Transport(e)),
            };

            attempt = attempt.saturating_add(1);
            if attempt >= self.retry.max_attempts {
                warn!(%url, attempts = attempt, error = %error, "backend call failed");
                return Err(error);
            }

            let backoff = self
                .retry
                .base
                .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)));
            debug!(%url, attempt, backoff_secs = backoff.as_secs_f64(), "retrying backend call");
            tokio::time::sleep(backoff).await;
        }
    }
}

/// Parse a `Retry-After: <seconds>` header.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("Retry-After")?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Pull the `error` field out of a failure body, falling back to the raw
/// text or a generic message.
async fn server_error_field(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return error.to_string();
        }
    }
    if text.is_empty() {
        "backend request failed".to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use std::time::Instant;

    fn fast_client(base_url: String) -> BackendClient {
        BackendClient::new(base_url, BackendAuth::None)
            .unwrap()
            .with_retry_policy(RetryPolicy {
                max_attempts: 3,
                base: Duration::from_millis(100),
            })
    }

    fn booking_request() -> CreateBookingRequest {
        CreateBookingRequest {
            service: "Consultation".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            time: "14:00".to_string(),
            customer_name: "Jane Doe".to_string(),
            customer_email: "jane@ex.com".to_string(),
            customer_phone: Some("(555) 123-4567".to_string()),
            party_size: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_headers_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/health")
                .header("X-Source", "chatbot")
                .header("Accept", "application/json");
            then.status(200).json_body(serde_json::json!({"status": "ok"}));
        });

        let client = fast_client(server.base_url());
        let health = client.health_check().await.unwrap();
        assert_eq!(health.status, "ok");
        mock.assert();
    }

    #[tokio::test]
    async fn test_api_key_auth_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/health").header("X-API-Key", "k-123");
            then.status(200).json_body(serde_json::json!({"status": "ok"}));
        });

        let client = BackendClient::new(server.base_url(), BackendAuth::ApiKey("k-123".into()))
            .unwrap();
        client.health_check().await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_bearer_auth_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/health")
                .header("Authorization", "Bearer tok");
            then.status(200).json_body(serde_json::json!({"status": "ok"}));
        });

        let client = BackendClient::new(server.base_url(), BackendAuth::Jwt("tok".into())).unwrap();
        client.health_check().await.unwrap();
        mock.assert();
    }

    /// Minimal scripted HTTP stub: serves one canned response per
    /// connection, in order, then stops accepting. `Connection: close`
    /// forces the client onto a fresh connection for every attempt.
    async fn spawn_stub(responses: Vec<String>) -> std::net::SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        addr
    }

    fn http_response(status: &str, extra_headers: &[(&str, &str)], body: &str) -> String {
        let mut response = format!("HTTP/1.1 {status}\r\n");
        for (name, value) in extra_headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str(&format!(
            "Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ));
        response
    }

    #[tokio::test]
    async fn test_retry_on_5xx_then_success() {
        let addr = spawn_stub(vec![
            http_response("503 Service Unavailable", &[], ""),
            http_response("503 Service Unavailable", &[], ""),
            http_response(
                "200 OK",
                &[],
                r#"{"success": true, "booking_id": "BK-0001-0002"}"#,
            ),
        ])
        .await;

        let client = fast_client(format!("http://{addr}"));
        let start = Instant::now();
        let response = client.create_booking(&booking_request()).await.unwrap();
        assert!(response.success);
        assert_eq!(response.booking_id.as_deref(), Some("BK-0001-0002"));
        // Two backoff sleeps: base + 2 x base.
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_retries_exhausted_surfaces_last_error() {
        let addr = spawn_stub(vec![
            http_response("503 Service Unavailable", &[], r#"{"error": "down"}"#),
            http_response("503 Service Unavailable", &[], r#"{"error": "down"}"#),
            http_response("503 Service Unavailable", &[], r#"{"error": "down"}"#),
        ])
        .await;

        let client = fast_client(format!("http://{addr}"));
        let err = client.create_booking(&booking_request()).await.unwrap_err();
        let BackendError::Upstream { status, message } = err else {
            panic!("expected upstream error");
        };
        assert_eq!(status, 503);
        assert_eq!(message, "down");
    }

    #[tokio::test]
    async fn test_404_is_terminal() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/bookings/BK-1234-5678");
            then.status(404);
        });

        let client = fast_client(server.base_url());
        let id = BookingId::parse("BK-1234-5678").unwrap();
        let err = client.get_booking(&id).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound));
        assert_eq!(err.to_string(), "Resource not found");
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn test_401_is_terminal() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(401);
        });

        let client = fast_client(server.base_url());
        let err = client.health_check().await.unwrap_err();
        assert!(matches!(err, BackendError::AuthFailed));
        assert_eq!(err.to_string(), "Authentication failed");
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn test_4xx_surfaces_server_error_field() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bookings");
            then.status(422)
                .json_body(serde_json::json!({"error": "date in the past"}));
        });

        let client = fast_client(server.base_url());
        let err = client.create_booking(&booking_request()).await.unwrap_err();
        let BackendError::Upstream { status, message } = err else {
            panic!("expected upstream error");
        };
        assert_eq!(status, 422);
        assert_eq!(message, "date in the past");
    }

    #[tokio::test]
    async fn test_429_honors_retry_after_without_consuming_attempt() {
        let addr = spawn_stub(vec![
            http_response("429 Too Many Requests", &[("Retry-After", "1")], ""),
            http_response(
                "200 OK",
                &[],
                r#"{"success": true, "available_times": ["14:00"]}"#,
            ),
        ])
        .await;

        let client = fast_client(format!("http://{addr}"));
        let start = Instant::now();
        let response = client
            .get_available_slots("consultation", "2025-06-01")
            .await
            .unwrap();

        assert!(response.success);
        // Slept the advertised second before the second attempt.
        assert!(start.elapsed() >= Duration::from_secs(1));
        // And no backoff sleep on top of it: well under base + 1 s.
        assert!(start.elapsed() < Duration::from_millis(1600));
    }

    #[tokio::test]
    async fn test_query_parameters() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/meetings/availability")
                .query_param("type", "demo")
                .query_param("date", "2025-06-01")
                .query_param("duration", "30 minutes");
            then.status(200).json_body(serde_json::json!({
                "success": true,
                "available_times": ["09:00", "09:30"],
            }));
        });

        let client = fast_client(server.base_url());
        let times = client
            .get_available_meeting_times("demo", "2025-06-01", "30 minutes")
            .await
            .unwrap();
        assert_eq!(times.available_times.len(), 2);
        mock.assert();
    }
}
