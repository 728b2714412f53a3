//! Async client for the FamilyLedger backend.
//!
//! # Design
//! `ApiClient` holds only its configuration and shared collaborators; no
//! call mutates it, so one instance can serve any number of concurrent
//! requests. Every operation is three steps:
//!
//! 1. `build_*` turns an `Endpoint`, query and body into an `HttpRequest`
//!    (pure, testable without a network).
//! 2. The `Transport` performs the exchange.
//! 3. A `response::parse_*` function classifies and decodes the result.
//!
//! The only side effect besides the exchange itself is notifying the
//! `SessionObserver` when a call comes back 401. That notification is
//! dispatched in the background and never delays or replaces the
//! `Unauthorized` error. Nothing here retries.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::endpoint::Endpoint;
use crate::envelope::Envelope;
use crate::error::{ApiError, Error, Result};
use crate::http::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::multipart::MultipartForm;
use crate::response;
use crate::session::{CredentialStore, SessionObserver};

const JSON: &str = "application/json";

/// Pass as the body of a call that sends none.
pub const NO_BODY: Option<&()> = None;

/// Connection settings, fixed for the life of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and optional path prefix, e.g. `https://api.familyledger.app`.
    pub base_url: String,

    /// Applied uniformly to every exchange.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the FamilyLedger REST API.
#[derive(Clone)]
pub struct ApiClient<T = ReqwestTransport> {
    base_url: String,
    transport: T,
    credentials: Arc<dyn CredentialStore>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl<T> fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient<ReqwestTransport> {
    /// Construct a client that talks HTTP through `reqwest`.
    ///
    /// ## Errors
    ///
    /// `Error::Transport` if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(&config.base_url, transport, credentials))
    }
}

impl<T> ApiClient<T> {
    pub fn with_transport(base_url: &str, transport: T, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            credentials,
            observer: None,
        }
    }

    /// Report 401s to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Compose the absolute URL for `endpoint`. An empty `query` adds no `?`.
    ///
    /// ## Errors
    ///
    /// `ApiError::InvalidUrl` if the result is not an absolute http(s) URL.
    pub fn build_url(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> std::result::Result<String, ApiError> {
        let raw = format!("{}{}", self.base_url, endpoint.path());
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(raw));
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url.into())
    }

    /// Build a JSON request. `body` is serialized if present.
    pub fn build_request<B>(
        &self,
        endpoint: Endpoint,
        body: Option<&B>,
        query: &[(&str, &str)],
    ) -> Result<HttpRequest>
    where
        B: Serialize + ?Sized,
    {
        let url = self.build_url(endpoint, query)?;
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(Error::Encode)?;

        Ok(HttpRequest {
            method: endpoint.method(),
            url,
            headers: self.headers(JSON),
            body,
        })
    }

    /// Build a `multipart/form-data` request with a fresh boundary.
    pub fn build_upload(&self, endpoint: Endpoint, form: &MultipartForm) -> Result<HttpRequest> {
        let url = self.build_url(endpoint, &[])?;
        let (content_type, body) = form.encode();

        Ok(HttpRequest {
            method: endpoint.method(),
            url,
            headers: self.headers(&content_type),
            body: Some(body),
        })
    }

    fn headers(&self, content_type: &str) -> Vec<(String, String)> {
        let mut headers = vec![
            ("content-type".to_string(), content_type.to_string()),
            ("accept".to_string(), JSON.to_string()),
        ];
        if let Some(token) = self.credentials.token() {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }

    /// Pass a classification through, telling the observer about 401s.
    fn observe<V>(&self, result: std::result::Result<V, ApiError>) -> Result<V> {
        if let Err(err) = &result {
            if matches!(err, ApiError::Unauthorized) {
                self.notify_unauthorized();
            }
            tracing::warn!(error = %err, "request failed");
        }
        result.map_err(Error::from)
    }

    /// Hand the 401 to the observer without waiting for it. Inside a tokio
    /// runtime the callback runs on the blocking pool; outside one it runs
    /// inline. Either way a panicking observer cannot replace the error.
    fn notify_unauthorized(&self) {
        let Some(observer) = self.observer.clone() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || dispatch_unauthorized(observer.as_ref()));
            }
            Err(_) => dispatch_unauthorized(observer.as_ref()),
        }
    }
}

fn dispatch_unauthorized(observer: &dyn SessionObserver) {
    if panic::catch_unwind(AssertUnwindSafe(|| observer.unauthorized())).is_err() {
        tracing::error!("session observer panicked");
    }
}

impl<T: Transport> ApiClient<T> {
    /// Call `endpoint` without a body and return the unwrapped payload.
    ///
    /// ## Errors
    ///
    /// - `Error::Api` with the classified failure
    /// - `Error::Transport` if no HTTP exchange happened
    pub async fn request<R>(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let request = self.build_request(endpoint, NO_BODY, query)?;
        let response = self.send(request).await?;
        self.observe(response::parse_data(&response))
    }

    /// Call `endpoint` with a JSON body and return the unwrapped payload.
    ///
    /// ## Errors
    ///
    /// Same as `request`, plus `Error::Encode` if `body` cannot be serialized.
    pub async fn request_with_body<R, B>(
        &self,
        endpoint: Endpoint,
        body: &B,
        query: &[(&str, &str)],
    ) -> Result<R>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.build_request(endpoint, Some(body), query)?;
        let response = self.send(request).await?;
        self.observe(response::parse_data(&response))
    }

    /// Call `endpoint` and return the envelope as sent, without unwrapping
    /// `data`. A body that is not envelope-shaped is a decoding error.
    pub async fn request_envelope<R, B>(
        &self,
        endpoint: Endpoint,
        body: Option<&B>,
        query: &[(&str, &str)],
    ) -> Result<Envelope<R>>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.build_request(endpoint, body, query)?;
        let response = self.send(request).await?;
        self.observe(response::parse_envelope(&response))
    }

    /// Call `endpoint` for its effect only; any successful payload is
    /// discarded.
    pub async fn request_void<B>(
        &self,
        endpoint: Endpoint,
        body: Option<&B>,
        query: &[(&str, &str)],
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let request = self.build_request(endpoint, body, query)?;
        let response = self.send(request).await?;
        self.observe(response::parse_empty(&response))
    }

    /// Upload `form` as `multipart/form-data` and return the unwrapped
    /// payload.
    pub async fn upload_multipart<R>(&self, endpoint: Endpoint, form: &MultipartForm) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let request = self.build_upload(endpoint, form)?;
        let response = self.send(request).await?;
        self.observe(response::parse_data(&response))
    }

    #[tracing::instrument(skip_all, fields(method = request.method.as_str(), url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!("sending request");
        let response = self.transport.execute(request).await?;
        tracing::debug!(status = response.status, bytes = response.body.len(), "received response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use serde::Deserialize;
    use uuid::Uuid;

    use super::*;
    use crate::envelope::Empty;
    use crate::error::TransportError;
    use crate::http::HttpMethod;
    use crate::multipart::FilePart;
    use crate::session::{MemoryCredentials, SessionEvent};

    /// Replays canned responses and records what was sent.
    #[derive(Default)]
    struct FakeTransport {
        responses: Mutex<VecDeque<std::result::Result<HttpResponse, TransportError>>>,
        sent: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn replying(status: u16, body: &str) -> Self {
            let fake = Self::default();
            fake.push(status, body);
            fake
        }

        fn push(&self, status: u16, body: &str) {
            self.responses.lock().unwrap().push_back(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.as_bytes().to_vec(),
            }));
        }

        fn failing() -> Self {
            let fake = Self::default();
            fake.responses
                .lock()
                .unwrap()
                .push_back(Err(TransportError::new("connection refused")));
            fake
        }

        fn last_sent(&self) -> HttpRequest {
            self.sent.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for FakeTransport {
        async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            self.sent.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no canned response left")
        }
    }

    #[derive(Default)]
    struct CountingObserver(AtomicUsize);

    impl SessionObserver for CountingObserver {
        fn unauthorized(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Goal {
        title: String,
        progress: u8,
    }

    fn client(transport: FakeTransport) -> ApiClient<FakeTransport> {
        ApiClient::with_transport(
            "https://api.example.com/",
            transport,
            Arc::new(MemoryCredentials::new(Some("secret".to_string()))),
        )
    }

    fn anonymous() -> ApiClient<FakeTransport> {
        ApiClient::with_transport(
            "https://api.example.com",
            FakeTransport::default(),
            Arc::new(MemoryCredentials::default()),
        )
    }

    #[test]
    fn empty_query_adds_no_question_mark() {
        let url = anonymous().build_url(Endpoint::ListGoals, &[]).unwrap();
        assert_eq!(url, "https://api.example.com/api/v1/goals");
        assert!(!url.contains('?'));
    }

    #[test]
    fn query_pairs_are_encoded_after_one_question_mark() {
        let url = anonymous()
            .build_url(Endpoint::ListTasks, &[("status", "open"), ("q", "milk & eggs")])
            .unwrap();
        assert_eq!(url.matches('?').count(), 1);
        assert_eq!(
            url,
            "https://api.example.com/api/v1/tasks?status=open&q=milk+%26+eggs"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let client = ApiClient::with_transport(
            "not a url",
            FakeTransport::default(),
            Arc::new(MemoryCredentials::default()),
        );
        let err = client.build_url(Endpoint::Me, &[]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let client = ApiClient::with_transport(
            "ftp://files.example.com",
            FakeTransport::default(),
            Arc::new(MemoryCredentials::default()),
        );
        assert!(matches!(
            client.build_url(Endpoint::Me, &[]),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn json_headers_and_bearer_token() {
        let client = client(FakeTransport::default());
        let req = client.build_request(Endpoint::Me, NO_BODY, &[]).unwrap();

        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert_eq!(req.header("Authorization"), Some("Bearer secret"));
        assert!(req.body.is_none());
    }

    #[test]
    fn no_token_means_no_authorization_header() {
        let req = anonymous().build_request(Endpoint::Me, NO_BODY, &[]).unwrap();
        assert_eq!(req.header("authorization"), None);
        assert_eq!(req.headers.len(), 2);
    }

    #[test]
    fn body_is_json_encoded() {
        let goal = Goal {
            title: "Save for a trip".to_string(),
            progress: 10,
        };
        let req = anonymous()
            .build_request(Endpoint::CreateGoal, Some(&goal), &[])
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);

        let decoded: Goal = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(decoded, goal);
    }

    #[test]
    fn upload_uses_multipart_content_type() {
        let form = MultipartForm::new()
            .field("name", "Fluffy")
            .file(FilePart::new("photo.png", "image/png", vec![1, 2, 3]));
        let req = client(FakeTransport::default())
            .build_upload(Endpoint::UploadPetPhoto(Uuid::nil()), &form)
            .unwrap();

        let content_type = req.header("content-type").unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary=Boundary-"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("authorization"), Some("Bearer secret"));

        let boundary = content_type.rsplit('=').next().unwrap();
        let body = String::from_utf8_lossy(req.body.as_deref().unwrap()).into_owned();
        assert_eq!(body.matches(&format!("--{boundary}\r\n")).count(), 2);
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[tokio::test]
    async fn request_returns_envelope_data() {
        let client = client(FakeTransport::replying(
            200,
            r#"{"success":true,"data":{"title":"Run a 10k","progress":40}}"#,
        ));
        let goal: Goal = client.request(Endpoint::GetGoal(Uuid::nil()), &[]).await.unwrap();
        assert_eq!(
            goal,
            Goal {
                title: "Run a 10k".to_string(),
                progress: 40
            }
        );
        assert_eq!(client.transport().last_sent().method, HttpMethod::Get);
    }

    /// Wait for background observer calls to land.
    async fn settled(observer: &CountingObserver, expected: usize) -> usize {
        for _ in 0..100 {
            if observer.0.load(Ordering::SeqCst) >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        observer.0.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn unauthorized_notifies_observer_exactly_once() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SessionEvent>();
        let client = client(FakeTransport::replying(
            401,
            r#"{"success":true,"data":{"title":"ignored","progress":0}}"#,
        ))
        .with_observer(Arc::new(tx));

        let err = client.request::<Goal>(Endpoint::ListGoals, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Unauthorized)));

        // the client holds one sender; dropping it closes the channel once
        // the background dispatch has finished with its clone
        drop(client);
        assert_eq!(rx.recv().await, Some(SessionEvent::Unauthorized));
        assert_eq!(rx.recv().await, None);
    }

    /// Counts the call, then fails.
    #[derive(Default)]
    struct PanickingObserver(CountingObserver);

    impl SessionObserver for PanickingObserver {
        fn unauthorized(&self) {
            self.0.unauthorized();
            panic!("observer failed");
        }
    }

    #[tokio::test]
    async fn panicking_observer_does_not_mask_unauthorized() {
        let observer = Arc::new(PanickingObserver::default());
        let client = client(FakeTransport::replying(401, "")).with_observer(observer.clone());

        let err = client.request::<Empty>(Endpoint::Me, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Unauthorized)));
        assert_eq!(settled(&observer.0, 1).await, 1);
    }

    #[test]
    fn panicking_observer_outside_a_runtime_is_contained() {
        let observer = PanickingObserver::default();
        dispatch_unauthorized(&observer);
        assert_eq!(observer.0 .0.load(Ordering::SeqCst), 1);
    }

    /// Blocks well past any reasonable request latency.
    struct SlowObserver(CountingObserver);

    impl SessionObserver for SlowObserver {
        fn unauthorized(&self) {
            std::thread::sleep(Duration::from_millis(500));
            self.0.unauthorized();
        }
    }

    #[tokio::test]
    async fn slow_observer_does_not_delay_the_error() {
        let observer = Arc::new(SlowObserver(CountingObserver::default()));
        let client = client(FakeTransport::replying(401, "")).with_observer(observer.clone());

        let started = std::time::Instant::now();
        let err = client.request::<Empty>(Endpoint::Me, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Unauthorized)));
        assert!(
            started.elapsed() < Duration::from_millis(250),
            "error waited {:?} for the observer",
            started.elapsed()
        );
        assert_eq!(settled(&observer.0, 1).await, 1);
    }

    #[tokio::test]
    async fn other_failures_do_not_notify_observer() {
        let observer = Arc::new(CountingObserver::default());
        let transport = FakeTransport::default();
        transport.push(403, "");
        transport.push(500, r#"{"success":false,"message":"boom"}"#);
        let client = client(transport).with_observer(observer.clone());

        let err = client.request::<Goal>(Endpoint::ListGoals, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Forbidden)));
        let err = client.request::<Goal>(Endpoint::ListGoals, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Server(ref message)) if message == "boom"));
        assert_eq!(observer.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_status_carries_code() {
        let client = client(FakeTransport::replying(418, "I'm a teapot"));
        let err = client.request::<Goal>(Endpoint::ListGoals, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::UnknownStatus(418))));
    }

    #[tokio::test]
    async fn transport_failure_is_its_own_layer() {
        let client = client(FakeTransport::failing());
        let err = client.request::<Goal>(Endpoint::ListGoals, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.api().is_none());
    }

    #[tokio::test]
    async fn invalid_url_fails_before_sending() {
        let client = ApiClient::with_transport(
            "::",
            FakeTransport::default(),
            Arc::new(MemoryCredentials::default()),
        );
        let err = client.request::<Goal>(Endpoint::ListGoals, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::InvalidUrl(_))));
        assert!(client.transport().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn request_with_body_sends_and_decodes() {
        let client = client(FakeTransport::replying(
            201,
            r#"{"success":true,"data":{"title":"Learn piano","progress":0}}"#,
        ));
        let input = Goal {
            title: "Learn piano".to_string(),
            progress: 0,
        };
        let created: Goal = client
            .request_with_body(Endpoint::CreateGoal, &input, &[])
            .await
            .unwrap();
        assert_eq!(created, input);

        let sent = client.transport().last_sent();
        let echoed: Goal = serde_json::from_slice(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(echoed, input);
    }

    #[tokio::test]
    async fn request_envelope_returns_raw_envelope() {
        let client = client(FakeTransport::replying(
            200,
            r#"{"success":true,"data":[],"message":"nothing yet"}"#,
        ));
        let envelope: Envelope<Vec<Goal>> = client
            .request_envelope(Endpoint::ListGoals, NO_BODY, &[])
            .await
            .unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data, Some(Vec::new()));
        assert_eq!(envelope.message.as_deref(), Some("nothing yet"));
    }

    #[tokio::test]
    async fn request_void_discards_payload() {
        let transport = FakeTransport::default();
        transport.push(200, r#"{"success":true,"data":{"deleted":true}}"#);
        transport.push(204, "");
        let client = client(transport);

        client
            .request_void(Endpoint::DeleteGoal(Uuid::nil()), NO_BODY, &[])
            .await
            .unwrap();
        client
            .request_void(Endpoint::DeleteGoal(Uuid::nil()), NO_BODY, &[])
            .await
            .unwrap();
        assert_eq!(client.transport().last_sent().method, HttpMethod::Delete);
    }

    #[tokio::test]
    async fn upload_decodes_payload() {
        let client = client(FakeTransport::replying(
            200,
            r#"{"success":true,"data":{"title":"with photo","progress":100}}"#,
        ));
        let form = MultipartForm::new().file(FilePart::new("a.jpg", "image/jpeg", vec![9; 16]));
        let goal: Goal = client
            .upload_multipart(Endpoint::UploadPetPhoto(Uuid::nil()), &form)
            .await
            .unwrap();
        assert_eq!(goal.progress, 100);
    }

    #[test]
    fn debug_hides_credentials() {
        let rendered = format!("{:?}", client(FakeTransport::default()));
        assert!(rendered.contains("api.example.com"));
        assert!(!rendered.contains("secret"));
    }
}
