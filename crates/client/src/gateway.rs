//! Transport for every API call.
//!
//! The server exposes a single endpoint; the logical method travels in the
//! `route` query parameter. Each call is sent once: no retry, no backoff and
//! no timeout.

use std::sync::Arc;

use {
    reqwest::{Client, Method, header::CONTENT_TYPE},
    secrecy::ExposeSecret,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    tracing::{debug, trace},
    url::Url,
};

use crate::credentials::TokenStore;

/// Message used when a failure response carries no `error` field.
pub const FALLBACK_ERROR_MESSAGE: &str = "server error";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("malformed response for {route}: {source}")]
    Protocol {
        route: String,
        #[source]
        source: serde_json::Error,
    },

    /// The server rejected the call. Displays as the server's message.
    #[error("{message}")]
    Domain { status: u16, message: String },

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    /// HTTP status of a rejected call.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Domain { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The server refused the call for lack of valid credentials.
    pub fn is_unauthenticated(&self) -> bool {
        self.status() == Some(401)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// One outbound call: route, verb, optional JSON body and extra query pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub route: String,
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            method,
            body: None,
            query: Vec::new(),
        }
    }

    pub fn get(route: impl Into<String>) -> Self {
        Self::new(Method::GET, route)
    }

    pub fn post(route: impl Into<String>) -> Self {
        Self::new(Method::POST, route)
    }

    /// Add a query parameter. A later value for the same name wins.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body).map_err(ApiError::Encode)?);
        Ok(self)
    }

    /// Final query string pairs, `route` first. Names repeated later replace
    /// earlier values in place.
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = vec![("route", self.route.as_str())];
        for (name, value) in &self.query {
            match pairs.iter_mut().find(|(n, _)| *n == name.as_str()) {
                Some(existing) => existing.1 = value.as_str(),
                None => pairs.push((name.as_str(), value.as_str())),
            }
        }
        pairs
    }
}

/// Sends [`ApiRequest`]s with the stored bearer token attached.
pub struct ApiGateway {
    client: Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for ApiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiGateway")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl ApiGateway {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: Client::new(),
            base_url: Url::parse(base_url)?,
            tokens,
        })
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, ...).
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The token store consulted on every call.
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Absolute URL for `request`.
    pub fn url_for(&self, request: &ApiRequest) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        url
    }

    /// Send `request` and decode a successful body as `T`.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let url = self.url_for(&request);
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, "application/json");

        let token = self.tokens.get();
        if let Some(token) = &token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(
            route = %request.route,
            method = %request.method,
            authenticated = token.is_some(),
            "api request"
        );

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        trace!(route = %request.route, status = status.as_u16(), len = bytes.len(), "api response");

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());
            debug!(route = %request.route, status = status.as_u16(), %message, "api request rejected");
            return Err(ApiError::Domain {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|source| ApiError::Protocol {
            route: request.route,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            credentials::StoredToken,
            storage::{MemoryStorage, TOKEN_KEY},
        },
        mockito::Matcher,
        serde_json::{Value, json},
    };

    fn gateway(url: &str, token: Option<&str>) -> ApiGateway {
        let storage = match token {
            Some(t) => MemoryStorage::with_entries([(TOKEN_KEY, t)]),
            None => MemoryStorage::new(),
        };
        ApiGateway::new(url, Arc::new(StoredToken::new(Arc::new(storage)))).unwrap()
    }

    fn route(r: &str) -> Matcher {
        Matcher::UrlEncoded("route".into(), r.into())
    }

    #[test]
    fn query_pairs_start_with_route_and_replace_duplicates() {
        let req = ApiRequest::get("/posts")
            .query("page", "1")
            .query("page", "2")
            .query("route", "/other");
        assert_eq!(req.query_pairs(), vec![("route", "/other"), ("page", "2")]);
    }

    #[test]
    fn url_keeps_base_and_encodes_values() {
        let gw = gateway("https://api.example/fn", None);
        let url = gw.url_for(&ApiRequest::get("/search").query("q", "a b&c"));
        assert_eq!(url.path(), "/fn");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![
            ("route".to_string(), "/search".to_string()),
            ("q".to_string(), "a b&c".to_string()),
        ]);
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_held() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(route("/auth/me"))
            .match_header("authorization", "Bearer T1")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let gw = gateway(&server.url(), Some("T1"));
        let _: Value = gw.call(ApiRequest::get("/auth/me")).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn omits_authorization_without_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(route("/posts"))
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"posts":[]}"#)
            .create_async()
            .await;

        let gw = gateway(&server.url(), None);
        let _: Value = gw.call(ApiRequest::get("/posts")).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sends_json_body_and_query_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_query(Matcher::AllOf(vec![
                route("/comments"),
                Matcher::UrlEncoded("extra".into(), "1".into()),
            ]))
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"post_id": "p1", "content": "hi"})))
            .with_status(200)
            .with_body(r#"{"id":"c9"}"#)
            .create_async()
            .await;

        let gw = gateway(&server.url(), None);
        let req = ApiRequest::post("/comments")
            .query("extra", "1")
            .json(&json!({"post_id": "p1", "content": "hi"}))
            .unwrap();
        let created: Value = gw.call(req).await.unwrap();
        assert_eq!(created["id"], "c9");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failure_carries_server_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_query(route("/posts"))
            .with_status(400)
            .with_body(r#"{"error":"X"}"#)
            .create_async()
            .await;

        let gw = gateway(&server.url(), Some("T1"));
        let err = gw
            .call::<Value>(ApiRequest::post("/posts"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "X");
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_unauthenticated());
    }

    #[tokio::test]
    async fn failure_without_message_uses_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(route("/notifications"))
            .with_status(500)
            .with_body(r#"{"detail":"boom"}"#)
            .create_async()
            .await;

        let gw = gateway(&server.url(), None);
        let err = gw
            .call::<Value>(ApiRequest::get("/notifications"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), FALLBACK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn non_json_failure_uses_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(route("/posts"))
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let gw = gateway(&server.url(), None);
        let err = gw.call::<Value>(ApiRequest::get("/posts")).await.unwrap_err();
        assert!(matches!(err, ApiError::Domain { status: 502, .. }));
        assert_eq!(err.to_string(), FALLBACK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn unparseable_success_is_protocol_failure() {
        #[derive(Debug, Deserialize)]
        struct Expected {
            #[allow(dead_code)]
            posts: Vec<Value>,
        }

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(route("/posts"))
            .with_status(200)
            .with_body(r#"{"items":[]}"#)
            .create_async()
            .await;

        let gw = gateway(&server.url(), None);
        let err = gw
            .call::<Expected>(ApiRequest::get("/posts"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Protocol { ref route, .. } if route == "/posts"));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_failure() {
        let url = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };

        let gw = gateway(&url, None);
        let err = gw.call::<Value>(ApiRequest::get("/posts")).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[test]
    fn rejects_invalid_base_url() {
        let tokens = Arc::new(StoredToken::new(Arc::new(MemoryStorage::new())));
        assert!(ApiGateway::new("not a url", tokens).is_err());
    }
}
