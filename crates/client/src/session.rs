//! Who is using this client right now.
//!
//! `Uninitialized → Loading → {Authenticated, Anonymous}`. The two terminal
//! states return to `Loading` only through [`SessionStore::refresh`]. Writes
//! are last-write-wins; concurrent calls converge on a terminal state.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use {
    secrecy::ExposeSecret,
    tokio::sync::watch,
    tracing::{debug, info, warn},
};

use crate::{
    credentials::TokenStore,
    gateway::{ApiError, ApiGateway},
    types::{AuthResponse, User},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// `start()` has not run yet.
    Uninitialized,
    /// An identity check is in flight; the outcome is unknown.
    Loading,
    Authenticated(User),
    Anonymous,
}

impl SessionState {
    /// Whether identity-dependent output may be rendered.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Authenticated(_) | Self::Anonymous)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Single source of truth for the current identity and its token.
pub struct SessionStore {
    api: Arc<ApiGateway>,
    tokens: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
    started: AtomicBool,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl SessionStore {
    /// The store shares the gateway's token store.
    pub fn new(api: Arc<ApiGateway>) -> Self {
        let tokens = Arc::clone(api.tokens());
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            api,
            tokens,
            state,
            started: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn is_settled(&self) -> bool {
        self.state.borrow().is_settled()
    }

    /// Observe every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Suspend until the state is `Authenticated` or `Anonymous`.
    ///
    /// Never resolves if `start()` is never called.
    pub async fn wait_settled(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        let settled = rx
            .wait_for(SessionState::is_settled)
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    /// Startup sequence, effective once per store. With a stored token this
    /// is [`refresh`](Self::refresh); without one the store settles as
    /// `Anonymous` with no network call. Later calls return the current state.
    pub async fn start(&self) -> SessionState {
        if self.started.swap(true, Ordering::SeqCst) {
            return self.state();
        }
        if self.tokens.get().is_none() {
            debug!("no stored token, starting anonymous");
            return self.set(SessionState::Anonymous);
        }
        self.refresh().await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let resp = self.api.login(email, password).await?;
        self.establish(resp)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, SessionError> {
        let resp = self.api.register(username, email, password).await?;
        self.establish(resp)
    }

    /// Drop the token and identity. Never fails.
    pub fn logout(&self) {
        self.purge();
        info!("signed out");
    }

    /// Re-check the stored token against the server.
    ///
    /// Any failure deletes the token and leaves the store `Anonymous`; this is
    /// the only place an expired or revoked token is noticed.
    pub async fn refresh(&self) -> SessionState {
        if self.tokens.get().is_none() {
            return self.set(SessionState::Anonymous);
        }

        self.set(SessionState::Loading);
        match self.api.me().await {
            Ok(user) => {
                debug!(user = %user.username, "identity confirmed");
                self.set(SessionState::Authenticated(user))
            },
            Err(e) => {
                warn!(error = %e, "identity check failed, clearing session");
                self.purge()
            },
        }
    }

    fn establish(&self, resp: AuthResponse) -> Result<User, SessionError> {
        self.tokens.set(resp.token.expose_secret())?;
        let user = resp.user;
        info!(user = %user.username, "signed in");
        self.set(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    fn purge(&self) -> SessionState {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "failed to delete stored token");
        }
        self.set(SessionState::Anonymous)
    }

    fn set(&self, state: SessionState) -> SessionState {
        self.state.send_replace(state.clone());
        state
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            api::routes,
            credentials::StoredToken,
            storage::{MemoryStorage, Storage, TOKEN_KEY},
        },
        mockito::{Matcher, Server},
    };

    const USER_JSON: &str = r#"{"id":"1","username":"a","display_name":"A","bio":"",
        "avatar_url":"","is_private":false,"is_verified":false,"is_admin":false}"#;

    fn store(server: &Server, storage: Arc<MemoryStorage>) -> SessionStore {
        let tokens = Arc::new(StoredToken::new(storage));
        SessionStore::new(Arc::new(ApiGateway::new(&server.url(), tokens).unwrap()))
    }

    fn route(r: &str) -> Matcher {
        Matcher::UrlEncoded("route".into(), r.into())
    }

    #[test]
    fn settled_states() {
        assert!(!SessionState::Uninitialized.is_settled());
        assert!(!SessionState::Loading.is_settled());
        assert!(SessionState::Anonymous.is_settled());
        assert!(SessionState::Anonymous.user().is_none());
    }

    #[tokio::test]
    async fn start_without_token_skips_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let session = store(&server, Arc::new(MemoryStorage::new()));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(session.start().await, SessionState::Anonymous);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn start_with_valid_token_authenticates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(route(routes::ME))
            .match_header("authorization", "Bearer T1")
            .with_status(200)
            .with_body(format!(r#"{{"user":{USER_JSON}}}"#))
            .expect(1)
            .create_async()
            .await;

        let storage = Arc::new(MemoryStorage::with_entries([(TOKEN_KEY, "T1")]));
        let session = store(&server, storage);

        let state = session.start().await;
        assert_eq!(state.user().map(|u| u.id.as_str()), Some("1"));

        // Second start is a no-op.
        assert_eq!(session.start().await, state);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn refresh_with_invalid_token_purges_it() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(route(routes::ME))
            .with_status(401)
            .with_body(r#"{"error":"not authorized"}"#)
            .expect(1)
            .create_async()
            .await;

        let storage = Arc::new(MemoryStorage::with_entries([(TOKEN_KEY, "stale")]));
        let session = store(&server, storage.clone());

        assert_eq!(session.refresh().await, SessionState::Anonymous);
        assert!(storage.get(TOKEN_KEY).is_none());

        // No token left: same state, no second request.
        assert_eq!(session.refresh().await, SessionState::Anonymous);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_login_leaves_state_untouched() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .match_query(route(routes::LOGIN))
            .with_status(401)
            .with_body(r#"{"error":"invalid email or password"}"#)
            .create_async()
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let session = store(&server, storage.clone());
        session.start().await;

        let err = session.login("a@b.com", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "invalid email or password");
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(storage.get(TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let storage = Arc::new(MemoryStorage::with_entries([(TOKEN_KEY, "T1")]));
        let server = Server::new_async().await;
        let session = store(&server, storage.clone());

        session.logout();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(storage.get(TOKEN_KEY).is_none());

        // Idempotent.
        session.logout();
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn wait_settled_returns_immediately_when_settled() {
        let server = Server::new_async().await;
        let session = store(&server, Arc::new(MemoryStorage::new()));
        session.start().await;
        assert_eq!(session.wait_settled().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn register_establishes_session() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .match_query(route(routes::REGISTER))
            .match_body(Matcher::Json(serde_json::json!({
                "username": "a", "email": "a@b.com", "password": "pw"
            })))
            .with_status(200)
            .with_body(format!(r#"{{"token":"T9","user":{USER_JSON}}}"#))
            .create_async()
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let session = store(&server, storage.clone());

        let user = session.register("a", "a@b.com", "pw").await.unwrap();
        assert_eq!(user.username, "a");
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("T9"));
        assert_eq!(session.state(), SessionState::Authenticated(user));
    }

    #[tokio::test]
    async fn failed_register_keeps_existing_token_and_state() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .match_query(route(routes::REGISTER))
            .with_status(409)
            .with_body(r#"{"error":"taken"}"#)
            .create_async()
            .await;

        let storage = Arc::new(MemoryStorage::with_entries([(TOKEN_KEY, "OLD")]));
        let session = store(&server, storage.clone());

        let err = session.register("a", "a@b.com", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "taken");
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("OLD"));
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn refresh_after_server_error_signs_out() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .match_query(route(routes::REGISTER))
            .with_status(200)
            .with_body(format!(r#"{{"token":"T1","user":{USER_JSON}}}"#))
            .create_async()
            .await;
        let me = server
            .mock("GET", "/")
            .match_query(route(routes::ME))
            .match_header("authorization", "Bearer T1")
            .with_status(500)
            .with_body("internal error")
            .expect(1)
            .create_async()
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let session = store(&server, storage.clone());
        session.register("a", "a@b.com", "pw").await.unwrap();
        assert!(session.user().is_some());

        assert_eq!(session.refresh().await, SessionState::Anonymous);
        assert!(storage.get(TOKEN_KEY).is_none());
        assert!(session.user().is_none());
        me.assert_async().await;
    }

    #[tokio::test]
    async fn refresh_when_server_unreachable_signs_out() {
        let url = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };
        let storage = Arc::new(MemoryStorage::with_entries([(TOKEN_KEY, "T1")]));
        let tokens = Arc::new(StoredToken::new(storage.clone()));
        let session = SessionStore::new(Arc::new(ApiGateway::new(&url, tokens).unwrap()));

        assert_eq!(session.refresh().await, SessionState::Anonymous);
        assert!(storage.get(TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn subscribers_see_loading_while_refresh_is_in_flight() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(route(routes::ME))
            .with_status(200)
            .with_body(format!(r#"{{"user":{USER_JSON}}}"#))
            .create_async()
            .await;

        let storage = Arc::new(MemoryStorage::with_entries([(TOKEN_KEY, "T1")]));
        let session = store(&server, storage);
        let mut rx = session.subscribe();

        let (settled, seen) = tokio::join!(session.refresh(), async {
            rx.changed().await.unwrap();
            rx.borrow_and_update().clone()
        });

        assert_eq!(seen, SessionState::Loading);
        assert!(settled.user().is_some());
        assert_eq!(*rx.borrow_and_update(), settled);
    }
}
