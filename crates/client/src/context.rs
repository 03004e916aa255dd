//! Everything a front end needs, built once at process start and passed
//! around explicitly.

use std::sync::Arc;

use {
    anyhow::Context,
    plaza_config::PlazaConfig,
    tracing::debug,
};

use crate::{
    credentials::StoredToken,
    gateway::{ApiError, ApiGateway},
    report::{ErrorReporter, TracingReporter},
    session::SessionStore,
    storage::{FileStorage, Storage},
    theme::ThemePreference,
    types::{Comment, Notification},
};

pub struct AppContext {
    pub api: Arc<ApiGateway>,
    pub session: Arc<SessionStore>,
    pub theme: ThemePreference,
    reporter: Arc<dyn ErrorReporter>,
}

impl AppContext {
    /// Wire the gateway, session store and theme preference over `storage`.
    pub fn new(base_url: &str, storage: Arc<dyn Storage>) -> anyhow::Result<Self> {
        let tokens = Arc::new(StoredToken::new(Arc::clone(&storage)));
        let api = Arc::new(
            ApiGateway::new(base_url, tokens)
                .with_context(|| format!("invalid API base URL: {base_url}"))?,
        );
        Ok(Self {
            session: Arc::new(SessionStore::new(Arc::clone(&api))),
            api,
            theme: ThemePreference::new(storage),
            reporter: Arc::new(TracingReporter),
        })
    }

    /// Context backed by the on-disk storage named in `config`.
    pub fn from_config(config: &PlazaConfig) -> anyhow::Result<Self> {
        let storage = FileStorage::from_config(config);
        debug!(
            base_url = %config.api.base_url,
            storage = %storage.path().display(),
            "building client context"
        );
        Self::new(&config.api.base_url, Arc::new(storage))
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Comments on `post_id`; a failure is reported and yields an empty list.
    pub async fn load_comments(&self, post_id: &str) -> Vec<Comment> {
        match self.api.comments(post_id).await {
            Ok(comments) => comments,
            Err(e) => {
                self.reporter.report("load comments", &e);
                Vec::new()
            },
        }
    }

    /// Post a comment (or a reply when `parent_id` is set), then reload the
    /// thread.
    ///
    /// Returns `Ok(None)` without sending anything when `text` is blank. A
    /// failed reload is reported and yields an empty list.
    pub async fn submit_comment(
        &self,
        post_id: &str,
        text: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<Vec<Comment>>, ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        self.api.add_comment(post_id, text, parent_id).await?;
        Ok(Some(self.load_comments(post_id).await))
    }

    /// Fetch notifications and mark them read.
    ///
    /// Both steps are best effort: failures are reported, a failed fetch
    /// yields an empty list and skips marking.
    pub async fn open_notifications(&self) -> Vec<Notification> {
        let notifications = match self.api.notifications().await {
            Ok(n) => n,
            Err(e) => {
                self.reporter.report("load notifications", &e);
                return Vec::new();
            },
        };
        if let Err(e) = self.api.mark_notifications_read().await {
            self.reporter.report("mark notifications read", &e);
        }
        notifications
    }
}
