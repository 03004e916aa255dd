//! Client core for the Plaza social network.
//!
//! [`ApiGateway`] turns every domain operation into one authenticated HTTP
//! call; [`SessionStore`] owns the signed-in identity and keeps it consistent
//! with the persisted token. [`AppContext`] wires both together.

pub mod api;
pub mod context;
pub mod credentials;
pub mod gateway;
pub mod report;
pub mod session;
pub mod storage;
pub mod theme;
pub mod thread;
pub mod types;
pub mod upload;

pub use {
    context::AppContext,
    credentials::{StoredToken, TokenStore},
    gateway::{ApiError, ApiGateway, ApiRequest, FALLBACK_ERROR_MESSAGE},
    report::{ErrorReporter, RecordingReporter, TracingReporter},
    session::{SessionError, SessionState, SessionStore},
    storage::{FileStorage, MemoryStorage, Storage},
    theme::{Theme, ThemePreference},
    thread::{CommentNode, build_thread},
    types::{
        Ack, AuthResponse, Comment, Created, LikeState, Notification, Post, Profile, ProfilePage,
        ProfileUpdate, ReviewAction, Upload, User, UserSummary, VerificationRequest,
    },
};
