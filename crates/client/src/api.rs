//! Domain operations, each a thin signature over [`ApiGateway::call`].

use serde::{Deserialize, Serialize};

use crate::{
    gateway::{ApiError, ApiGateway, ApiRequest},
    types::{
        Ack, AuthResponse, Comment, Created, LikeState, Notification, Post, ProfilePage,
        ProfileUpdate, ReviewAction, Upload, User, UserSummary, VerificationRequest,
    },
};

/// Route identifiers understood by the server.
pub mod routes {
    pub const LOGIN: &str = "/auth/login";
    pub const REGISTER: &str = "/auth/register";
    pub const ME: &str = "/auth/me";
    pub const POSTS: &str = "/posts";
    pub const LIKES: &str = "/likes";
    pub const COMMENTS: &str = "/comments";
    pub const PROFILE: &str = "/profile";
    pub const PROFILE_UPDATE: &str = "/profile/update";
    pub const SEARCH: &str = "/search";
    pub const VERIFICATION_REQUEST: &str = "/verification/request";
    pub const VERIFICATION_LIST: &str = "/verification/list";
    pub const VERIFICATION_REVIEW: &str = "/verification/review";
    pub const NOTIFICATIONS: &str = "/notifications";
    pub const NOTIFICATIONS_READ: &str = "/notifications/read";
    pub const UPLOAD_AVATAR: &str = "/upload/avatar";
    pub const UPLOAD_IMAGE: &str = "/upload/image";
}

// ── Request bodies ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct Registration<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct NewPost<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
}

#[derive(Serialize)]
struct PostRef<'a> {
    post_id: &'a str,
}

#[derive(Serialize)]
struct NewComment<'a> {
    post_id: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a str>,
}

#[derive(Serialize)]
struct VerificationReason<'a> {
    reason: &'a str,
}

#[derive(Serialize)]
struct Review<'a> {
    request_id: &'a str,
    action: ReviewAction,
}

#[derive(Serialize)]
struct ImagePayload<'a> {
    image: &'a str,
}

// ── Response envelopes ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct PostsEnvelope {
    posts: Vec<Post>,
}

#[derive(Deserialize)]
struct CommentsEnvelope {
    comments: Vec<Comment>,
}

#[derive(Deserialize)]
struct UsersEnvelope {
    users: Vec<UserSummary>,
}

#[derive(Deserialize)]
struct RequestsEnvelope {
    requests: Vec<VerificationRequest>,
}

#[derive(Deserialize)]
struct NotificationsEnvelope {
    notifications: Vec<Notification>,
}

impl ApiGateway {
    /// Exchange credentials for a token and identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let req = ApiRequest::post(routes::LOGIN).json(&Credentials { email, password })?;
        self.call(req).await
    }

    /// Create an account; the server enforces handle and email uniqueness.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let req = ApiRequest::post(routes::REGISTER).json(&Registration {
            username,
            email,
            password,
        })?;
        self.call(req).await
    }

    /// Identity behind the stored token.
    pub async fn me(&self) -> Result<User, ApiError> {
        let env: UserEnvelope = self.call(ApiRequest::get(routes::ME)).await?;
        Ok(env.user)
    }

    /// One page of the public feed, newest first. Pages start at 1.
    pub async fn posts(&self, page: u32) -> Result<Vec<Post>, ApiError> {
        let req = ApiRequest::get(routes::POSTS).query("page", page.to_string());
        let env: PostsEnvelope = self.call(req).await?;
        Ok(env.posts)
    }

    pub async fn create_post(
        &self,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<Created, ApiError> {
        let req = ApiRequest::post(routes::POSTS).json(&NewPost { content, image_url })?;
        self.call(req).await
    }

    pub async fn toggle_like(&self, post_id: &str) -> Result<LikeState, ApiError> {
        let req = ApiRequest::post(routes::LIKES).json(&PostRef { post_id })?;
        self.call(req).await
    }

    /// Every comment on a post as a flat list in creation order.
    pub async fn comments(&self, post_id: &str) -> Result<Vec<Comment>, ApiError> {
        let req = ApiRequest::get(routes::COMMENTS).query("post_id", post_id);
        let env: CommentsEnvelope = self.call(req).await?;
        Ok(env.comments)
    }

    pub async fn add_comment(
        &self,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<Created, ApiError> {
        let req = ApiRequest::post(routes::COMMENTS).json(&NewComment {
            post_id,
            content,
            parent_id,
        })?;
        self.call(req).await
    }

    pub async fn profile(&self, username: &str) -> Result<ProfilePage, ApiError> {
        let req = ApiRequest::get(routes::PROFILE).query("username", username);
        self.call(req).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Ack, ApiError> {
        let req = ApiRequest::post(routes::PROFILE_UPDATE).json(update)?;
        self.call(req).await
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, ApiError> {
        let req = ApiRequest::get(routes::SEARCH).query("q", query);
        let env: UsersEnvelope = self.call(req).await?;
        Ok(env.users)
    }

    pub async fn request_verification(&self, reason: &str) -> Result<Created, ApiError> {
        let req =
            ApiRequest::post(routes::VERIFICATION_REQUEST).json(&VerificationReason { reason })?;
        self.call(req).await
    }

    /// Pending verification requests. Administrators only.
    pub async fn verification_requests(&self) -> Result<Vec<VerificationRequest>, ApiError> {
        let env: RequestsEnvelope = self.call(ApiRequest::get(routes::VERIFICATION_LIST)).await?;
        Ok(env.requests)
    }

    /// Approve or reject a pending request. Administrators only.
    pub async fn review_verification(
        &self,
        request_id: &str,
        action: ReviewAction,
    ) -> Result<Ack, ApiError> {
        let req = ApiRequest::post(routes::VERIFICATION_REVIEW).json(&Review { request_id, action })?;
        self.call(req).await
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let env: NotificationsEnvelope = self.call(ApiRequest::get(routes::NOTIFICATIONS)).await?;
        Ok(env.notifications)
    }

    pub async fn mark_notifications_read(&self) -> Result<Ack, ApiError> {
        self.call(ApiRequest::post(routes::NOTIFICATIONS_READ)).await
    }

    /// Upload an encoded image (see [`crate::upload`]) as the caller's avatar.
    pub async fn upload_avatar(&self, image: &str) -> Result<Upload, ApiError> {
        let req = ApiRequest::post(routes::UPLOAD_AVATAR).json(&ImagePayload { image })?;
        self.call(req).await
    }

    /// Upload an encoded image for use in a post.
    pub async fn upload_image(&self, image: &str) -> Result<Upload, ApiError> {
        let req = ApiRequest::post(routes::UPLOAD_IMAGE).json(&ImagePayload { image })?;
        self.call(req).await
    }
}
