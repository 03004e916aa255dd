//! Plain-text rendering of server objects for the terminal.

use std::fmt::Write;

use plaza_client::{
    CommentNode, Notification, Post, ProfilePage, User, UserSummary, VerificationRequest,
};

const INDENT: &str = "    ";

pub fn handle(username: &str, verified: bool) -> String {
    if verified {
        format!("@{username} ✓")
    } else {
        format!("@{username}")
    }
}

fn name_line(display_name: &str, username: &str, verified: bool) -> String {
    let handle = handle(username, verified);
    if display_name.is_empty() {
        handle
    } else {
        format!("{display_name} ({handle})")
    }
}

pub fn user(user: &User) -> String {
    let mut out = name_line(&user.display_name, &user.username, user.is_verified);
    if let Some(email) = &user.email {
        let _ = write!(out, "\n{email}");
    }
    if !user.bio.is_empty() {
        let _ = write!(out, "\n{}", user.bio);
    }
    let mut flags = Vec::new();
    if user.is_private {
        flags.push("private");
    }
    if user.is_admin {
        flags.push("admin");
    }
    if !flags.is_empty() {
        let _ = write!(out, "\n[{}]", flags.join(", "));
    }
    out
}

pub fn post(post: &Post) -> String {
    let mut out = format!(
        "{}  {}\n{}",
        name_line(&post.display_name, &post.username, post.is_verified),
        post.created_at,
        post.content
    );
    if let Some(url) = post.image_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = write!(out, "\n[image] {url}");
    }
    let heart = if post.liked { "♥" } else { "♡" };
    let _ = write!(
        out,
        "\n{heart} {}  💬 {}  id:{}",
        post.likes_count, post.comments_count, post.id
    );
    out
}

/// Comments indented by reply depth.
pub fn thread(roots: &[CommentNode]) -> String {
    roots
        .iter()
        .flat_map(CommentNode::walk)
        .map(|node| {
            let c = &node.comment;
            let pad = INDENT.repeat(node.depth);
            format!(
                "{pad}{}: {}\n{pad}  id:{}",
                handle(&c.username, c.is_verified),
                c.content,
                c.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn profile(page: &ProfilePage) -> String {
    let p = &page.profile;
    let mut out = name_line(&p.display_name, &p.username, p.is_verified);
    if !p.bio.is_empty() {
        let _ = write!(out, "\n{}", p.bio);
    }
    if let Some(count) = p.posts_count {
        let _ = write!(out, "\n{count} posts");
    }
    if page.is_private_hidden {
        out.push_str("\nThis account is private.");
    } else {
        for post in &page.posts {
            let _ = write!(out, "\n\n{}", self::post(post));
        }
    }
    out
}

pub fn user_summary(u: &UserSummary) -> String {
    name_line(&u.display_name, &u.username, u.is_verified)
}

pub fn notification(n: &Notification) -> String {
    let marker = if n.is_read { " " } else { "•" };
    let from = if n.from_username.is_empty() {
        String::new()
    } else {
        format!("{} ", handle(&n.from_username, n.from_is_verified))
    };
    format!("{marker} [{}] {from}{}", n.kind, n.message)
}

pub fn verification_request(r: &VerificationRequest) -> String {
    format!(
        "{}  {}  id:{}\n{INDENT}{}",
        name_line(&r.display_name, &r.username, false),
        r.status,
        r.id,
        r.reason
    )
}
