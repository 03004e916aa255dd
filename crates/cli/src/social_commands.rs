use std::path::{Path, PathBuf};

use {
    anyhow::{Result, bail},
    clap::Args,
    plaza_client::{AppContext, ProfileUpdate, Theme, User, build_thread, upload},
};

use crate::render;

#[derive(Args)]
pub struct ProfileUpdateArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    /// Hide posts from everyone but you.
    #[arg(long, conflicts_with = "public")]
    private: bool,
    #[arg(long)]
    public: bool,
    /// New avatar image (jpg, png, gif, webp).
    #[arg(long)]
    avatar: Option<PathBuf>,
}

impl ProfileUpdateArgs {
    fn visibility(&self) -> Option<bool> {
        match (self.private, self.public) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// The signed-in user, or an error telling the caller to sign in.
pub(crate) fn require_user(ctx: &AppContext) -> Result<User> {
    match ctx.session.user() {
        Some(user) => Ok(user),
        None => bail!("not signed in (run `plaza auth login`)"),
    }
}

pub async fn feed(ctx: &AppContext, page: u32) -> Result<()> {
    let posts = ctx.api.posts(page).await?;
    if posts.is_empty() {
        println!("No posts on page {page}.");
    }
    for post in &posts {
        println!("{}\n", render::post(post));
    }
    Ok(())
}

pub async fn post(ctx: &AppContext, text: &str, image: Option<&Path>) -> Result<()> {
    require_user(ctx)?;
    let text = text.trim();
    if text.is_empty() && image.is_none() {
        bail!("a post needs text or an image");
    }

    let image_url = match image {
        Some(path) => {
            let encoded = upload::encode_image_file(path)?;
            Some(ctx.api.upload_image(&encoded).await?.url)
        },
        None => None,
    };
    let created = ctx.api.create_post(text, image_url.as_deref()).await?;
    println!("Posted (id:{}).", created.id);
    Ok(())
}

pub async fn like(ctx: &AppContext, post_id: &str) -> Result<()> {
    require_user(ctx)?;
    let state = ctx.api.toggle_like(post_id).await?;
    let verb = if state.liked { "Liked" } else { "Unliked" };
    println!("{verb} ({} likes).", state.count);
    Ok(())
}

pub async fn comments(ctx: &AppContext, post_id: &str) -> Result<()> {
    let comments = ctx.load_comments(post_id).await;
    if comments.is_empty() {
        println!("No comments.");
        return Ok(());
    }
    println!("{}", render::thread(&build_thread(&comments)));
    Ok(())
}

pub async fn comment(
    ctx: &AppContext,
    post_id: &str,
    text: &str,
    reply_to: Option<&str>,
) -> Result<()> {
    require_user(ctx)?;
    match ctx.submit_comment(post_id, text, reply_to).await? {
        Some(comments) => println!("{}", render::thread(&build_thread(&comments))),
        None => bail!("comment is empty"),
    }
    Ok(())
}

pub async fn profile(ctx: &AppContext, username: &str) -> Result<()> {
    let page = ctx.api.profile(username.trim_start_matches('@')).await?;
    println!("{}", render::profile(&page));
    Ok(())
}

pub async fn profile_update(ctx: &AppContext, args: ProfileUpdateArgs) -> Result<()> {
    require_user(ctx)?;
    let mut update = ProfileUpdate {
        display_name: args.name.clone(),
        bio: args.bio.clone(),
        is_private: args.visibility(),
        avatar_url: None,
    };
    if let Some(path) = &args.avatar {
        let encoded = upload::encode_image_file(path)?;
        update.avatar_url = Some(ctx.api.upload_avatar(&encoded).await?.url);
    }
    if update.is_empty() {
        bail!("nothing to update");
    }

    ctx.api.update_profile(&update).await?;
    // Pick up the new profile in the cached identity.
    ctx.session.refresh().await;
    println!("Profile updated.");
    Ok(())
}

pub async fn search(ctx: &AppContext, query: &str) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(());
    }
    let users = ctx.api.search_users(query).await?;
    if users.is_empty() {
        println!("No users match \"{query}\".");
    }
    for u in &users {
        println!("{}", render::user_summary(u));
    }
    Ok(())
}

pub async fn notifications(ctx: &AppContext) -> Result<()> {
    require_user(ctx)?;
    let notifications = ctx.open_notifications().await;
    if notifications.is_empty() {
        println!("No notifications.");
    }
    for n in &notifications {
        println!("{}", render::notification(n));
    }
    Ok(())
}

pub fn theme(ctx: &AppContext, name: Option<Theme>) -> Result<()> {
    match name {
        Some(theme) => {
            ctx.theme.set(theme)?;
            println!("Theme set to {} ({}).", theme.label(), theme.accent());
        },
        None => {
            let current = ctx.theme.get();
            for theme in Theme::ALL {
                let marker = if theme == current { "*" } else { " " };
                println!("{marker} {:<8} {}", theme.id(), theme.label());
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, clap::Parser};

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ProfileUpdateArgs,
    }

    #[test]
    fn visibility_flags() {
        let parse = |argv: &[&str]| Harness::try_parse_from(argv).map(|h| h.args.visibility());
        assert_eq!(parse(&["t"]).unwrap(), None);
        assert_eq!(parse(&["t", "--private"]).unwrap(), Some(true));
        assert_eq!(parse(&["t", "--public"]).unwrap(), Some(false));
        assert!(parse(&["t", "--private", "--public"]).is_err());
    }
}
