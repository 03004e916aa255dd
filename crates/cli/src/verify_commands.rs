use {
    anyhow::{Result, bail},
    clap::Subcommand,
    plaza_client::{AppContext, ReviewAction},
};

use crate::{render, social_commands::require_user};

#[derive(Subcommand)]
pub enum VerifyAction {
    /// Ask for a verified badge.
    Request { reason: String },
    /// List pending requests (administrators).
    List,
    /// Approve or reject a request (administrators).
    Review { id: String, action: ReviewAction },
}

pub async fn handle_verify(ctx: &AppContext, action: VerifyAction) -> Result<()> {
    let user = require_user(ctx)?;
    match action {
        VerifyAction::Request { reason } => {
            if user.is_verified {
                println!("Already verified.");
                return Ok(());
            }
            let reason = reason.trim();
            if reason.is_empty() {
                bail!("a reason is required");
            }
            let created = ctx.api.request_verification(reason).await?;
            println!("Request submitted (id:{}).", created.id);
        },
        VerifyAction::List => {
            let requests = ctx.api.verification_requests().await?;
            if requests.is_empty() {
                println!("No pending requests.");
            }
            for r in &requests {
                println!("{}", render::verification_request(r));
            }
        },
        VerifyAction::Review { id, action } => {
            ctx.api.review_verification(&id, action).await?;
            println!("Request {id}: {action}.");
        },
    }
    Ok(())
}
