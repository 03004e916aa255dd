use {
    anyhow::Result,
    clap::Subcommand,
    plaza_client::{AppContext, SessionState},
};

use crate::render;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PLAZA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PLAZA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token.
    Logout,
    /// Show who is signed in.
    Whoami,
}

pub async fn handle_auth(ctx: &AppContext, action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Login { email, password } => {
            let user = ctx.session.login(&email, &password).await?;
            println!("Signed in as {}", render::handle(&user.username, user.is_verified));
            Ok(())
        },
        AuthAction::Register {
            username,
            email,
            password,
        } => {
            let user = ctx.session.register(&username, &email, &password).await?;
            println!("Welcome, {}", render::handle(&user.username, user.is_verified));
            Ok(())
        },
        AuthAction::Logout => {
            ctx.session.logout();
            println!("Signed out.");
            Ok(())
        },
        AuthAction::Whoami => whoami(ctx).await,
    }
}

async fn whoami(ctx: &AppContext) -> Result<()> {
    ctx.session.start().await;
    match ctx.session.wait_settled().await {
        SessionState::Authenticated(user) => {
            println!("{}", render::user(&user));
        },
        _ => println!("Not signed in."),
    }
    Ok(())
}
