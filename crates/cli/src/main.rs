mod auth_commands;
mod render;
mod social_commands;
mod verify_commands;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    plaza_client::{AppContext, SessionState, Theme},
    tracing::{Subscriber, debug, info},
    tracing_subscriber::{
        EnvFilter, fmt, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt,
    },
};

#[derive(Parser)]
#[command(name = "plaza", about = "Plaza: a small social network client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Override the API base URL for this invocation.
    #[arg(long, global = true, env = "PLAZA_API_URL")]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, sign up, sign out.
    Auth {
        #[command(subcommand)]
        action: auth_commands::AuthAction,
    },
    /// Browse the public feed.
    Feed {
        /// Page number, starting at 1.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },
    /// Publish a post.
    Post {
        text: String,
        /// Attach an image (jpg, png, gif, webp).
        #[arg(long)]
        image: Option<std::path::PathBuf>,
    },
    /// Like or unlike a post.
    Like { post_id: String },
    /// Show the comment thread under a post.
    Comments { post_id: String },
    /// Comment on a post, or reply to a comment.
    Comment {
        post_id: String,
        text: String,
        #[arg(long)]
        reply_to: Option<String>,
    },
    /// Show a user's profile and posts.
    Profile { username: String },
    /// Edit your own profile.
    ProfileUpdate(social_commands::ProfileUpdateArgs),
    /// Find users by handle or display name.
    Search { query: String },
    /// Show notifications and mark them read.
    Notifications,
    /// Verification badge requests.
    Verify {
        #[command(subcommand)]
        action: verify_commands::VerifyAction,
    },
    /// Show or change the colour theme.
    Theme { name: Option<Theme> },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Get,
    /// Persist a new API base URL.
    SetUrl { url: String },
}

impl Commands {
    /// Whether the command's output depends on who is signed in.
    fn needs_session(&self) -> bool {
        !matches!(self, Self::Auth { .. } | Self::Theme { .. } | Self::Config { .. })
    }
}

/// Log subscriber writing to `writer`; command output keeps stdout to itself.
fn telemetry<W>(cli: &Cli, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        Box::new(
            registry.with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(writer),
            ),
        )
    } else {
        Box::new(
            registry.with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(writer),
            ),
        )
    }
}

fn init_telemetry(cli: &Cli) {
    telemetry(cli, std::io::stderr).init();
}

fn handle_config(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get => {
            let config = plaza_config::discover_and_load();
            println!("api.base_url = {}", config.api.base_url);
            println!("storage.path = {}", plaza_config::storage_path(&config).display());
        },
        ConfigAction::SetUrl { url } => {
            url::Url::parse(&url).with_context(|| format!("invalid URL: {url}"))?;
            let path = plaza_config::update_config(|c| c.api.base_url = url)?;
            println!("Saved {}", path.display());
        },
    }
    Ok(())
}

fn build_context(cli: &Cli) -> anyhow::Result<AppContext> {
    let mut config = plaza_config::discover_and_load();
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    AppContext::from_config(&config).context("failed to initialise client")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "plaza starting");

    if let Commands::Config { action } = cli.command {
        return handle_config(action);
    }

    let ctx = build_context(&cli)?;
    if cli.command.needs_session() {
        ctx.session.start().await;
        if let SessionState::Authenticated(user) = ctx.session.wait_settled().await {
            info!(user = %user.username, "session restored");
        }
    }

    match cli.command {
        Commands::Auth { action } => auth_commands::handle_auth(&ctx, action).await,
        Commands::Feed { page } => social_commands::feed(&ctx, page).await,
        Commands::Post { text, image } => {
            social_commands::post(&ctx, &text, image.as_deref()).await
        },
        Commands::Like { post_id } => social_commands::like(&ctx, &post_id).await,
        Commands::Comments { post_id } => social_commands::comments(&ctx, &post_id).await,
        Commands::Comment {
            post_id,
            text,
            reply_to,
        } => social_commands::comment(&ctx, &post_id, &text, reply_to.as_deref()).await,
        Commands::Profile { username } => social_commands::profile(&ctx, &username).await,
        Commands::ProfileUpdate(args) => social_commands::profile_update(&ctx, args).await,
        Commands::Search { query } => social_commands::search(&ctx, &query).await,
        Commands::Notifications => social_commands::notifications(&ctx).await,
        Commands::Verify { action } => verify_commands::handle_verify(&ctx, action).await,
        Commands::Theme { name } => social_commands::theme(&ctx, name),
        Commands::Config { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::{Arc, Mutex},
    };

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'w> MakeWriter<'w> for Captured {
        type Writer = Captured;

        fn make_writer(&'w self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn json_logs_go_to_the_given_writer() {
        let cli = Cli::parse_from(["plaza", "--json-logs", "--log-level", "info", "theme"]);
        let out = Captured::default();

        tracing::subscriber::with_default(telemetry(&cli, out.clone()), || {
            info!(page = 2, "fetched feed");
        });

        let raw = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        let line: serde_json::Value = serde_json::from_str(raw.trim()).unwrap();
        assert_eq!(line["fields"]["message"], "fetched feed");
        assert_eq!(line["fields"]["page"], 2);
    }

    #[test]
    fn feed_page_starts_at_one() {
        assert!(Cli::try_parse_from(["plaza", "feed", "--page", "0"]).is_err());
        match Cli::try_parse_from(["plaza", "feed"]).unwrap().command {
            Commands::Feed { page } => assert_eq!(page, 1),
            _ => panic!("expected feed"),
        }
    }
}
