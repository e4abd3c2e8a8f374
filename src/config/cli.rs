use crate::config::settings::Overrides;
use crate::core::content::ContentSource;
use crate::core::runner::{ApiCommand, CreateRequest};
use crate::domain::model::{ContentFilter, NotificationKind};
use crate::utils::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "typefully")]
#[command(version, about = "Command-line interface for Typefully API")]
pub struct Cli {
    /// Typefully API key (overrides TYPEFULLY_API_KEY and the settings file)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Path to the settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a draft, optionally scheduled
    Create(CreateArgs),

    /// List recently scheduled drafts
    Scheduled(ListArgs),

    /// List recently published posts
    Published(ListArgs),

    /// List notifications
    Notifications(NotificationArgs),

    /// Mark all notifications as read
    MarkRead(MarkReadArgs),

    /// Manage the API key
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Manage the settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Tweet texts; each one becomes a tweet of the thread
    #[arg(value_name = "TEXT", conflicts_with = "file")]
    pub text: Vec<String>,

    /// Read the draft from a file ('-' for stdin)
    #[arg(short, long)]
    pub file: Option<String>,

    /// Let Typefully split long text into a thread
    #[arg(long, overrides_with = "no_threadify")]
    pub threadify: bool,

    #[arg(long, hide = true)]
    pub no_threadify: bool,

    /// Create a public share URL
    #[arg(long, overrides_with = "no_share")]
    pub share: bool,

    #[arg(long, hide = true)]
    pub no_share: bool,

    /// next-free-slot, an RFC 3339 timestamp, 'YYYY-MM-DD HH:MM' or +30m/+2h/+1d
    #[arg(short, long)]
    pub schedule: Option<String>,

    /// Enable AutoRT for the draft
    #[arg(long, overrides_with = "no_auto_retweet")]
    pub auto_retweet: bool,

    #[arg(long, hide = true)]
    pub no_auto_retweet: bool,

    /// Enable AutoPlug for the draft
    #[arg(long, overrides_with = "no_auto_plug")]
    pub auto_plug: bool,

    #[arg(long, hide = true)]
    pub no_auto_plug: bool,

    /// Show the request without sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only threads or only single tweets
    #[arg(long, value_enum)]
    pub filter: Option<ContentFilter>,

    /// Show at most this many entries
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct NotificationArgs {
    #[arg(long, value_enum)]
    pub kind: Option<NotificationKind>,

    /// Show at most this many entries
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct MarkReadArgs {
    #[arg(long, value_enum)]
    pub kind: Option<NotificationKind>,

    /// Account to mark notifications for
    #[arg(long)]
    pub username: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Save an API key to the settings file
    Login {
        #[arg(long)]
        key: String,
    },
    /// Show which API key is in use
    Status {
        /// Check the key against the API
        #[arg(long)]
        verify: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a commented settings file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Show the effective settings
    Show,
    /// Print the settings file location
    Path,
}

/// Commands answered without calling the API.
#[derive(Debug)]
pub enum LocalCommand {
    Auth(AuthCommand),
    Config(ConfigCommand),
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            format: self.format,
        }
    }
}

fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl From<CreateArgs> for CreateRequest {
    fn from(args: CreateArgs) -> Self {
        let source = match args.file {
            Some(path) => ContentSource::File(path),
            None => ContentSource::Parts(args.text),
        };

        CreateRequest {
            source,
            threadify: flag(args.threadify, args.no_threadify),
            share: flag(args.share, args.no_share),
            schedule: args.schedule,
            auto_retweet: flag(args.auto_retweet, args.no_auto_retweet),
            auto_plug: flag(args.auto_plug, args.no_auto_plug),
            dry_run: args.dry_run,
        }
    }
}

impl Command {
    /// Splits off the commands that need the API; auth and config commands are handed back.
    pub fn into_api_command(self) -> Result<ApiCommand, LocalCommand> {
        match self {
            Command::Create(args) => Ok(ApiCommand::Create(args.into())),
            Command::Scheduled(args) => Ok(ApiCommand::Scheduled {
                filter: args.filter,
                limit: args.limit,
            }),
            Command::Published(args) => Ok(ApiCommand::Published {
                filter: args.filter,
                limit: args.limit,
            }),
            Command::Notifications(args) => Ok(ApiCommand::Notifications {
                kind: args.kind,
                limit: args.limit,
            }),
            Command::MarkRead(args) => Ok(ApiCommand::MarkRead {
                kind: args.kind,
                username: args.username,
            }),
            Command::Auth(auth) => Err(LocalCommand::Auth(auth)),
            Command::Config(config) => Err(LocalCommand::Config(config)),
        }
    }
}
