use crate::config::toml_config::DraftDefaults;
use crate::core::content::{oversized_tweets, read_content, ContentSource, TWEET_CHAR_LIMIT};
use crate::core::schedule::parse_schedule;
use crate::domain::model::{ContentFilter, NewDraft, NotificationKind};
use crate::domain::ports::TypefullyApi;
use crate::utils::error::Result;
use crate::utils::output::{
    render_created_draft, render_draft_request, render_drafts, render_message,
    render_notifications, OutputFormat,
};
use chrono::{DateTime, Utc};

/// Draft options as given on the command line; `None` falls back to the settings defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub source: ContentSource,
    pub threadify: Option<bool>,
    pub share: Option<bool>,
    pub schedule: Option<String>,
    pub auto_retweet: Option<bool>,
    pub auto_plug: Option<bool>,
    pub dry_run: bool,
}

/// Commands that talk to the Typefully API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCommand {
    Create(CreateRequest),
    Scheduled {
        filter: Option<ContentFilter>,
        limit: Option<usize>,
    },
    Published {
        filter: Option<ContentFilter>,
        limit: Option<usize>,
    },
    Notifications {
        kind: Option<NotificationKind>,
        limit: Option<usize>,
    },
    MarkRead {
        kind: Option<NotificationKind>,
        username: Option<String>,
    },
}

pub struct CommandRunner<A: TypefullyApi> {
    api: A,
    format: OutputFormat,
    defaults: DraftDefaults,
}

impl<A: TypefullyApi> CommandRunner<A> {
    pub fn new(api: A, format: OutputFormat, defaults: DraftDefaults) -> Self {
        Self {
            api,
            format,
            defaults,
        }
    }

    /// Runs `command` and returns what should be printed on stdout.
    pub async fn run(&self, command: ApiCommand) -> Result<String> {
        self.run_at(command, Utc::now()).await
    }

    pub(crate) async fn run_at(&self, command: ApiCommand, now: DateTime<Utc>) -> Result<String> {
        match command {
            ApiCommand::Create(request) => self.create(request, now).await,
            ApiCommand::Scheduled { filter, limit } => {
                let drafts = self.api.recently_scheduled(filter).await?;
                render_drafts(&apply_limit(drafts, limit), self.format)
            }
            ApiCommand::Published { filter, limit } => {
                let drafts = self.api.recently_published(filter).await?;
                render_drafts(&apply_limit(drafts, limit), self.format)
            }
            ApiCommand::Notifications { kind, limit } => {
                let notifications = self.api.notifications(kind).await?;
                render_notifications(&apply_limit(notifications, limit), self.format)
            }
            ApiCommand::MarkRead { kind, username } => {
                self.api
                    .mark_notifications_read(kind, username.as_deref())
                    .await?;
                let scope = kind.map(|k| k.as_str()).unwrap_or("all");
                render_message(
                    &format!("Marked {} notifications as read", scope),
                    self.format,
                )
            }
        }
    }

    /// Builds the request body from flags and defaults.
    pub fn build_draft(&self, request: &CreateRequest, now: DateTime<Utc>) -> Result<NewDraft> {
        let content = read_content(&request.source)?;
        let threadify = request.threadify.unwrap_or(self.defaults.threadify);

        if !threadify {
            let oversized = oversized_tweets(&content, TWEET_CHAR_LIMIT);
            if !oversized.is_empty() {
                let positions: Vec<String> = oversized.iter().map(|i| (i + 1).to_string()).collect();
                tracing::warn!(
                    "Tweet(s) {} exceed {} characters; pass --threadify to let Typefully split them",
                    positions.join(", "),
                    TWEET_CHAR_LIMIT
                );
            }
        }

        let schedule_date = request
            .schedule
            .as_deref()
            .map(|s| parse_schedule(s, now))
            .transpose()?;

        Ok(NewDraft {
            content,
            threadify: Some(threadify),
            share: Some(request.share.unwrap_or(self.defaults.share)),
            schedule_date,
            auto_retweet_enabled: Some(request.auto_retweet.unwrap_or(self.defaults.auto_retweet)),
            auto_plug_enabled: Some(request.auto_plug.unwrap_or(self.defaults.auto_plug)),
        })
    }

    async fn create(&self, request: CreateRequest, now: DateTime<Utc>) -> Result<String> {
        let draft = self.build_draft(&request, now)?;

        if request.dry_run {
            tracing::info!("Dry run, not sending the draft");
            return render_draft_request(&draft, self.format);
        }

        if let Some(date) = &draft.schedule_date {
            tracing::info!("Scheduling draft for {}", date);
        }
        let created = self.api.create_draft(&draft).await?;
        render_created_draft(&created, self.format)
    }
}

fn apply_limit<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}
