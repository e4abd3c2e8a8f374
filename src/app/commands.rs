use crate::config::cli::{AuthCommand, Cli, Command, ConfigCommand, LocalCommand};
use crate::config::settings::{mask_key, store_api_key, Settings};
use crate::config::toml_config::FileConfig;
use crate::core::client::TypefullyClient;
use crate::core::runner::CommandRunner;
use crate::domain::model::NotificationKind;
use crate::domain::ports::TypefullyApi;
use crate::utils::error::Result;
use crate::utils::logger;
use crate::utils::output::{render_message, OutputFormat};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

/// Entry point of the `typefully` command.
pub async fn cli() -> ExitCode {
    let args = Cli::parse();
    let overrides = args.overrides();

    let path = match args.config.clone() {
        Some(path) => Ok(path),
        None => FileConfig::default_path(),
    };

    let result = match path {
        Ok(path) => match run_settings_file_command(&args.command, &path, overrides.format) {
            Some(result) => {
                logger::init_cli_logger(args.verbose);
                result
            }
            None => {
                let settings = Settings::load(Some(path), overrides);
                if settings.as_ref().map(|s| s.log_json).unwrap_or(false) {
                    logger::init_json_logger(args.verbose);
                } else {
                    logger::init_cli_logger(args.verbose);
                }

                match settings {
                    Ok(settings) => {
                        tracing::debug!(
                            "Using base URL {} (API key from {})",
                            settings.api.base_url,
                            settings.key_source
                        );
                        run(args.command, &settings).await
                    }
                    Err(e) => Err(e),
                }
            }
        },
        Err(e) => {
            logger::init_cli_logger(args.verbose);
            Err(e)
        }
    };

    match result {
        Ok(output) => {
            print!("{}", stdout_text(&output));
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(
                "Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            ExitCode::from(e.severity().exit_code() as u8)
        }
    }
}

/// Runs the commands that only touch the settings file at `path`, without
/// parsing it, so a broken file can still be located, replaced or given a key.
/// Returns `None` for every other command.
pub fn run_settings_file_command(
    command: &Command,
    path: &Path,
    format: Option<OutputFormat>,
) -> Option<Result<String>> {
    let format = format.unwrap_or_default();
    match command {
        Command::Config(ConfigCommand::Init { force }) => Some(init_settings(path, *force, format)),
        Command::Config(ConfigCommand::Path) => Some(Ok(path.display().to_string())),
        Command::Auth(AuthCommand::Login { key }) => Some(login(path, key, format)),
        _ => None,
    }
}

/// Executes one parsed command and returns the text for stdout.
pub async fn run(command: Command, settings: &Settings) -> Result<String> {
    let api_command = match command.into_api_command() {
        Ok(api_command) => api_command,
        Err(LocalCommand::Auth(auth)) => return run_auth(auth, settings).await,
        Err(LocalCommand::Config(config)) => return run_config(config, settings),
    };

    let client = TypefullyClient::new(&settings.api)?;
    let runner = CommandRunner::new(client, settings.output_format, settings.draft_defaults);
    runner.run(api_command).await
}

/// Output ends with exactly one newline; empty output prints nothing.
fn stdout_text(output: &str) -> String {
    let trimmed = output.trim_end_matches('\n');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

fn init_settings(path: &Path, force: bool, format: OutputFormat) -> Result<String> {
    FileConfig::write_template(path, force)?;
    render_message(
        &format!("Wrote settings template to {}", path.display()),
        format,
    )
}

fn login(path: &Path, key: &str, format: OutputFormat) -> Result<String> {
    store_api_key(path, key)?;
    tracing::info!("Stored API key in {}", path.display());
    render_message(&format!("Saved API key to {}", path.display()), format)
}

async fn run_auth(command: AuthCommand, settings: &Settings) -> Result<String> {
    match command {
        AuthCommand::Login { key } => login(&settings.path, &key, settings.output_format),
        AuthCommand::Status { verify } => {
            let verified = if verify {
                let client = TypefullyClient::new(&settings.api)?;
                client.notifications(Some(NotificationKind::Inbox)).await?;
                Some(true)
            } else {
                None
            };
            render_auth_status(settings, verified)
        }
    }
}

fn render_auth_status(settings: &Settings, verified: Option<bool>) -> Result<String> {
    let masked = settings.api.api_key.as_deref().map(mask_key);

    if settings.output_format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&serde_json::json!({
            "configured": masked.is_some(),
            "source": settings.key_source,
            "key": masked,
            "verified": verified,
        }))?);
    }

    let mut lines = Vec::new();
    match &masked {
        Some(key) => lines.push(format!("API key: {} (from {})", key, settings.key_source)),
        None => lines.push(
            "No API key configured. Set TYPEFULLY_API_KEY or run `typefully auth login --key <KEY>`"
                .to_string(),
        ),
    }
    if verified == Some(true) {
        lines.push("Verified: Typefully accepted the key".to_string());
    }
    Ok(lines.join("\n"))
}

fn run_config(command: ConfigCommand, settings: &Settings) -> Result<String> {
    match command {
        ConfigCommand::Init { force } => init_settings(&settings.path, force, settings.output_format),
        ConfigCommand::Show => {
            if settings.output_format == OutputFormat::Json {
                let r = &settings.api.retry;
                return Ok(serde_json::to_string_pretty(&serde_json::json!({
                    "path": settings.path,
                    "api_key": settings.api.api_key.as_deref().map(mask_key),
                    "key_source": settings.key_source,
                    "base_url": settings.api.base_url,
                    "timeout_seconds": settings.api.timeout_seconds,
                    "retry": {
                        "max_retries": r.max_retries,
                        "base_delay_ms": r.base_delay_ms,
                        "max_delay_ms": r.max_delay_ms,
                        "jitter": r.jitter,
                    },
                    "output_format": settings.output_format,
                    "log_json": settings.log_json,
                    "defaults": settings.draft_defaults,
                }))?);
            }
            Ok(settings.describe())
        }
        ConfigCommand::Path => Ok(settings.path.display().to_string()),
    }
}
