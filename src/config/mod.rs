#[cfg(feature = "cli")]
pub mod cli;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::Cli;
pub use settings::{ApiSettings, KeySource, Overrides, Settings};
pub use toml_config::FileConfig;
