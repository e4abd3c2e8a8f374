#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use app::cli;

pub use config::settings::{Overrides, Settings};
pub use crate::core::{client::TypefullyClient, runner::CommandRunner};
pub use domain::ports::TypefullyApi;
pub use utils::error::{Result, TypefullyError};
