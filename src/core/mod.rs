pub mod client;
pub mod content;
pub mod retry;
pub mod runner;
pub mod schedule;

pub use crate::domain::model::{Draft, NewDraft, Notification, ScheduleDate};
pub use crate::domain::ports::TypefullyApi;
pub use crate::utils::error::Result;
