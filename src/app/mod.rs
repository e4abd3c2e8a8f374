// Application layer: wires the parsed command line to settings, the API client and output.

pub mod commands;

pub use commands::{cli, run, run_settings_file_command};
