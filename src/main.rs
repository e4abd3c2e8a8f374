use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    typefully_cli::cli().await
}
