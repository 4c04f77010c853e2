use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    fund_me_deploy::start(std::env::args()).await
}
