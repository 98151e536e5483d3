use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    pgprovision_lib::app::run().await
}
