use std::error::Error;
use std::process::ExitCode;

use tokio::signal;
use tracing::error;
use tracing_subscriber::EnvFilter;

use turncat::{input, run, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::default();
    let lines = input::stdin_lines()?;
    let mut stdout = tokio::io::stdout();

    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let end = run(&config, lines, &mut stdout, interrupt).await;
    Ok(ExitCode::from(end.exit_code()))
}
