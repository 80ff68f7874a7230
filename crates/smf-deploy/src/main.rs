mod bootstrap_helpers;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use smf_deploy::{render_deployment_summary, run_deployment, Cli};

use crate::bootstrap_helpers::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) if !error.use_stderr() => {
            let _ = error.print();
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = error.print();
            return ExitCode::from(1);
        }
    };
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.into_deploy_config()?;
    println!("Deploying Secure Music Flow contracts to {}...", config.network);
    let report = run_deployment(config).await?;
    println!();
    println!("{}", render_deployment_summary(&report));
    Ok(())
}
