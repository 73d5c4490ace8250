use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    quizdl::logging::init().context("init logging")?;

    let cli = quizdl::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");
    let options_file = cli.options_file.as_deref();

    match cli.command {
        quizdl::cli::Command::Scrape(args) => {
            quizdl::extract::run(args).await.context("scrape")?;
        }
        quizdl::cli::Command::Download(args) => {
            quizdl::control::run(options_file, args)
                .await
                .context("download")?;
        }
        quizdl::cli::Command::Options { command } => {
            quizdl::options::run(options_file, command)
                .await
                .context("options")?;
        }
    }

    Ok(())
}
