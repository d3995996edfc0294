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
    habitsite::logging::init().context("init logging")?;

    let cli = habitsite::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let config = habitsite::config::SiteConfig::from_env().context("load site config")?;

    match cli.command {
        habitsite::cli::Command::Slug { command } => {
            habitsite::slug::run(command).context("slug")?;
        }
        habitsite::cli::Command::Views { command } => {
            habitsite::views::run(command, &config)
                .await
                .context("views")?;
        }
        habitsite::cli::Command::Head(args) => {
            habitsite::pages::run(args, &config).context("head")?;
        }
        habitsite::cli::Command::Locale { command } => {
            habitsite::locale::run(command, &config).context("locale")?;
        }
    }

    Ok(())
}
