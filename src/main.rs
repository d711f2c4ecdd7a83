use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use freshet::app::AppContext;
use freshet::cli::{commands, Cli, Commands};
use freshet::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Add { url, group } => {
            commands::add_source(&ctx, &url, group.as_deref()).await?;
        }
        Commands::Remove { url } => {
            commands::remove_source(&ctx, &url).await?;
        }
        Commands::Refresh { url } => {
            commands::refresh(&ctx, url.as_deref()).await?;
        }
        Commands::List { articles } => {
            if articles {
                commands::list_articles(&ctx)?;
            } else {
                commands::list_sources(&ctx)?;
            }
        }
        Commands::Read { article_id, undo } => {
            commands::mark_read(&ctx, &article_id, !undo)?;
        }
        Commands::Star { article_id } => {
            commands::toggle_star(&ctx, &article_id)?;
        }
        Commands::Render { article_id } => {
            commands::render(&ctx, &article_id)?;
        }
        Commands::Watch { interval } => {
            commands::watch(&ctx, interval).await?;
        }
    }

    Ok(())
}
