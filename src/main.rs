use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use skimmer::app::AppContext;
use skimmer::cli::{commands, Cli, Commands};
use skimmer::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(db) = cli.db {
        config.database_path = Some(db);
    }

    let ctx = AppContext::new(config).await?;

    match cli.command {
        Commands::Add { url, parent } => commands::add_feed(&ctx, &url, parent).await?,
        Commands::Remove { id } => commands::remove_feed(&ctx, id)?,
        Commands::Update { id: Some(id) } => commands::update_feed(&ctx, id).await?,
        Commands::Update { id: None } => commands::update_feeds(&ctx).await?,
        Commands::List { items, json } => {
            if items {
                commands::list_items(&ctx, json)?;
            } else {
                commands::list_feeds(&ctx, json)?;
            }
        }
        Commands::Tree => commands::show_tree(&ctx)?,
        Commands::Read { item_id } => commands::mark_read(&ctx, item_id)?,
        Commands::ReadAll { feed_id } => commands::mark_all_read(&ctx, feed_id)?,
        Commands::Mkdir { title, parent } => commands::make_directory(&ctx, &title, parent)?,
        Commands::Mv { feed_id, parent } => commands::move_feed(&ctx, feed_id, parent)?,
    }

    Ok(())
}
