//! asd-screen - Main Entry Point

use clap::Parser;
use asd_screen::cli::{cmd_info, cmd_screen, cmd_status, cmd_train, load_config, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asd_screen=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Status => cmd_status(config)?,
        Commands::Train { data, model_dir } => cmd_train(config, data, model_dir)?,
        Commands::Screen { input } => cmd_screen(config, &input)?,
        Commands::Info { data } => cmd_info(&config, &data)?,
    }

    Ok(())
}
