//! CallScribe entry point

use std::process::ExitCode;

use clap::Parser;

use call_scribe::cli::{
    app::{config_store, load_merged_config, run_server, EXIT_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use call_scribe::domain::config::RelayConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();
    let store = config_store(cli.config.as_deref());

    // Handle subcommands
    if let Some(Commands::Config { action }) = cli.command {
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Build CLI config from args
    let cli_config = RelayConfig {
        bind: cli.bind.clone(),
        ..Default::default()
    };

    let config = load_merged_config(&store, cli_config).await;

    run_server(config).await
}
