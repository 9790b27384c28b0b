pub mod api_server;
pub mod app;
pub mod cli;
pub mod command_processor;
pub mod config;
pub mod env_manager;
pub mod filter;
pub mod paginator;
pub mod services;
pub mod session;

use anyhow::Result;
use api_server::ApiState;
use cli::{Cli, Commands, ConfigActions};
use command_processor::analyze_handler::AnalysisKind;
use command_processor::CommandProcessor;
use log::*;
use std::sync::Arc;

pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    info!("Initializing CallDesk");

    match cli.command {
        Some(Commands::Config { action }) => {
            match action {
                ConfigActions::Show => print!("{}", toml::to_string_pretty(&config)?),
                ConfigActions::Path => println!("{}", config::get_config_path()?.display()),
            }
            Ok(())
        }
        Some(Commands::Etd(args)) => {
            app::Application::new(config).run_once(args.into_command_args(AnalysisKind::Etd)).await
        }
        Some(Commands::Special(args)) => {
            app::Application::new(config)
                .run_once(args.into_command_args(AnalysisKind::Special))
                .await
        }
        None if cli.api_server => api_server::start_api_server(api_state(config.clone())).await,
        None if cli.full => {
            let state = api_state(config.clone());
            let api_handle = tokio::spawn(async move {
                if let Err(e) = api_server::start_api_server(state).await {
                    error!("API server error: {:?}", e);
                }
            });
            let result = app::Application::new(config).run().await;
            api_handle.abort();
            result
        }
        None => app::Application::new(config).run().await,
    }
}

fn api_state(config: Config) -> Arc<ApiState> {
    Arc::new(ApiState::new(CommandProcessor::new(config), env_manager::owner_token()))
}

pub fn init_logger(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            use chrono::Local;
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

// Re-export commonly used types
pub use config::Config;
pub use filter::{filter_rows, FilterError, FilterOptions, FilterWindow, FilteredRow, SortKey};
