use anyhow::Result;
use calldesk::cli::Cli;
use calldesk::env_manager::{self, EnvFile};
use clap::Parser;
use log::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the logger so it can set the log level
    let env_file = env_manager::load_env_file();
    calldesk::init_logger(&env_manager::log_level());

    match env_file {
        Ok(EnvFile::Loaded(path)) => info!("Loaded environment from {:?}", path),
        Ok(EnvFile::TemplateCreated(path)) => {
            info!("No .env file found, wrote a template to {:?}", path)
        }
        Err(e) => error!("Failed to load environment file: {:?}", e),
    }

    let cli = Cli::parse();
    info!("Starting CallDesk");

    calldesk::run(cli).await
}
