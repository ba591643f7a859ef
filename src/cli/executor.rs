//! Command executor for dispatching CLI commands

use super::handlers::{
    CheckCommandHandler, ConversationsCommandHandler, FeedCommandHandler, MigrateCommandHandler,
};
use super::parser::{Cli, Commands};
use crate::config::{Environment, Settings};
use crate::error::AppResult;
use crate::state::AppState;

/// Execute a CLI command with the given settings
///
/// # Arguments
/// * `cli` - Parsed CLI arguments
/// * `settings` - Loaded and validated settings
/// * `environment` - The environment the settings were loaded for
pub async fn execute_command(
    cli: &Cli,
    settings: Settings,
    environment: Environment,
) -> AppResult<()> {
    match &cli.command {
        Commands::Check => CheckCommandHandler::new(settings, environment).execute().await,
        Commands::Migrate { dry_run } => MigrateCommandHandler::new(settings).execute(*dry_run).await,
        Commands::Feed { user, friends } => {
            let state = AppState::from_settings(&settings).await?;
            FeedCommandHandler::new(state).execute(*user, *friends).await
        }
        Commands::Conversations { user } => {
            let state = AppState::from_settings(&settings).await?;
            ConversationsCommandHandler::new(state).execute(*user).await
        }
    }
}
