//! Owner-only `sync` command
//!
//! Re-announces the registered command tree so the chat surface can refresh
//! its command list.

use super::{CommandArgs, CommandContext, CommandError, CommandHandler, CommandSpec, Reply};
use anyhow::Result;
use log::info;
use std::future::Future;
use std::pin::Pin;

#[derive(Debug)]
pub struct SyncHandler;

impl CommandHandler for SyncHandler {
    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
        args: CommandArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Reply>> + Send + 'a>> {
        Box::pin(async move {
            if !args.owner {
                return Err(CommandError::NotOwner(args.command).into());
            }
            let names: Vec<&str> = ctx.commands.iter().map(|c| c.name.as_str()).collect();
            info!("Synced {} commands: {}", names.len(), names.join(", "));
            Ok(Reply::text(format!(
                "Commands synced successfully! ({})",
                names.join(", ")
            )))
        })
    }

    fn can_handle(&self, command: &str) -> bool {
        command == "sync"
    }

    fn describe(&self) -> CommandSpec {
        CommandSpec::new("sync", "sync", "Refresh the registered command list (owner only)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_processor::{CommandProcessor, ErrorKind};

    #[tokio::test]
    async fn only_the_owner_may_sync() {
        let processor = CommandProcessor::default();
        let denied = processor.dispatch(CommandArgs::parse("sync").unwrap()).await;
        assert!(matches!(denied, Reply::Error { error: ErrorKind::Forbidden, .. }));

        let allowed = processor.dispatch(CommandArgs::parse("sync").unwrap().as_owner(true)).await;
        match allowed {
            Reply::Text { message } => {
                assert!(message.starts_with("Commands synced successfully!"));
                assert!(message.contains("etd"));
                assert!(message.contains("special"));
            }
            other => panic!("expected text, got {:?}", other),
        }
    }
}
