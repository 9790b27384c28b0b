//! Version command handler
//!
//! Handles version-related commands.

use super::{CommandArgs, CommandContext, CommandHandler, CommandSpec, Reply};
use anyhow::Result;
use std::future::Future;
use std::pin::Pin;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug)]
pub struct VersionHandler;

impl CommandHandler for VersionHandler {
    fn execute<'a>(
        &'a self,
        _ctx: &'a CommandContext,
        _args: CommandArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Reply>> + Send + 'a>> {
        Box::pin(async move {
            Ok(Reply::text(format!(
                "CallDesk v{}\nFilters uploaded spreadsheets by upcoming call dates.",
                VERSION
            )))
        })
    }

    fn can_handle(&self, command: &str) -> bool {
        command == "version" || command == "--version" || command == "-v"
    }

    fn describe(&self) -> CommandSpec {
        CommandSpec::new("version", "version", "Show version information")
    }
}
