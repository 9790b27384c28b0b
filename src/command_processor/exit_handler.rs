//! Exit command handler
//!
//! Handles exit and quit commands. The terminal loop stops when it sees
//! [`Reply::Exit`]; other surfaces ignore it.

use super::{CommandArgs, CommandContext, CommandHandler, CommandSpec, Reply};
use anyhow::Result;
use std::future::Future;
use std::pin::Pin;

#[derive(Debug)]
pub struct ExitHandler;

impl CommandHandler for ExitHandler {
    fn execute<'a>(
        &'a self,
        _ctx: &'a CommandContext,
        _args: CommandArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Reply>> + Send + 'a>> {
        Box::pin(async move { Ok(Reply::Exit) })
    }

    fn can_handle(&self, command: &str) -> bool {
        command == "exit" || command == "quit"
    }

    fn describe(&self) -> CommandSpec {
        CommandSpec::new("exit", "exit", "Leave the terminal session")
    }
}
