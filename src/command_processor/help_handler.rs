//! Help command handler
//!
//! Lists every registered command with its usage line.

use super::{CommandArgs, CommandContext, CommandHandler, CommandSpec, Reply};
use anyhow::Result;
use std::fmt::Write;
use std::future::Future;
use std::pin::Pin;

#[derive(Debug)]
pub struct HelpHandler;

impl CommandHandler for HelpHandler {
    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
        _args: CommandArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Reply>> + Send + 'a>> {
        Box::pin(async move { Ok(Reply::text(render_help(&ctx.commands))) })
    }

    fn can_handle(&self, command: &str) -> bool {
        command == "help" || command == "--help" || command == "-h"
    }

    fn describe(&self) -> CommandSpec {
        CommandSpec::new("help", "help", "Show this help message")
    }
}

fn render_help(commands: &[CommandSpec]) -> String {
    let width = commands.iter().map(|c| c.usage.len()).max().unwrap_or(0);
    let mut out = String::from("CallDesk - spreadsheet call date filter\n\nCOMMANDS:\n");
    for command in commands {
        let _ = writeln!(out, "  {:<width$}  {}", command.usage, command.description, width = width);
    }
    out.push_str("\nEXAMPLES:\n");
    out.push_str("  etd report.xlsx --days 500\n");
    out.push_str("  special report.xlsx --start-day 30 --end-day 90 --sort date\n");
    out
}
