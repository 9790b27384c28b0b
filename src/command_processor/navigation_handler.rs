//! Page navigation for an open analysis session.
//!
//! Handles `next`, `previous`, `page` and `close`. Each takes the session id
//! the analysis reply carried.

use super::{CommandArgs, CommandContext, CommandError, CommandHandler, CommandSpec, Reply};
use crate::session::Navigation;
use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

#[derive(Debug)]
pub struct NavigationHandler;

impl CommandHandler for NavigationHandler {
    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
        args: CommandArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Reply>> + Send + 'a>> {
        Box::pin(async move {
            let session = session_id(&args)?;
            let navigation = match args.command.as_str() {
                "next" => Navigation::Next,
                "previous" | "prev" => Navigation::Previous,
                "close" => {
                    if !ctx.sessions.close(session)? {
                        return Err(CommandError::SessionNotFound.into());
                    }
                    return Ok(Reply::text("Session closed."));
                }
                _ => Navigation::Current,
            };
            let view = ctx
                .sessions
                .navigate(session, navigation)?
                .ok_or(CommandError::SessionNotFound)?;
            Ok(Reply::Page { session, view })
        })
    }

    fn can_handle(&self, command: &str) -> bool {
        matches!(command, "next" | "previous" | "prev" | "page" | "close")
    }

    fn describe(&self) -> CommandSpec {
        CommandSpec::new(
            "page",
            "next|previous|page|close <session>",
            "Move through, re-show or close a paginated result",
        )
    }
}

fn session_id(args: &CommandArgs) -> Result<Uuid> {
    let raw = args
        .args
        .first()
        .ok_or_else(|| CommandError::Usage(format!("'{}' needs a session id", args.command)))?;
    Uuid::parse_str(raw)
        .map_err(|_| CommandError::Usage(format!("'{}' is not a valid session id", raw)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_processor::CommandProcessor;
    use crate::filter::FilteredRow;
    use crate::paginator::Paginator;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn open_session(processor: &CommandProcessor, rows: usize, page_size: usize) -> Uuid {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let rows: Vec<FilteredRow> =
            (0..rows).map(|i| FilteredRow::new(format!("N{}", i), date)).collect();
        let paginator = Paginator::new(&rows, page_size).unwrap();
        processor.context().sessions.open(paginator).unwrap().0
    }

    fn page_of(reply: Reply) -> usize {
        match reply {
            Reply::Page { view, .. } => view.page,
            other => panic!("expected a page, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn next_and_previous_wrap() -> Result<()> {
        let processor = CommandProcessor::default();
        let id = open_session(&processor, 3, 1);

        let prev = CommandArgs::parse(&format!("previous {}", id))?;
        assert_eq!(page_of(processor.execute(prev).await?), 2);
        let next = CommandArgs::parse(&format!("next {}", id))?;
        assert_eq!(page_of(processor.execute(next).await?), 0);
        let show = CommandArgs::parse(&format!("page {}", id))?;
        assert_eq!(page_of(processor.execute(show).await?), 0);
        Ok(())
    }

    #[tokio::test]
    async fn closed_session_reports_not_found() -> Result<()> {
        let processor = CommandProcessor::default();
        let id = open_session(&processor, 1, 30);

        let close = CommandArgs::parse(&format!("close {}", id))?;
        assert_eq!(processor.execute(close).await?, Reply::text("Session closed."));

        let next = CommandArgs::parse(&format!("next {}", id))?;
        let err = processor.execute(next).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<CommandError>(), Some(CommandError::SessionNotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_bad_session_ids() {
        let processor = CommandProcessor::default();
        assert!(processor.execute(CommandArgs::parse("next").unwrap()).await.is_err());
        assert!(processor.execute(CommandArgs::parse("next abc").unwrap()).await.is_err());
    }
}
