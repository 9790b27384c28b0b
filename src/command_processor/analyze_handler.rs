//! Spreadsheet analysis commands
//!
//! `etd` and `special` take an attached spreadsheet plus a day window, run the
//! date filter and open a paginated session for the result.
//
// # Examples
//
// ```
// let handler = AnalyzeHandler::new(AnalysisKind::Etd);
// let args = CommandArgs::parse("etd --days 400")?.with_attachment(upload);
// let reply = handler.execute(&ctx, args).await?;
// ```

use super::{
    int_flag, CommandArgs, CommandContext, CommandError, CommandHandler, CommandSpec, Reply,
    NO_MATCHES_NOTICE,
};
use crate::config::AnalysisConfig;
use crate::filter::{FilterWindow, SortKey};
use crate::paginator::Paginator;
use crate::services::analysis;
use anyhow::Result;
use log::info;
use std::future::Future;
use std::pin::Pin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    /// Exchange traded debt
    Etd,
    /// Preferred shares
    Special,
}

impl AnalysisKind {
    pub fn command(&self) -> &'static str {
        match self {
            AnalysisKind::Etd => "etd",
            AnalysisKind::Special => "special",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            AnalysisKind::Etd => "List ETD call dates inside a day window from today",
            AnalysisKind::Special => "List preferred share call dates inside a day window from today",
        }
    }
}

#[derive(Debug)]
pub struct AnalyzeHandler {
    kind: AnalysisKind,
}

impl AnalyzeHandler {
    pub fn new(kind: AnalysisKind) -> Self {
        Self { kind }
    }
}

impl CommandHandler for AnalyzeHandler {
    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
        args: CommandArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Reply>> + Send + 'a>> {
        Box::pin(async move {
            let days = int_flag(&args, "days")?;
            let start_day = int_flag(&args, "start-day")?;
            let end_day = int_flag(&args, "end-day")?;
            let sort_key = args
                .flag("sort")
                .map(str::parse::<SortKey>)
                .transpose()
                .map_err(CommandError::Usage)?;

            let analysis_config = &ctx.config.analysis;
            let window = resolve_window(analysis_config, days, start_day, end_day)?;
            let attachment = args.attachment.ok_or_else(|| {
                CommandError::Usage(format!(
                    "Attach a spreadsheet file to '{}'",
                    self.kind.command()
                ))
            })?;

            info!(
                "Running '{}' analysis on '{}' for window '{}'",
                self.kind.command(),
                attachment.filename,
                window
            );
            let options = analysis_config.filter_options(sort_key);
            let rows = analysis::analyze(attachment.bytes, window, options).await?;

            match Paginator::new(&rows, ctx.config.pagination.page_size) {
                None => {
                    info!("'{}' analysis matched no rows", self.kind.command());
                    Ok(Reply::notice(NO_MATCHES_NOTICE))
                }
                Some(paginator) => {
                    let (session, view) = ctx.sessions.open(paginator)?;
                    Ok(Reply::Page { session, view })
                }
            }
        })
    }

    fn can_handle(&self, command: &str) -> bool {
        command == self.kind.command()
    }

    fn describe(&self) -> CommandSpec {
        CommandSpec::new(
            self.kind.command(),
            &format!(
                "{} <file> [--days N | --start-day N --end-day N] [--sort code|date]",
                self.kind.command()
            ),
            self.kind.description(),
        )
    }
}

/// Turn command parameters into a window, applying the configured default
/// and the allowed `days` range.
pub fn resolve_window(
    config: &AnalysisConfig,
    days: Option<i64>,
    start_day: Option<i64>,
    end_day: Option<i64>,
) -> Result<FilterWindow> {
    let days = match (days, start_day, end_day) {
        (None, None, None) => Some(config.default_days),
        _ => days,
    };
    let window = FilterWindow::from_params(days, start_day, end_day)?;
    if let FilterWindow::Relative { days } = window {
        if !(config.min_days..=config.max_days).contains(&days) {
            return Err(CommandError::Usage(format!(
                "--days must be between {} and {}, got {}",
                config.min_days, config.max_days, days
            ))
            .into());
        }
    }
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_processor::{Attachment, ErrorKind};
    use crate::config::Config;
    use crate::filter::FilterError;
    use crate::session::SessionStore;
    use chrono::{Days, Local};
    use pretty_assertions::assert_eq;
    use rust_xlsxwriter::Workbook;
    use std::sync::Arc;

    fn context(config: Config) -> CommandContext {
        CommandContext {
            sessions: Arc::new(SessionStore::new(config.pagination.max_sessions)),
            config: Arc::new(config),
            commands: Arc::new(Vec::new()),
        }
    }

    fn upload(rows: &[(&str, String)]) -> Attachment {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "tablescraper-selected-row 3").unwrap();
        sheet.write_string(0, 1, "tablescraper-selected-row 10").unwrap();
        for (i, (code, date)) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, *code).unwrap();
            sheet.write_string(row, 1, date.as_str()).unwrap();
        }
        Attachment { filename: "upload.xlsx".to_string(), bytes: workbook.save_to_buffer().unwrap() }
    }

    fn in_days(days: u64) -> String {
        let date = Local::now().date_naive().checked_add_days(Days::new(days)).unwrap();
        format!("Call Date: {}", date.format("%m/%d/%Y"))
    }

    #[test]
    fn default_window_is_applied_when_nothing_given() {
        let config = AnalysisConfig::default();
        let window = resolve_window(&config, None, None, None).unwrap();
        assert_eq!(window, FilterWindow::Relative { days: 500 });
    }

    #[test]
    fn days_outside_interface_range_are_rejected() {
        let config = AnalysisConfig::default();
        assert!(resolve_window(&config, Some(364), None, None).is_err());
        assert!(resolve_window(&config, Some(1001), None, None).is_err());
        assert!(resolve_window(&config, Some(365), None, None).is_ok());
        assert!(resolve_window(&config, Some(1000), None, None).is_ok());
    }

    #[test]
    fn offsets_are_unconstrained_but_ordered() {
        let config = AnalysisConfig::default();
        assert_eq!(
            resolve_window(&config, None, Some(-30), Some(5000)).unwrap(),
            FilterWindow::Offset { start_day: -30, end_day: 5000 }
        );
        let err = resolve_window(&config, None, Some(10), Some(5)).unwrap_err();
        assert!(matches!(err.downcast_ref::<FilterError>(), Some(FilterError::InvalidWindow(_))));
        let err = resolve_window(&config, Some(400), Some(1), Some(5)).unwrap_err();
        assert!(matches!(err.downcast_ref::<FilterError>(), Some(FilterError::InvalidWindow(_))));
    }

    #[tokio::test]
    async fn opens_a_session_with_sorted_rows() -> Result<()> {
        let ctx = context(Config::default());
        let handler = AnalyzeHandler::new(AnalysisKind::Etd);
        let file = upload(&[
            ("ZZZ 5.0", in_days(40)),
            ("AAA 6.1", in_days(20)),
            ("MMM 4.2", "n.a.".to_string()),
            ("Security Description", "Call Date".to_string()),
        ]);
        let args = CommandArgs::parse("etd --days 400")?.with_attachment(file);

        match handler.execute(&ctx, args).await? {
            Reply::Page { session, view } => {
                assert_eq!(view.rows, 2);
                assert_eq!(view.pages, 1);
                let lines: Vec<&str> = view.content.lines().collect();
                assert!(lines[0].starts_with("1. AAA 6.1 "), "got {:?}", lines);
                assert!(lines[1].starts_with("2. ZZZ 5.0 "), "got {:?}", lines);
                assert!(ctx.sessions.close(session)?);
            }
            other => panic!("expected a page, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn empty_result_is_a_notice() -> Result<()> {
        let ctx = context(Config::default());
        let handler = AnalyzeHandler::new(AnalysisKind::Special);
        let file = upload(&[("OLD 1.0", "01/01/2001".to_string())]);
        let args = CommandArgs::parse("special --start-day 0 --end-day 10")?.with_attachment(file);

        let reply = handler.execute(&ctx, args).await?;
        assert_eq!(reply, Reply::notice(NO_MATCHES_NOTICE));
        assert!(ctx.sessions.is_empty()?);
        Ok(())
    }

    #[tokio::test]
    async fn missing_attachment_is_a_usage_error() {
        let ctx = context(Config::default());
        let handler = AnalyzeHandler::new(AnalysisKind::Etd);
        let err = handler.execute(&ctx, CommandArgs::parse("etd").unwrap()).await.unwrap_err();
        assert!(matches!(
            Reply::from_error(&err),
            Reply::Error { error: ErrorKind::InvalidInput, .. }
        ));
    }

    #[tokio::test]
    async fn missing_column_is_reported() {
        let ctx = context(Config::default());
        let handler = AnalyzeHandler::new(AnalysisKind::Etd);
        let mut workbook = Workbook::new();
        workbook.add_worksheet().write_string(0, 0, "something else").unwrap();
        let file = Attachment { filename: "x.xlsx".into(), bytes: workbook.save_to_buffer().unwrap() };
        let args = CommandArgs::parse("etd").unwrap().with_attachment(file);

        let err = handler.execute(&ctx, args).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<FilterError>(),
            Some(&FilterError::MissingColumn("tablescraper-selected-row 3".to_string()))
        );
    }
}
