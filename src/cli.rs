use crate::command_processor::analyze_handler::AnalysisKind;
use crate::command_processor::CommandArgs;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;

/// CallDesk - filter scraped spreadsheets by upcoming call dates
#[derive(Debug, Parser)]
#[command(name = "calldesk")]
#[command(about = "Filter scraped spreadsheets by upcoming call dates", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute (if not specified, enters interactive terminal mode)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Start in API server mode only
    #[arg(long = "api-server", conflicts_with = "full")]
    pub api_server: bool,

    /// Start both terminal and API server
    #[arg(long = "full", conflicts_with = "api_server")]
    pub full: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List ETD call dates inside a day window
    Etd(AnalyzeArgs),

    /// List preferred share call dates inside a day window
    Special(AnalyzeArgs),

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigActions,
    },
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Spreadsheet to analyze
    #[arg(required = true)]
    pub file: PathBuf,

    /// Keep dates from today up to this many days ahead
    #[arg(long)]
    pub days: Option<i64>,

    /// First day of an explicit window, counted from today
    #[arg(long, allow_negative_numbers = true)]
    pub start_day: Option<i64>,

    /// Last day of an explicit window, counted from today
    #[arg(long, allow_negative_numbers = true)]
    pub end_day: Option<i64>,

    /// Order of the result
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Code,
    Date,
}

#[derive(Debug, Subcommand)]
pub enum ConfigActions {
    /// Print the active configuration
    Show,
    /// Print the configuration file location
    Path,
}

impl AnalyzeArgs {
    /// Express the invocation as the chat command it stands for.
    pub fn into_command_args(self, kind: AnalysisKind) -> CommandArgs {
        let mut flags = HashMap::new();
        if let Some(days) = self.days {
            flags.insert("days".to_string(), Some(days.to_string()));
        }
        if let Some(start_day) = self.start_day {
            flags.insert("start-day".to_string(), Some(start_day.to_string()));
        }
        if let Some(end_day) = self.end_day {
            flags.insert("end-day".to_string(), Some(end_day.to_string()));
        }
        if let Some(sort) = self.sort {
            let value = match sort {
                SortArg::Code => "code",
                SortArg::Date => "date",
            };
            flags.insert("sort".to_string(), Some(value.to_string()));
        }
        CommandArgs::new(
            kind.command().to_string(),
            vec![self.file.to_string_lossy().into_owned()],
            flags,
        )
    }
}
