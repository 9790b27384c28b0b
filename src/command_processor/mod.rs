use crate::config::Config;
use crate::paginator::PageView;
use crate::session::SessionStore;
use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

pub mod analyze_handler;
pub mod exit_handler;
pub mod help_handler;
pub mod navigation_handler;
pub mod sync_handler;
pub mod version_handler;

/// Shown when an analysis matched nothing
pub const NO_MATCHES_NOTICE: &str = "No rows matched the requested date window.";

/// An uploaded file handed to a command
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// A parsed chat command
#[derive(Debug, Clone, Default)]
pub struct CommandArgs {
    pub command: String,
    pub args: Vec<String>,
    /// Flag names without the leading `--`
    pub flags: HashMap<String, Option<String>>,
    pub attachment: Option<Attachment>,
    /// Whether the invoker is the bot owner
    pub owner: bool,
}

impl CommandArgs {
    pub fn new(command: String, args: Vec<String>, flags: HashMap<String, Option<String>>) -> Self {
        Self { command, args, flags, attachment: None, owner: false }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn as_owner(mut self, owner: bool) -> Self {
        self.owner = owner;
        self
    }

    pub fn flag(&self, name: &str) -> Option<&str> {
        self.flags.get(name).and_then(|value| value.as_deref())
    }

    /// Parse a chat line such as `etd report.xlsx --days 400`.
    ///
    /// A leading `calldesk` word or `/` is accepted and dropped. Quoting
    /// follows shell rules; `--flag value` and `--flag=value` both work.
    pub fn parse(input: &str) -> Result<Self> {
        let normalized_input = input.replace('\u{a0}', " ");
        debug!("Normalized input: {}", normalized_input);

        let tokens = shell_words::split(&normalized_input)
            .map_err(|e| anyhow!("Tokenization error: {}", e))?;
        debug!("Tokenized input: {:?}", tokens);
        let mut tokens = tokens.into_iter().peekable();
        let first = tokens.next().ok_or_else(|| anyhow!("No command provided"))?;
        let command = if first.eq_ignore_ascii_case("calldesk") {
            tokens.next().ok_or_else(|| anyhow!("No command provided after 'calldesk'"))?
        } else {
            first
        };
        let command = command.trim_start_matches('/').to_lowercase();

        let mut args = Vec::new();
        let mut flags = HashMap::new();
        while let Some(token) = tokens.next() {
            if let Some(flag) = token.strip_prefix("--") {
                if let Some((name, value)) = flag.split_once('=') {
                    flags.insert(name.to_lowercase(), Some(value.to_string()));
                } else {
                    let value = tokens.next_if(|next| !next.starts_with("--"));
                    flags.insert(flag.to_lowercase(), value);
                }
            } else {
                args.push(token);
            }
        }

        debug!("Parsed command: {:?}, args: {:?}, flags: {:?}", command, args, flags);
        Ok(CommandArgs::new(command, args, flags))
    }
}

/// Failures a command reports back to the invoker
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),
    #[error("This page session has expired or does not exist")]
    SessionNotFound,
    #[error("Only the bot owner can run '{0}'")]
    NotOwner(String),
    #[error("Unrecognized command '{0}'. Type 'help' for a list of available commands.")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Forbidden,
    Internal,
}

/// What a command sends back to the chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Page {
        session: Uuid,
        #[serde(flatten)]
        view: PageView,
    },
    Notice {
        message: String,
        /// Only visible to the invoker
        ephemeral: bool,
    },
    Text {
        message: String,
    },
    Error {
        error: ErrorKind,
        message: String,
    },
    Exit,
}

impl Reply {
    pub fn text(message: impl Into<String>) -> Self {
        Reply::Text { message: message.into() }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Reply::Notice { message: message.into(), ephemeral: true }
    }

    pub fn from_error(err: &anyhow::Error) -> Self {
        let error = if let Some(command_error) = err.downcast_ref::<CommandError>() {
            match command_error {
                CommandError::Usage(_) | CommandError::Unknown(_) => ErrorKind::InvalidInput,
                CommandError::SessionNotFound => ErrorKind::NotFound,
                CommandError::NotOwner(_) => ErrorKind::Forbidden,
            }
        } else if err.downcast_ref::<crate::filter::FilterError>().is_some() {
            ErrorKind::InvalidInput
        } else {
            ErrorKind::Internal
        };
        Reply::Error { error, message: format!("An error occurred: {:#}", err) }
    }
}

/// Public description of a registered command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub name: String,
    pub usage: String,
    pub description: String,
}

impl CommandSpec {
    pub fn new(name: &str, usage: &str, description: &str) -> Self {
        Self { name: name.to_string(), usage: usage.to_string(), description: description.to_string() }
    }
}

/// Shared state every handler can reach
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub commands: Arc<Vec<CommandSpec>>,
}

pub trait CommandHandler: Debug + Send + Sync {
    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
        args: CommandArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Reply>> + Send + 'a>>;
    fn can_handle(&self, command: &str) -> bool;
    fn describe(&self) -> CommandSpec;
}

#[derive(Debug)]
pub struct CommandProcessor {
    handlers: Vec<Box<dyn CommandHandler>>,
    context: CommandContext,
}

impl CommandProcessor {
    pub fn new(config: Config) -> Self {
        let handlers: Vec<Box<dyn CommandHandler>> = vec![
            Box::new(analyze_handler::AnalyzeHandler::new(analyze_handler::AnalysisKind::Etd)),
            Box::new(analyze_handler::AnalyzeHandler::new(analyze_handler::AnalysisKind::Special)),
            Box::new(navigation_handler::NavigationHandler),
            Box::new(sync_handler::SyncHandler),
            Box::new(help_handler::HelpHandler),
            Box::new(version_handler::VersionHandler),
            Box::new(exit_handler::ExitHandler),
        ];
        let commands = handlers.iter().map(|handler| handler.describe()).collect();
        let sessions = SessionStore::new(config.pagination.max_sessions);
        let context = CommandContext {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            commands: Arc::new(commands),
        };
        Self { handlers, context }
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.context.commands
    }

    /// Run a command and propagate its error.
    pub async fn execute(&self, args: CommandArgs) -> Result<Reply> {
        debug!("Attempting to execute command: {}", args.command);
        debug!("Parsed arguments: {:?}", args.args);
        debug!("Parsed flags: {:?}", args.flags);
        let command_name = args.command.clone();
        let Some(handler) = self.handlers.iter().find(|h| h.can_handle(&command_name)) else {
            warn!("Unrecognized command: {}", command_name);
            return Err(CommandError::Unknown(command_name).into());
        };
        info!("Executing command '{}' with arguments: {:?}", command_name, args.args);
        handler.execute(&self.context, args).await
    }

    /// Run a command and turn any failure into an error reply.
    pub async fn dispatch(&self, args: CommandArgs) -> Reply {
        let command_name = args.command.clone();
        match self.execute(args).await {
            Ok(reply) => {
                debug!("Command '{}' executed successfully", command_name);
                reply
            }
            Err(e) => {
                error!("Failed to execute command '{}': {:?}", command_name, e);
                Reply::from_error(&e)
            }
        }
    }
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Parse an optional integer flag, naming the flag on failure.
pub(crate) fn int_flag(args: &CommandArgs, name: &str) -> Result<Option<i64>> {
    match args.flags.get(name) {
        None => Ok(None),
        Some(None) => Err(CommandError::Usage(format!("--{} needs a value", name)).into()),
        Some(Some(value)) => value.trim().parse::<i64>().map(Some).map_err(|_| {
            CommandError::Usage(format!("--{} expects a whole number, got '{}'", name, value)).into()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_flags_and_quoted_args() -> Result<()> {
        let args = CommandArgs::parse(r#"calldesk ETD "my file.xlsx" --days 400 --sort=date"#)?;
        assert_eq!(args.command, "etd");
        assert_eq!(args.args, vec!["my file.xlsx".to_string()]);
        assert_eq!(args.flag("days"), Some("400"));
        assert_eq!(args.flag("sort"), Some("date"));
        Ok(())
    }

    #[test]
    fn single_quoted_path_is_one_argument() -> Result<()> {
        let args = CommandArgs::parse("etd '/tmp/my file.xlsx' --days 400")?;
        assert_eq!(args.args, vec!["/tmp/my file.xlsx".to_string()]);
        assert_eq!(args.flag("days"), Some("400"));
        Ok(())
    }

    #[test]
    fn unbalanced_quote_is_an_error() {
        assert!(CommandArgs::parse("etd \"my file.xlsx --days 400").is_err());
    }

    #[test]
    fn negative_values_are_not_flags() -> Result<()> {
        let args = CommandArgs::parse("/special f.xlsx --start-day -5 --end-day 10 --verbose")?;
        assert_eq!(args.command, "special");
        assert_eq!(args.flag("start-day"), Some("-5"));
        assert_eq!(args.flag("end-day"), Some("10"));
        assert_eq!(args.flags.get("verbose"), Some(&None));
        Ok(())
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(CommandArgs::parse("   ").is_err());
        assert!(CommandArgs::parse("calldesk").is_err());
    }

    #[test]
    fn int_flag_reports_bad_values() {
        let args = CommandArgs::parse("etd --days soon --start-day").unwrap();
        assert!(int_flag(&args, "days").is_err());
        assert!(int_flag(&args, "start-day").is_err());
        assert_eq!(int_flag(&args, "end-day").unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_command_becomes_error_reply() {
        let processor = CommandProcessor::default();
        let reply = processor.dispatch(CommandArgs::parse("frobnicate").unwrap()).await;
        match reply {
            Reply::Error { error, message } => {
                assert_eq!(error, ErrorKind::InvalidInput);
                assert!(message.contains("frobnicate"), "message was {}", message);
            }
            other => panic!("expected error reply, got {:?}", other),
        }
    }

    #[test]
    fn registry_describes_every_handler() {
        let processor = CommandProcessor::default();
        let names: Vec<&str> = processor.commands().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["etd", "special", "page", "sync", "help", "version", "exit"]);
    }

    #[test]
    fn error_kinds_follow_the_cause() {
        let not_found = anyhow::Error::from(CommandError::SessionNotFound);
        assert!(matches!(Reply::from_error(&not_found), Reply::Error { error: ErrorKind::NotFound, .. }));

        let window = anyhow::Error::from(crate::filter::FilterError::InvalidWindow("x".into()));
        assert!(matches!(
            Reply::from_error(&window),
            Reply::Error { error: ErrorKind::InvalidInput, .. }
        ));

        let other = anyhow!("disk on fire");
        assert_eq!(
            Reply::from_error(&other),
            Reply::Error {
                error: ErrorKind::Internal,
                message: "An error occurred: disk on fire".to_string()
            }
        );
    }
}
