use crate::command_processor::{Attachment, CommandArgs, CommandError, CommandProcessor, Reply};
use crate::config::Config;
use anyhow::Result;
use log::{debug, info};
use rustyline::DefaultEditor;
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

const ANALYZE_COMMANDS: &[&str] = &["etd", "special"];
const NAVIGATION_COMMANDS: &[&str] = &["next", "previous", "prev", "page", "close"];

/// Interactive chat-style terminal in front of the command processor.
///
/// The terminal reads attachments from disk and remembers the last opened
/// session so `next` and `previous` work without an id.
pub struct Application {
    processor: CommandProcessor,
}

impl Application {
    pub fn new(config: Config) -> Self {
        Self { processor: CommandProcessor::new(config) }
    }

    pub async fn run(&self) -> Result<()> {
        info!("Starting CallDesk terminal");
        let mut rl = DefaultEditor::new()?;
        let mut current_session = None;

        println!("Welcome to CallDesk! Type 'help' for commands.");
        let prompt = "calldesk> ";

        loop {
            match rl.readline(prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line.as_str());
                    let reply = self.process_line(&line, &mut current_session).await;
                    println!("{}", render_reply(&reply));
                    if reply == Reply::Exit {
                        break;
                    }
                }
                Err(rustyline::error::ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(rustyline::error::ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle one line of terminal input.
    pub async fn process_line(&self, line: &str, current_session: &mut Option<Uuid>) -> Reply {
        let args = match CommandArgs::parse(line) {
            Ok(args) => args,
            Err(e) => return Reply::from_error(&CommandError::Usage(e.to_string()).into()),
        };
        let args = match self.prepare(args, *current_session).await {
            Ok(args) => args,
            Err(e) => return Reply::from_error(&e),
        };
        let closing = args.command == "close";

        let reply = self.processor.dispatch(args).await;
        match &reply {
            Reply::Page { session, .. } => *current_session = Some(*session),
            Reply::Text { .. } if closing => *current_session = None,
            _ => {}
        }
        reply
    }

    /// Run a single analysis and print every page.
    pub async fn run_once(&self, args: CommandArgs) -> Result<()> {
        let args = self.prepare(args, None).await?;
        match self.processor.execute(args).await? {
            Reply::Page { session, view } => {
                println!("{}", view.content);
                for _ in 1..view.pages {
                    let next = CommandArgs::new(
                        "next".to_string(),
                        vec![session.to_string()],
                        HashMap::new(),
                    );
                    if let Reply::Page { view, .. } = self.processor.execute(next).await? {
                        println!("{}", view.content);
                    }
                }
                println!("\n{} rows", view.rows);
                Ok(())
            }
            Reply::Exit => Ok(()),
            other => {
                println!("{}", render_reply(&other));
                Ok(())
            }
        }
    }

    async fn prepare(
        &self,
        mut args: CommandArgs,
        current_session: Option<Uuid>,
    ) -> Result<CommandArgs> {
        // The person at the terminal runs the bot
        args.owner = true;

        if ANALYZE_COMMANDS.contains(&args.command.as_str()) {
            if let Some(path) = args.args.first() {
                args.attachment = Some(read_attachment(Path::new(path)).await?);
            }
        } else if NAVIGATION_COMMANDS.contains(&args.command.as_str()) && args.args.is_empty() {
            match current_session {
                Some(id) => args.args.push(id.to_string()),
                None => {
                    return Err(CommandError::Usage(
                        "No result is open yet; run 'etd' or 'special' first".to_string(),
                    )
                    .into())
                }
            }
        }
        Ok(args)
    }
}

async fn read_attachment(path: &Path) -> Result<Attachment> {
    debug!("Reading attachment from {}", path.display());
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        CommandError::Usage(format!("Could not read '{}': {}", path.display(), e))
    })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Attachment { filename, bytes })
}

/// Plain-text rendering of a reply for the terminal.
pub fn render_reply(reply: &Reply) -> String {
    match reply {
        Reply::Page { view, .. } => format!(
            "{}\n\n[page {}/{} · {} rows]  « previous | next »",
            view.content,
            view.page + 1,
            view.pages,
            view.rows
        ),
        Reply::Notice { message, .. } | Reply::Text { message } | Reply::Error { message, .. } => {
            message.clone()
        }
        Reply::Exit => "Exiting CallDesk...".to_string(),
    }
}
