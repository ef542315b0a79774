use chatkit_types::{AttachmentEvent, AttachmentKind};
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  <text>                               send a message
  /models                              list configured models
  /add <name> <endpoint> [api-key]     add a model
  /use <n>                             select model n
  /remove <n>                          remove model n
  /attach code <language> <path>       queue a code file
  /attach table <path>                 queue an HTML/text table file
  /attach chart <uri>                  queue a chart image URI
  /event <json>                        deliver a raw host attachment event
  /pending                             list pending attachments by group
  /drop <id>                           remove a pending attachment
  /group [key]                         remove a pending group (no key: ungrouped)
  /draft [text]                        show the draft, or replace it
  /send                                send the draft
  /history                             print the transcript
  /raw <n>                             toggle raw display of turn n
  /show <n>                            toggle attachment list of turn n
  /delete <n>                          delete turn n
  /stop                                stop the running stream (or Ctrl-C)
  /help                                this text
  /quit                                exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(String),
    /// Show the draft, or replace it with the given text
    Draft(Option<String>),
    SendDraft,
    Models,
    Add {
        name: String,
        endpoint: String,
        api_key: Option<String>,
    },
    Use(usize),
    Remove(usize),
    Attach(AttachSource),
    Event(Box<AttachmentEvent>),
    Pending,
    Drop(String),
    /// Remove a pending group; `None` names the ungrouped items
    Group(Option<String>),
    History,
    Raw(usize),
    Show(usize),
    Delete(usize),
    Stop,
    Help,
    Quit,
}

/// Where an attachment's payload comes from
#[derive(Debug, Clone, PartialEq)]
pub enum AttachSource {
    Code { language: String, path: String },
    Table { path: String },
    Chart { uri: String },
}

impl AttachSource {
    pub fn kind(&self) -> AttachmentKind {
        match self {
            Self::Code { .. } => AttachmentKind::Code,
            Self::Table { .. } => AttachmentKind::Table,
            Self::Chart { .. } => AttachmentKind::Chart,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: /{0} (try /help)")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid attachment event: {0}")]
    InvalidEvent(String),
}

impl Command {
    /// Parse one input line; `None` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Some(Self::Send(line.to_string())));
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        let words: Vec<&str> = args.split_whitespace().collect();

        let command = match name {
            "draft" if args.is_empty() => Self::Draft(None),
            "draft" => Self::Draft(Some(args.to_string())),
            "send" => Self::SendDraft,
            "models" => Self::Models,
            "add" => match words.as_slice() {
                [name, endpoint] => Self::Add {
                    name: name.to_string(),
                    endpoint: endpoint.to_string(),
                    api_key: None,
                },
                [name, endpoint, key] => Self::Add {
                    name: name.to_string(),
                    endpoint: endpoint.to_string(),
                    api_key: Some(key.to_string()),
                },
                _ => return Err(CommandError::Usage("/add <name> <endpoint> [api-key]")),
            },
            "use" => Self::Use(index(&words, "/use <n>")?),
            "remove" => Self::Remove(index(&words, "/remove <n>")?),
            "attach" => Self::Attach(attach_source(&words)?),
            "event" => {
                let event = serde_json::from_str(args)
                    .map_err(|e| CommandError::InvalidEvent(e.to_string()))?;
                Self::Event(Box::new(event))
            }
            "pending" => Self::Pending,
            "drop" => Self::Drop(single(&words, "/drop <id>")?),
            "group" if words.is_empty() => Self::Group(None),
            "group" => Self::Group(Some(single(&words, "/group [key]")?)),
            "history" => Self::History,
            "raw" => Self::Raw(index(&words, "/raw <n>")?),
            "show" => Self::Show(index(&words, "/show <n>")?),
            "delete" => Self::Delete(index(&words, "/delete <n>")?),
            "stop" => Self::Stop,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn single(words: &[&str], usage: &'static str) -> Result<String, CommandError> {
    match words {
        [word] => Ok(word.to_string()),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn index(words: &[&str], usage: &'static str) -> Result<usize, CommandError> {
    single(words, usage)?
        .parse()
        .map_err(|_| CommandError::Usage(usage))
}

fn attach_source(words: &[&str]) -> Result<AttachSource, CommandError> {
    match words {
        ["code", language, path] => Ok(AttachSource::Code {
            language: language.to_string(),
            path: path.to_string(),
        }),
        ["table", path] => Ok(AttachSource::Table {
            path: path.to_string(),
        }),
        ["chart", uri] => Ok(AttachSource::Chart {
            uri: uri.to_string(),
        }),
        _ => Err(CommandError::Usage(
            "/attach code <language> <path> | table <path> | chart <uri>",
        )),
    }
}
