use thiserror::Error;

/// One line of usage per command, shown by `help`.
pub const USAGE: &[&str] = &[
    "create-topic <topic>",
    "delete-topic <topic>",
    "create-producer <producer>",
    "delete-producer <producer>",
    "create-observer <observer>",
    "delete-observer <observer>",
    "subscribe <observer> <topic>",
    "unsubscribe <observer> <topic>",
    "publish <producer> <topic> <content...>",
    "messages <observer>",
    "log",
    "list",
    "save",
    "load",
    "help",
    "quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateTopic(String),
    DeleteTopic(String),
    CreateProducer(String),
    DeleteProducer(String),
    CreateObserver(String),
    DeleteObserver(String),
    Subscribe {
        observer: String,
        topic: String,
    },
    Unsubscribe {
        observer: String,
        topic: String,
    },
    Publish {
        producer: String,
        topic: String,
        content: String,
    },
    Messages(String),
    Log,
    List,
    Save,
    Load,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Split off the first whitespace-delimited word.
fn next_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], &input[end..]))
}

fn one_arg(rest: &str, usage: &'static str) -> Result<String, ParseError> {
    match next_word(rest) {
        Some((arg, tail)) if tail.trim().is_empty() => Ok(arg.to_string()),
        _ => Err(ParseError::Usage(usage)),
    }
}

fn two_args(rest: &str, usage: &'static str) -> Result<(String, String), ParseError> {
    let (first, rest) = next_word(rest).ok_or(ParseError::Usage(usage))?;
    let second = one_arg(rest, usage)?;
    Ok((first.to_string(), second))
}

fn no_args(rest: &str, command: Command, usage: &'static str) -> Result<Command, ParseError> {
    if rest.trim().is_empty() {
        Ok(command)
    } else {
        Err(ParseError::Usage(usage))
    }
}

/// Parse a command line. Publish content is everything after the topic,
/// with surrounding whitespace trimmed.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let (name, rest) = next_word(line).ok_or(ParseError::Empty)?;

    match name.to_lowercase().as_str() {
        "create-topic" => Ok(Command::CreateTopic(one_arg(rest, USAGE[0])?)),
        "delete-topic" => Ok(Command::DeleteTopic(one_arg(rest, USAGE[1])?)),
        "create-producer" => Ok(Command::CreateProducer(one_arg(rest, USAGE[2])?)),
        "delete-producer" => Ok(Command::DeleteProducer(one_arg(rest, USAGE[3])?)),
        "create-observer" => Ok(Command::CreateObserver(one_arg(rest, USAGE[4])?)),
        "delete-observer" => Ok(Command::DeleteObserver(one_arg(rest, USAGE[5])?)),
        "subscribe" => {
            let (observer, topic) = two_args(rest, USAGE[6])?;
            Ok(Command::Subscribe { observer, topic })
        }
        "unsubscribe" => {
            let (observer, topic) = two_args(rest, USAGE[7])?;
            Ok(Command::Unsubscribe { observer, topic })
        }
        "publish" => {
            let usage = USAGE[8];
            let (producer, rest) = next_word(rest).ok_or(ParseError::Usage(usage))?;
            let (topic, rest) = next_word(rest).ok_or(ParseError::Usage(usage))?;
            let content = rest.trim();
            if content.is_empty() {
                return Err(ParseError::Usage(usage));
            }
            Ok(Command::Publish {
                producer: producer.to_string(),
                topic: topic.to_string(),
                content: content.to_string(),
            })
        }
        "messages" => Ok(Command::Messages(one_arg(rest, USAGE[9])?)),
        "log" => no_args(rest, Command::Log, USAGE[10]),
        "list" => no_args(rest, Command::List, USAGE[11]),
        "save" => no_args(rest, Command::Save, USAGE[12]),
        "load" => no_args(rest, Command::Load, USAGE[13]),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}
