//! Line-oriented command shell
//!
//! Translates one text command per line into a coordinator call and answers
//! with one JSON object per line. Mutations answer `{"success":…,"msg":…}`;
//! reads answer `{"messages":[…]}`, `{"logs":[…]}` or the entity listing.

pub mod command;

use std::future::Future;
use std::io;

use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::broker::{Coordinator, Outcome};

pub use command::{Command, ParseError, USAGE, parse};

fn reply<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| json!({ "success": false, "msg": e.to_string() }))
}

/// Run one command against the coordinator.
pub fn execute(coordinator: &Coordinator, command: Command) -> Value {
    let outcome = match command {
        Command::CreateTopic(id) => Outcome::from(coordinator.create_topic(&id)),
        Command::DeleteTopic(id) => Outcome::from(coordinator.delete_topic(&id)),
        Command::CreateProducer(id) => Outcome::from(coordinator.create_producer(&id)),
        Command::DeleteProducer(id) => Outcome::from(coordinator.delete_producer(&id)),
        Command::CreateObserver(id) => Outcome::from(coordinator.create_observer(&id)),
        Command::DeleteObserver(id) => Outcome::from(coordinator.delete_observer(&id)),
        Command::Subscribe { observer, topic } => {
            Outcome::from(coordinator.subscribe(&observer, &topic))
        }
        Command::Unsubscribe { observer, topic } => {
            Outcome::from(coordinator.unsubscribe(&observer, &topic))
        }
        Command::Publish {
            producer,
            topic,
            content,
        } => Outcome::from(coordinator.publish(&producer, &topic, &content)),
        Command::Save => Outcome::from(coordinator.save_snapshot()),
        Command::Load => Outcome::from(coordinator.load_snapshot()),
        Command::Messages(observer) => {
            return json!({ "messages": coordinator.observer_messages(&observer) });
        }
        Command::Log => return json!({ "logs": coordinator.message_log() }),
        Command::List => return reply(&coordinator.list_entities()),
        Command::Help => return json!({ "commands": USAGE }),
        Command::Quit => Outcome::ok("bye"),
    };
    reply(&outcome)
}

/// Read commands from `reader` until EOF or `quit`, writing one JSON reply
/// per command to `writer`.
pub async fn run<R, W>(coordinator: &Coordinator, reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => {
                debug!(?command, "executing");
                execute(coordinator, command)
            }
            Err(e) => {
                warn!(line = %line, "rejected command: {e}");
                reply(&Outcome::failed(e.to_string()))
            }
        };

        writer.write_all(format!("{response}\n").as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Why a shell session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Input reached EOF or `quit`.
    Finished,
    /// `shutdown` resolved while the session was still reading.
    Interrupted,
}

/// Like [`run`], but stops as soon as `shutdown` resolves, even if a read is
/// still pending.
pub async fn serve<R, W, F>(
    coordinator: &Coordinator,
    reader: R,
    writer: W,
    shutdown: F,
) -> io::Result<Exit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    tokio::select! {
        result = run(coordinator, reader, writer) => result.map(|()| Exit::Finished),
        () = shutdown => Ok(Exit::Interrupted),
    }
}
