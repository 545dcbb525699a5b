//! Operator console - stages velocity commands on named aircraft.
//!
//! Accepted lines:
//!
//! ```text
//! <id> <vx> <vy> <vz>    stage a command
//! list                   show active aircraft
//! help                   show this help
//! quit                   close the console
//! ```

use airspace_core::{AircraftId, AirspaceStore, StoreError};
use chrono::{DateTime, Local};
use nalgebra::Vector3;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::display;
use crate::error::SimError;

pub const HELP: &str = "Commands:\n  <id> <vx> <vy> <vz>  send new velocity to aircraft\n  list                 show active aircraft\n  help                 show this help\n  quit                 close the console";

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatorRequest {
    Command { id: AircraftId, velocity: Vector3<f32> },
    List,
    Help,
    Quit,
}

/// What the console tells the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleReply {
    Accepted(String),
    NotFound(AircraftId),
    Text(String),
    Closed,
}

impl std::fmt::Display for ConsoleReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted(msg) => write!(f, "OK {}", msg),
            Self::NotFound(id) => write!(f, "Aircraft ID {} not found or inactive.", id),
            Self::Text(text) => write!(f, "{}", text),
            Self::Closed => write!(f, "Console closed."),
        }
    }
}

/// Parses one console line.
pub fn parse_request(line_no: usize, line: &str) -> Result<OperatorRequest, SimError> {
    let fields: Vec<&str> = line.split_whitespace().collect();

    match fields.as_slice() {
        ["list"] => Ok(OperatorRequest::List),
        ["help"] | ["?"] => Ok(OperatorRequest::Help),
        ["quit"] | ["exit"] => Ok(OperatorRequest::Quit),
        [id, vx, vy, vz] => {
            let id: i32 = id
                .parse()
                .map_err(|_| SimError::invalid_input(line_no, format!("bad aircraft id '{}'", id)))?;

            let mut velocity = Vector3::zeros();
            for (axis, field) in [vx, vy, vz].iter().enumerate() {
                velocity[axis] = field
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| SimError::invalid_input(line_no, format!("bad speed '{}'", field)))?;
            }

            Ok(OperatorRequest::Command {
                id: AircraftId(id),
                velocity,
            })
        }
        _ => Err(SimError::invalid_input(line_no, "expected '<id> <vx> <vy> <vz>' or 'help'")),
    }
}

/// Append-only, timestamped log of accepted commands.
#[derive(Debug, Clone)]
pub struct CommandAudit {
    path: PathBuf,
}

impl CommandAudit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, timestamp: DateTime<Local>, message: &str) -> Result<(), SimError> {
        use tokio::io::AsyncWriteExt;

        let line = format!("[{}] {}\n", timestamp.format("%F %T"), message);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Applies operator requests to the store.
pub struct OperatorConsole {
    store: AirspaceStore,
    audit: CommandAudit,
}

impl OperatorConsole {
    pub fn new(store: AirspaceStore, audit: CommandAudit) -> Self {
        Self { store, audit }
    }

    /// Applies one request to the store without auditing it.
    pub fn handle(&self, request: OperatorRequest) -> ConsoleReply {
        match request {
            OperatorRequest::Command { id, velocity } => match self.store.stage_command(id, velocity) {
                Ok(()) => {
                    let message = format!(
                        "Command sent to Aircraft {}: newSpeed({}, {}, {})",
                        id, velocity.x, velocity.y, velocity.z
                    );
                    info!("{}", message);
                    ConsoleReply::Accepted(message)
                }
                Err(StoreError::NotFound(id)) => ConsoleReply::NotFound(id),
                Err(e) => ConsoleReply::Text(e.to_string()),
            },
            OperatorRequest::List => ConsoleReply::Text(display::render_positions(&self.store.snapshot())),
            OperatorRequest::Help => ConsoleReply::Text(HELP.to_string()),
            OperatorRequest::Quit => ConsoleReply::Closed,
        }
    }

    /// Handles one request; accepted commands are appended to the audit log.
    pub async fn submit(&self, request: OperatorRequest, now: DateTime<Local>) -> ConsoleReply {
        let reply = self.handle(request);
        if let ConsoleReply::Accepted(message) = &reply {
            if let Err(e) = self.audit.record(now, message).await {
                warn!("Command not audited: {}", e);
            }
        }
        reply
    }

    /// Reads lines from `input` until quit, end of input or shutdown.
    ///
    /// Replies are written to `output`; malformed lines, including ones
    /// that are not UTF-8, print the problem and prompt again.
    pub async fn run<R, W>(self, mut input: R, mut output: W, shutdown: CancellationToken)
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut buf = Vec::new();
        let mut line_no = 0;
        let _ = writeln!(output, "\nOperator Console ('help' for commands)");

        loop {
            let _ = write!(output, "> ");
            let _ = output.flush();

            buf.clear();
            let read = tokio::select! {
                _ = shutdown.cancelled() => break,
                read = input.read_until(b'\n', &mut buf) => read,
            };

            match read {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Console input failed: {}", e);
                    break;
                }
            }
            line_no += 1;

            let parsed = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => parse_request(line_no, line),
                Err(_) => Err(SimError::invalid_input(line_no, "not valid UTF-8")),
            };

            let reply = match parsed {
                Ok(request) => self.submit(request, Local::now()).await,
                Err(e) => ConsoleReply::Text(format!("Invalid input: {}", e)),
            };
            let _ = writeln!(output, "{}", reply);

            if reply == ConsoleReply::Closed {
                break;
            }
        }

        info!("Operator console closed");
    }
}
