use serde_json::{json, Value};

use crate::types::{Command, Direction, Snapshot, WorldInit};

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Input { dir: Direction },
    TogglePause,
    Continue,
    Restart,
    Stop,
    Ping { t: f64 },
}

impl ParsedClientMessage {
    /// Game command carried by the message, if any. `stop` and `ping` are handled
    /// by the connection itself.
    pub fn as_command(&self) -> Option<Command> {
        match self {
            Self::Input { dir } => Some(Command::Move(*dir)),
            Self::TogglePause => Some(Command::TogglePause),
            Self::Continue => Some(Command::Continue),
            Self::Restart => Some(Command::Restart),
            Self::Stop | Self::Ping { .. } => None,
        }
    }
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "toggle_pause" => Some(ParsedClientMessage::TogglePause),
        "continue" => Some(ParsedClientMessage::Continue),
        "restart" => Some(ParsedClientMessage::Restart),
        "stop" => Some(ParsedClientMessage::Stop),
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

pub fn welcome_message(world: &WorldInit) -> Value {
    json!({
        "type": "welcome",
        "world": world,
    })
}

pub fn state_message(snapshot: &Snapshot) -> Value {
    json!({
        "type": "state",
        "snapshot": snapshot,
    })
}

pub fn pong_message(t: f64) -> Value {
    json!({
        "type": "pong",
        "t": t,
    })
}

pub fn error_message(message: &str) -> Value {
    json!({
        "type": "error",
        "message": message,
    })
}
