//! Text frame codec
//!
//! Inbound grammar: `[<roomId> ':'] '/' <verb> (':' <arg>)*`. The last
//! argument a verb expects takes the rest of the frame verbatim, so chat
//! text and board payloads may contain `:`.
//!
//! Outbound frames are `[EVENT_NAME]` optionally followed by `:arg` segments.

use std::fmt;

use crate::constants::{ARG_DELIMITER, CHAT_SEPARATOR, VERB_PREFIX};
use crate::core::message::{Command, GameEvent, RoomAction, RoomId, SoundEffect};
use crate::error::{RelayError, Result};

/// Cursor over the `:`-separated arguments following a verb
struct Args<'a> {
    verb: &'a str,
    rest: Option<&'a str>,
}

impl<'a> Args<'a> {
    /// Next single argument
    fn next(&mut self, name: &str) -> Result<&'a str> {
        let rest = self.rest.ok_or_else(|| self.missing(name))?;
        match rest.split_once(ARG_DELIMITER) {
            Some((arg, tail)) => {
                self.rest = Some(tail);
                Ok(arg)
            }
            None => {
                self.rest = None;
                Ok(rest)
            }
        }
    }

    /// Everything that is left, delimiters included
    fn remainder(&mut self, name: &str) -> Result<&'a str> {
        self.rest.take().ok_or_else(|| self.missing(name))
    }

    fn missing(&self, name: &str) -> RelayError {
        RelayError::MessageParseError(format!("/{} is missing argument <{}>", self.verb, name))
    }
}

/// Parse one inbound frame into a command
pub fn parse(frame: &str) -> Result<Command> {
    if frame.is_empty() {
        return Err(RelayError::MessageParseError("Empty frame".to_string()));
    }

    let (room_part, command_part) = match frame.strip_prefix(VERB_PREFIX) {
        Some(command) => (None, command),
        None => {
            let (room, rest) = frame.split_once(ARG_DELIMITER).ok_or_else(|| {
                RelayError::MessageParseError(format!("Missing command in frame: {}", frame))
            })?;
            let command = rest.strip_prefix(VERB_PREFIX).ok_or_else(|| {
                RelayError::MessageParseError(format!("Missing '/' before verb: {}", frame))
            })?;
            (Some(room), command)
        }
    };

    let (verb, rest) = match command_part.split_once(ARG_DELIMITER) {
        Some((verb, rest)) => (verb, Some(rest)),
        None => (command_part, None),
    };
    // Clients send `/heartbeat/`
    let verb = verb.trim_end_matches(VERB_PREFIX);
    if verb.is_empty() {
        return Err(RelayError::MessageParseError(format!(
            "Missing verb in frame: {}",
            frame
        )));
    }

    let mut args = Args { verb, rest };

    match verb {
        "heartbeat" => Ok(Command::Heartbeat),
        "startGame" => {
            let room_id = match room_part {
                Some(room) => RoomId::parse(room)?,
                None => RoomId::parse(args.remainder("roomId")?)?,
            };
            Ok(Command::StartGame { room_id })
        }
        "restartGame" => {
            let room_id = match room_part {
                Some(room) => RoomId::parse(room)?,
                None => RoomId::parse(args.remainder("roomId")?)?,
            };
            Ok(Command::RestartGame { room_id })
        }
        _ => {
            let action = parse_room_action(verb, &mut args)?;
            let room = room_part.ok_or_else(|| {
                RelayError::MessageParseError(format!("/{} requires a room id prefix", verb))
            })?;
            Ok(Command::Room {
                room_id: RoomId::parse(room)?,
                action,
            })
        }
    }
}

fn parse_room_action(verb: &str, args: &mut Args<'_>) -> Result<RoomAction> {
    if let Some(sfx) = SoundEffect::from_verb(verb) {
        return Ok(RoomAction::Sfx(sfx));
    }

    let action = match verb {
        "surrender" => RoomAction::Surrender,
        "restartRequest" => RoomAction::RestartRequest,
        "acceptRestart" => RoomAction::AcceptRestart,
        "openedSecurity" => RoomAction::OpenedSecurity,
        "chatMessage" => {
            args.next("opponent")?;
            RoomAction::Chat {
                text: args.remainder("text")?.to_string(),
            }
        }
        "updateGame" => RoomAction::UpdateGame {
            payload: args.remainder("payload")?.to_string(),
        },
        "moveCard" => {
            args.next("opponent")?;
            RoomAction::MoveCard {
                card_id: args.next("cardId")?.to_string(),
                from: args.next("from")?.to_string(),
                to: args.remainder("to")?.to_string(),
            }
        }
        "updateMemory" => {
            args.next("opponent")?;
            let raw = args.remainder("value")?;
            let value = raw.trim().parse::<i64>().map_err(|_| {
                RelayError::MessageParseError(format!("Memory value is not an integer: {}", raw))
            })?;
            RoomAction::UpdateMemory { value }
        }
        "attack" => {
            args.next("opponent")?;
            RoomAction::Attack {
                attacker: args.next("attackerId")?.to_string(),
                target: args.remainder("targetId")?.to_string(),
            }
        }
        unknown => return Err(RelayError::UnknownCommand(unknown.to_string())),
    };

    Ok(action)
}

/// Render `[NAME]` followed by `:arg` for every argument
pub fn render(event_name: &str, args: &[&str]) -> String {
    let mut frame = String::with_capacity(
        event_name.len() + 2 + args.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    frame.push('[');
    frame.push_str(event_name);
    frame.push(']');
    for arg in args {
        frame.push(ARG_DELIMITER);
        frame.push_str(arg);
    }
    frame
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartGame(_) => "START_GAME",
            Self::PlayerLeft => "PLAYER_LEFT",
            Self::Heartbeat => "HEARTBEAT",
            Self::Surrender => "SURRENDER",
            Self::Restart => "RESTART",
            Self::AcceptRestart => "ACCEPT_RESTART",
            Self::SecurityViewed => "SECURITY_VIEWED",
            Self::Sfx(sfx) => sfx.event_name(),
            Self::ChatMessage { .. } => "CHAT_MESSAGE",
            Self::UpdateOpponent(_) => "UPDATE_OPPONENT",
            Self::MoveCard { .. } => "MOVE_CARD",
            Self::UpdateMemory(_) => "UPDATE_MEMORY",
            Self::Attack { .. } => "ATTACK",
        }
    }

    /// Render this event as an outbound text frame
    pub fn render(&self) -> String {
        let name = self.name();
        match self {
            Self::StartGame(players) => render(name, &[players.as_str()]),
            Self::ChatMessage { sender, text } => {
                let line = format!("{}{}{}", sender, CHAT_SEPARATOR, text);
                render(name, &[line.as_str()])
            }
            Self::UpdateOpponent(payload) => render(name, &[payload.as_str()]),
            Self::MoveCard { card_id, from, to } => {
                render(name, &[card_id.as_str(), from.as_str(), to.as_str()])
            }
            Self::UpdateMemory(value) => render(name, &[value.to_string().as_str()]),
            Self::Attack { attacker, target } => {
                render(name, &[attacker.as_str(), target.as_str()])
            }
            Self::PlayerLeft
            | Self::Heartbeat
            | Self::Surrender
            | Self::Restart
            | Self::AcceptRestart
            | Self::SecurityViewed
            | Self::Sfx(_) => render(name, &[]),
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
