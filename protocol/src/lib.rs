//! JSON wire format between the match server and the browser client.
//!
//! Every message is an envelope `{"type": ..., "payload": ...}`. Inbound messages are shape-checked on decode, a
//! message that decodes but does not fit the board is rejected before it reaches the view.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skirmish_core::{
    ActionCallback, Board, Coord, Coord2, GameAction, MatchEvent, Player, PossibleActions, ProcessedAction, Spell,
    TurnContext,
};

pub use error::*;

mod error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PossibleActionsPayload {
    pub player_mode: Player,
    pub transient_board: Board,
    /// Free-form extras. A spell being aimed travels as `{"spell": {...}}`.
    #[serde(default)]
    pub additional_data: Value,
}

impl PossibleActionsPayload {
    pub fn previewed_spell(&self) -> Option<Spell> {
        let spell = self.additional_data.get("spell")?;
        if spell.is_null() {
            return None;
        }
        match Spell::deserialize(spell) {
            Ok(spell) => Some(spell),
            Err(err) => {
                log::warn!("ignoring malformed spell in possible actions: {}", err);
                None
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionErrorPayload {
    pub message: String,
}

/// Messages pushed by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerMsg {
    PossibleActions(PossibleActionsPayload),
    ProcessedAction(ProcessedAction),
    ActionCallback(ActionCallback),
    TurnContext(TurnContext),
    ActionError(ActionErrorPayload),
}

impl ServerMsg {
    pub const TYPES: [&'static str; 5] = [
        "possibleActions",
        "processedAction",
        "actionCallback",
        "turnContext",
        "actionError",
    ];

    pub fn into_event(self) -> MatchEvent {
        match self {
            Self::PossibleActions(payload) => MatchEvent::PossibleActions(PossibleActions {
                previewed_spell: payload.previewed_spell(),
                player: payload.player_mode,
                transient_board: payload.transient_board,
            }),
            Self::ProcessedAction(event) => MatchEvent::ProcessedAction(event),
            Self::ActionCallback(callback) => MatchEvent::ActionCallback(callback),
            Self::TurnContext(context) => MatchEvent::TurnContext(context),
            Self::ActionError(ActionErrorPayload { message }) => MatchEvent::ActionError { message },
        }
    }
}

/// Decodes and validates one server message for a board of `board_size`.
pub fn decode(text: &str, board_size: Coord) -> Result<MatchEvent> {
    let value: Value = serde_json::from_str(text)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?;
    if !ServerMsg::TYPES.contains(&kind) {
        return Err(ProtocolError::UnknownType(kind.to_owned()));
    }

    let event = ServerMsg::deserialize(&value)?.into_event();
    event.validate(board_size)?;
    log::trace!("decoded {}", event.kind_name());
    Ok(event)
}

/// Commands the client sends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientMsg {
    SubmitAction { action: GameAction },
    /// Asks for the preview board of the unit or cell at `coords`.
    RequestPossibleActions { coords: Coord2 },
    EndTurn,
}

impl ClientMsg {
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
