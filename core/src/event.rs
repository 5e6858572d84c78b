use serde::{Deserialize, Serialize};

use crate::*;

/// Preview state for the acting player: highlights and selectable cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PossibleActions {
    #[serde(rename = "playerMode")]
    pub player: Player,
    pub transient_board: Board,
    /// Spell being aimed, if the preview belongs to a spell cast.
    #[serde(default)]
    pub previewed_spell: Option<Spell>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedAction {
    pub action: GameAction,
    #[serde(rename = "playerMode")]
    pub player: Player,
    pub updated_context: GameContext,
    /// Optimistic board for the player who submitted the action.
    #[serde(default)]
    pub overriding_transient_board: Option<Board>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnContext {
    pub current_player_id: String,
    #[serde(rename = "isPlayer1Turn")]
    pub is_player1_turn: bool,
    pub remaining_time_s: u32,
    pub duration_s: u32,
    /// False on an initial sync such as a page reload.
    pub notify_turn_change: bool,
    #[serde(default)]
    pub pre_match_start: bool,
    pub game_context: GameContext,
}

impl TurnContext {
    pub const fn player_to_act(&self) -> Player {
        Player::to_act(self.is_player1_turn)
    }

    pub fn is_turn_of(&self, player: Player) -> bool {
        self.player_to_act() == player
    }
}

/// Inbound events from the remote engine.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchEvent {
    PossibleActions(PossibleActions),
    ProcessedAction(ProcessedAction),
    ActionCallback(ActionCallback),
    TurnContext(TurnContext),
    ActionError { message: String },
}

impl MatchEvent {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::PossibleActions(_) => "possible-actions",
            Self::ProcessedAction(_) => "processed-action",
            Self::ActionCallback(_) => "action-callback",
            Self::TurnContext(_) => "turn-context",
            Self::ActionError { .. } => "action-error",
        }
    }

    /// Checks the shape of the event against a board of `size` before anything acts on it.
    pub fn validate(&self, size: Coord) -> Result<()> {
        match self {
            Self::PossibleActions(event) => check_board(&event.transient_board, size),
            Self::ProcessedAction(event) => {
                event.action.validate(size)?;
                event.updated_context.validate(size)?;
                match &event.overriding_transient_board {
                    Some(board) => check_board(board, size),
                    None => Ok(()),
                }
            }
            Self::ActionCallback(callback) => callback.validate(size),
            Self::TurnContext(context) => context.game_context.validate(size),
            Self::ActionError { message } if message.trim().is_empty() => {
                Err(MatchError::MalformedEvent("empty action error message"))
            }
            Self::ActionError { .. } => Ok(()),
        }
    }
}

fn check_board(board: &Board, size: Coord) -> Result<()> {
    if board.size() != size {
        return Err(MatchError::InvalidBoardShape);
    }
    board.validate()
}
