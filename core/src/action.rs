use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Move,
    Attack,
    Spawn,
    Spell,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spell {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Spell {
    /// Name and rules text as shown while the spell resolves.
    pub fn display_text(&self) -> String {
        if self.description.is_empty() {
            self.name.clone()
        } else {
            format!("{}: {}", self.name, self.description)
        }
    }
}

/// Kind-specific payload of an action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionMeta {
    #[default]
    None,
    Attack {
        #[serde(default)]
        ranged: bool,
    },
    Spawn {
        coords: CoordList,
    },
    Spell {
        spell: Spell,
        /// Target groups, highlighted one after the other.
        #[serde(default)]
        formation: Vec<CoordList>,
    },
}

/// One resolved action, as reported by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAction {
    pub kind: ActionKind,
    pub player: Player,
    /// Absent for non-positional actions such as spell casts.
    #[serde(default)]
    pub source: Option<Coord2>,
    #[serde(default)]
    pub impacted: CoordList,
    #[serde(default)]
    pub meta: ActionMeta,
}

impl GameAction {
    pub fn validate(&self, size: Coord) -> Result<()> {
        let in_bounds = |coords: &Coord2| check_coords(*coords, size);

        if let Some(source) = self.source {
            check_coords(source, size)?;
        }
        self.impacted.iter().try_for_each(in_bounds)?;

        match (&self.meta, self.kind) {
            (ActionMeta::Spawn { coords }, ActionKind::Spawn) => {
                coords.iter().try_for_each(in_bounds)?
            }
            (ActionMeta::Spell { formation, .. }, ActionKind::Spell) => formation
                .iter()
                .flat_map(|group| group.iter())
                .try_for_each(in_bounds)?,
            (ActionMeta::Spell { .. }, _) | (_, ActionKind::Spell) => {
                return Err(MatchError::MalformedEvent(
                    "spell metadata does not match the action kind",
                ));
            }
            (ActionMeta::Attack { .. }, ActionKind::Move | ActionKind::Spawn)
            | (ActionMeta::Spawn { .. }, ActionKind::Move | ActionKind::Attack) => {
                return Err(MatchError::MalformedEvent(
                    "action metadata does not match its kind",
                ));
            }
            _ => {}
        }

        let positional = matches!(self.kind, ActionKind::Move | ActionKind::Attack);
        if positional && self.source.is_none() {
            return Err(MatchError::MalformedEvent(
                "positional action without a source",
            ));
        }
        if positional && self.impacted.is_empty() {
            return Err(MatchError::MalformedEvent(
                "positional action without a target",
            ));
        }
        Ok(())
    }

    pub fn is_ranged(&self) -> bool {
        matches!(self.meta, ActionMeta::Attack { ranged: true })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDeath {
    pub coords: Coord2,
    #[serde(default)]
    pub owner: Option<Player>,
    #[serde(default)]
    pub was_master: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResources {
    pub hp: u32,
    pub max_hp: u32,
    pub mp: u32,
    pub max_mp: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBundle {
    pub player1: PlayerResources,
    pub player2: PlayerResources,
}

impl ResourceBundle {
    pub const fn of(&self, player: Player) -> &PlayerResources {
        match player {
            Player::Player1 => &self.player1,
            Player::Player2 => &self.player2,
        }
    }
}

/// Authoritative board plus resources, as confirmed by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameContext {
    pub board: Board,
    #[serde(default)]
    pub resources: ResourceBundle,
}

impl GameContext {
    pub fn new(board: Board, resources: ResourceBundle) -> Self {
        Self { board, resources }
    }

    pub fn validate(&self, size: Coord) -> Result<()> {
        if self.board.size() != size {
            return Err(MatchError::InvalidBoardShape);
        }
        self.board.validate()
    }
}

/// Secondary effect chained to an earlier action, e.g. a delayed mine detonation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCallback {
    pub id: u64,
    pub parent_action: GameAction,
    #[serde(default)]
    pub parent_callback_id: Option<u64>,
    #[serde(default)]
    pub causing_spell: Option<Spell>,
    #[serde(default)]
    pub impacted_coords: Option<CoordList>,
    #[serde(default)]
    pub deaths: Vec<CellDeath>,
    /// Becomes current once the callback animation finishes.
    pub updated_context: GameContext,
}

impl ActionCallback {
    pub fn validate(&self, size: Coord) -> Result<()> {
        if self.parent_callback_id == Some(self.id) {
            return Err(MatchError::MalformedEvent("callback chained to itself"));
        }
        self.parent_action.validate(size)?;
        self.impacted_coords
            .iter()
            .flatten()
            .try_for_each(|coords| check_coords(*coords, size))?;
        self.deaths
            .iter()
            .try_for_each(|death| check_coords(death.coords, size))?;
        self.updated_context.validate(size)
    }
}

pub(crate) fn check_coords(coords: Coord2, size: Coord) -> Result<()> {
    if coords.0 < size && coords.1 < size {
        Ok(())
    } else {
        Err(MatchError::InvalidCoords(coords.0, coords.1))
    }
}
