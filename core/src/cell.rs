use bitflags::{Flags, bitflags};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::*;

bitflags! {
    /// Per-cell status flags.
    ///
    /// The low byte holds the core values. They each occupy their own bit but a cell carries at most one of them.
    /// Modifiers start at bit 8 so they never collide with a core value and combine freely.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CellState: u32 {
        const FRESHLY_SPAWNED = 1;
        const MANA_BUBBLE     = 1 << 1;
        const SHIELDED        = 1 << 8;
        const ACCELERATED     = 1 << 9;
        const ARCHER          = 1 << 10;
    }
}

bitflags! {
    /// Annotations only the owner of a cell gets to see.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct HiddenState: u8 {
        const MINE_TRAP = 1;
    }
}

const DESCRIPTIONS: &[(CellState, &str)] = &[
    (
        CellState::MANA_BUBBLE,
        "Mana bubble: a unit entering this cell collects bonus mana.",
    ),
    (
        CellState::SHIELDED,
        "Shielded: the next attack against this unit is absorbed.",
    ),
    (
        CellState::ACCELERATED,
        "Accelerated: this unit may move twice this turn.",
    ),
    (
        CellState::ARCHER,
        "Archer: attacks from range without moving.",
    ),
];

impl CellState {
    /// Bits reserved for mutually-exclusive core values.
    pub const CORE_MASK: u32 = 0xff;

    /// True when any bit of `flag` is set, works the same for core values and modifiers.
    pub const fn has(self, flag: Self) -> bool {
        self.bits() & flag.bits() != 0
    }

    pub const fn is_core_state(self) -> bool {
        self.bits() & Self::CORE_MASK != 0
    }

    pub fn core(self) -> Self {
        Self::from_bits_retain(self.bits() & Self::CORE_MASK)
    }

    pub fn modifiers(self) -> Self {
        Self::from_bits_retain(self.bits() & !Self::CORE_MASK)
    }

    /// Every defined flag intersecting `self`, lowest bit first.
    pub fn active_states(self) -> impl Iterator<Item = CellState> + Clone {
        Self::FLAGS
            .iter()
            .map(|flag| *flag.value())
            .filter(move |&flag| self.has(flag))
    }

    /// Name and rules text for each of [`Self::active_states`], in the same order.
    ///
    /// Flags without authored text yield an empty string so both sequences stay aligned, callers filter them.
    pub fn active_state_descriptions(self) -> impl Iterator<Item = &'static str> + Clone {
        self.active_states().map(Self::description)
    }

    pub fn description(flag: CellState) -> &'static str {
        DESCRIPTIONS
            .iter()
            .find(|(described, _)| *described == flag)
            .map_or("", |(_, text)| *text)
    }
}

impl Serialize for CellState {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for CellState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::from_bits_retain)
    }
}

impl Serialize for HiddenState {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for HiddenState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        u8::deserialize(deserializer).map(Self::from_bits_retain)
    }
}

/// Rendering hint attached to a cell by the client, never gameplay state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransientState {
    #[default]
    None,
    Selected,
    CanBeMovedInto,
    CanBeSpawnedInto,
    CanBeAttacked,
    CanBeSpellTargeted,
}

impl TransientState {
    pub const fn is_selectable(self) -> bool {
        !matches!(self, Self::None | Self::Selected)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub row: Coord,
    pub col: Coord,
    #[serde(default)]
    pub owner: Option<Player>,
    #[serde(default)]
    pub is_master: bool,
    #[serde(default)]
    pub state: CellState,
    #[serde(default)]
    pub hidden: HiddenState,
    #[serde(default)]
    pub transient: TransientState,
}

impl Cell {
    pub const fn empty((row, col): Coord2) -> Self {
        Self {
            row,
            col,
            owner: None,
            is_master: false,
            state: CellState::empty(),
            hidden: HiddenState::empty(),
            transient: TransientState::None,
        }
    }

    pub const fn coords(&self) -> Coord2 {
        (self.row, self.col)
    }

    pub const fn is_occupied(&self) -> bool {
        self.owner.is_some()
    }

    /// The same cell without its rendering hint. Hidden state is kept, it only reaches the owner's client.
    pub const fn without_transient(self) -> Self {
        Self {
            transient: TransientState::None,
            ..self
        }
    }
}
