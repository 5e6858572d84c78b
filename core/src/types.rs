use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Single coordinate axis used for board size, rows and columns.
pub type Coord = u8;

/// Two-dimensional coordinates `(row, col)`.
pub type Coord2 = (Coord, Coord);

/// Timestamps and durations on the host clock, in milliseconds.
pub type Millis = u64;

/// Coordinates touched by a single action or effect, rarely more than a handful.
pub type CoordList = SmallVec<[Coord2; 4]>;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Player {
    Player1,
    Player2,
}

impl Player {
    pub const fn is_player1(self) -> bool {
        matches!(self, Self::Player1)
    }

    /// The player whose turn it is, from the `isPlayer1Turn` flag.
    pub const fn to_act(is_player1_turn: bool) -> Self {
        if is_player1_turn {
            Self::Player1
        } else {
            Self::Player2
        }
    }
}
