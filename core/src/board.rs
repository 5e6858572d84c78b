use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Square grid of cells, addressed by `(row, col)`.
///
/// Boards are replaced wholesale on every update, so there is no API to patch a shared board in place. Mutable access
/// only exists on an owned copy, for building the next board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Cell>>", into = "Vec<Vec<Cell>>")]
pub struct Board {
    cells: Array2<Cell>,
}

impl Board {
    pub fn empty(size: Coord) -> Self {
        let size = usize::from(size);
        let cells = Array2::from_shape_fn((size, size), |(row, col)| {
            // both fit in Coord since they come from a Coord-sized shape
            Cell::empty((row as Coord, col as Coord))
        });
        Self { cells }
    }

    /// Builds a board from rows of cells, checking shape, cell positions and master uniqueness.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self> {
        let size = rows.len();
        if size == 0 || size > usize::from(Coord::MAX) {
            return Err(MatchError::InvalidBoardShape);
        }
        if rows.iter().any(|row| row.len() != size) {
            return Err(MatchError::InvalidBoardShape);
        }

        let flat: Vec<Cell> = rows.into_iter().flatten().collect();
        let cells =
            Array2::from_shape_vec((size, size), flat).map_err(|_| MatchError::InvalidBoardShape)?;
        let board = Self { cells };
        board.validate()?;
        Ok(board)
    }

    pub fn validate(&self) -> Result<()> {
        let mut masters = [false; 2];
        for ((row, col), cell) in self.cells.indexed_iter() {
            if (usize::from(cell.row), usize::from(cell.col)) != (row, col) {
                return Err(MatchError::MisplacedCell(cell.row, cell.col));
            }
            if let (true, Some(owner)) = (cell.is_master, cell.owner) {
                let seen = &mut masters[usize::from(!owner.is_player1())];
                if *seen {
                    return Err(MatchError::DuplicateMaster);
                }
                *seen = true;
            }
        }
        Ok(())
    }

    pub fn size(&self) -> Coord {
        // shape is square and bounded by Coord::MAX on construction
        self.cells.nrows() as Coord
    }

    pub fn contains_coords(&self, (row, col): Coord2) -> bool {
        let size = self.size();
        row < size && col < size
    }

    pub fn cell_at(&self, coords: Coord2) -> Option<&Cell> {
        self.cells.get(coords.to_nd_index())
    }

    pub fn cell_at_mut(&mut self, coords: Coord2) -> Option<&mut Cell> {
        self.cells.get_mut(coords.to_nd_index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = &Cell>> {
        self.cells.rows().into_iter().map(|row| row.into_iter())
    }

    /// A copy with every transient annotation cleared, as stored for an authoritative snapshot.
    pub fn without_transient(&self) -> Self {
        Self {
            cells: self.cells.mapv(Cell::without_transient),
        }
    }

    /// A copy with `annotation` set on each of `coords`, out-of-bounds coordinates are skipped.
    pub fn annotated(&self, coords: &[Coord2], annotation: TransientState) -> Self {
        let mut next = self.clone();
        for &pos in coords {
            if let Some(cell) = next.cell_at_mut(pos) {
                cell.transient = annotation;
            }
        }
        next
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

impl TryFrom<Vec<Vec<Cell>>> for Board {
    type Error = MatchError;

    fn try_from(rows: Vec<Vec<Cell>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl From<Board> for Vec<Vec<Cell>> {
    fn from(board: Board) -> Self {
        board
            .cells
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(coords: Coord2, owner: Player, is_master: bool) -> Cell {
        Cell {
            owner: Some(owner),
            is_master,
            ..Cell::empty(coords)
        }
    }

    #[test]
    fn empty_board_has_positioned_cells() {
        let board = Board::empty(3);

        assert_eq!(board.size(), 3);
        assert_eq!(board.iter().count(), 9);
        assert_eq!(board[(2, 1)].coords(), (2, 1));
        assert!(board.cell_at((3, 0)).is_none());
    }

    #[test]
    fn contains_coords_is_bounded_by_size() {
        let board = Board::empty(2);

        assert!(board.contains_coords((1, 1)));
        assert!(!board.contains_coords((2, 0)));
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let rows = vec![
            vec![Cell::empty((0, 0)), Cell::empty((0, 1))],
            vec![Cell::empty((1, 0))],
        ];

        assert_eq!(Board::from_rows(rows), Err(MatchError::InvalidBoardShape));
    }

    #[test]
    fn from_rows_rejects_misplaced_cells() {
        let rows = vec![
            vec![Cell::empty((0, 0)), Cell::empty((1, 1))],
            vec![Cell::empty((1, 0)), Cell::empty((0, 1))],
        ];

        assert_eq!(Board::from_rows(rows), Err(MatchError::MisplacedCell(1, 1)));
    }

    #[test]
    fn from_rows_rejects_second_master_for_same_owner() {
        let rows = vec![
            vec![
                unit((0, 0), Player::Player1, true),
                unit((0, 1), Player::Player1, true),
            ],
            vec![Cell::empty((1, 0)), unit((1, 1), Player::Player2, true)],
        ];

        assert_eq!(Board::from_rows(rows), Err(MatchError::DuplicateMaster));
    }

    #[test]
    fn serializes_as_rows_and_back() {
        let board = Board::empty(2).annotated(&[(1, 0)], TransientState::CanBeMovedInto);

        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(json[1][0]["transient"], "canBeMovedInto");

        let back: Board = serde_json::from_value(json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn annotations_are_cleared_on_a_copy() {
        let board = Board::empty(2).annotated(&[(0, 0), (5, 5)], TransientState::Selected);

        let cleared = board.without_transient();

        assert_eq!(board[(0, 0)].transient, TransientState::Selected);
        assert_eq!(cleared[(0, 0)].transient, TransientState::None);
    }
}
