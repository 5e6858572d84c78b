use thiserror::Error;

use crate::Coord;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("Invalid coordinates ({0}, {1})")]
    InvalidCoords(Coord, Coord),
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Cell at ({0}, {1}) is stored at the wrong position")]
    MisplacedCell(Coord, Coord),
    #[error("More than one master cell for the same owner")]
    DuplicateMaster,
    #[error("Malformed event: {0}")]
    MalformedEvent(&'static str),
    #[error("No cell element to animate at ({0}, {1})")]
    MissingCellElement(Coord, Coord),
}

pub type Result<T> = core::result::Result<T, MatchError>;
