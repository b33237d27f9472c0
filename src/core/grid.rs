//! Grid Primitives
//!
//! Integer cell coordinates and the four cardinal directions.
//! Coordinates are `(row, col)` to match the wire format.

use serde::{Serialize, Serializer};

// =============================================================================
// CELL
// =============================================================================

/// A single cell on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cell {
    /// Row index (0 = top)
    pub row: i32,
    /// Column index (0 = left)
    pub col: i32,
}

impl Cell {
    /// Create a cell.
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Cell one step away in `direction`.
    #[inline]
    pub fn step(self, direction: Direction) -> Self {
        self.offset(direction, 1)
    }

    /// Cell `distance` steps away in `direction`.
    #[inline]
    pub fn offset(self, direction: Direction, distance: i32) -> Self {
        let (dr, dc) = direction.delta();
        Self::new(self.row + dr * distance, self.col + dc * distance)
    }

    /// Whether the cell lies strictly inside a `rows` x `cols` board,
    /// i.e. row in `[1, rows-2]` and col in `[1, cols-2]`.
    #[inline]
    pub fn is_interior(self, rows: i32, cols: i32) -> bool {
        self.row >= 1 && self.row <= rows - 2 && self.col >= 1 && self.col <= cols - 2
    }

    /// Clamp the cell into the interior of a `rows` x `cols` board.
    pub fn clamp_interior(self, rows: i32, cols: i32) -> Self {
        Self::new(self.row.clamp(1, rows - 2), self.col.clamp(1, cols - 2))
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.row, self.col].serialize(serializer)
    }
}

// =============================================================================
// DIRECTION
// =============================================================================

/// Cardinal movement direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards row 0 (`w`)
    Up,
    /// Towards col 0 (`a`)
    Left,
    /// Towards the last row (`s`)
    Down,
    /// Towards the last column (`d`)
    Right,
}

impl Direction {
    /// All directions, in key order `w a s d`.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    /// Parse a WASD key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "w" => Some(Direction::Up),
            "a" => Some(Direction::Left),
            "s" => Some(Direction::Down),
            "d" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Unit step as `(d_row, d_col)`.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Left => (0, -1),
            Direction::Down => (1, 0),
            Direction::Right => (0, 1),
        }
    }

    /// Direction pointing the other way.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
        }
    }

    /// True if `other` is a 180-degree turn from `self`.
    #[inline]
    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }

    /// True for `Up`/`Down`.
    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(Direction::from_key("w"), Some(Direction::Up));
        assert_eq!(Direction::from_key("a"), Some(Direction::Left));
        assert_eq!(Direction::from_key("s"), Some(Direction::Down));
        assert_eq!(Direction::from_key("d"), Some(Direction::Right));
        assert_eq!(Direction::from_key("W"), None);
        assert_eq!(Direction::from_key(""), None);
    }

    #[test]
    fn test_opposites() {
        for dir in Direction::ALL {
            assert!(dir.is_opposite(dir.opposite()));
            assert!(!dir.is_opposite(dir));
            let (dr, dc) = dir.delta();
            let (or, oc) = dir.opposite().delta();
            assert_eq!((dr + or, dc + oc), (0, 0));
        }
    }

    #[test]
    fn test_step_and_offset() {
        let cell = Cell::new(10, 10);
        assert_eq!(cell.step(Direction::Up), Cell::new(9, 10));
        assert_eq!(cell.step(Direction::Right), Cell::new(10, 11));
        assert_eq!(cell.offset(Direction::Down, 5), Cell::new(15, 10));
    }

    #[test]
    fn test_interior_bounds() {
        assert!(Cell::new(1, 1).is_interior(30, 50));
        assert!(Cell::new(28, 48).is_interior(30, 50));
        assert!(!Cell::new(0, 10).is_interior(30, 50));
        assert!(!Cell::new(29, 10).is_interior(30, 50));
        assert!(!Cell::new(10, 49).is_interior(30, 50));
        assert!(!Cell::new(10, -1).is_interior(30, 50));
    }

    #[test]
    fn test_clamp_interior() {
        assert_eq!(Cell::new(0, 0).clamp_interior(30, 50), Cell::new(1, 1));
        assert_eq!(Cell::new(40, 60).clamp_interior(30, 50), Cell::new(28, 48));
        assert_eq!(Cell::new(5, 6).clamp_interior(30, 50), Cell::new(5, 6));
    }

    #[test]
    fn test_cell_serializes_as_pair() {
        let json = serde_json::to_string(&Cell::new(3, 7)).unwrap();
        assert_eq!(json, "[3,7]");
    }
}
