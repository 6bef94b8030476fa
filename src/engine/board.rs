use std::fmt;
use std::str::FromStr;

use rand::Rng;

use super::snapshot::SnapshotError;
use super::tile::{can_merge, is_tile_value, Tile, TileId};
use super::{Position, CELLS, FOUR_PROBABILITY, SIZE};

/// The 4x4 grid of optional tiles.
///
/// Cells are indexed `[x][y]`. Every tile lives in exactly one cell and its
/// recorded position always equals that cell. Cloning deep-copies every tile,
/// so a clone can be mutated freely without touching the original.
///
/// Two boards compare equal when they hold the same values in the same cells
/// and agree on `over`; tile ids and merge bookkeeping are ignored.
#[derive(Clone, Default)]
pub struct Board {
    cells: [[Option<Tile>; SIZE]; SIZE],
    over: bool,
    next_id: u32,
}

impl Board {
    /// An empty board.
    pub fn new() -> Self { Self::default() }

    /// Build a board from row-major values, 0 meaning empty.
    ///
    /// ```
    /// use agent_2048::engine::Board;
    /// let b = Board::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 4]]).unwrap();
    /// assert_eq!(b.available_cells().len(), 14);
    /// ```
    pub fn from_rows(rows: [[u32; SIZE]; SIZE]) -> Result<Self, SnapshotError> {
        for (y, row) in rows.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                if value != 0 && !is_tile_value(value) {
                    return Err(SnapshotError::InvalidValue { x, y, value });
                }
            }
        }
        Ok(Self::from_valid_rows(&rows))
    }

    fn from_valid_rows(rows: &[[u32; SIZE]; SIZE]) -> Self {
        let mut board = Board::new();
        for (y, row) in rows.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                if value != 0 {
                    board.insert_tile(Tile::new(Position::new(x as i8, y as i8), value));
                }
            }
        }
        board
    }

    /// Row-major values, 0 meaning empty.
    pub fn rows(&self) -> [[u32; SIZE]; SIZE] {
        let mut rows = [[0u32; SIZE]; SIZE];
        for tile in self.tiles() {
            let p = tile.position();
            rows[p.y as usize][p.x as usize] = tile.value();
        }
        rows
    }

    #[inline]
    pub fn within_bounds(&self, pos: Position) -> bool {
        (0..SIZE as i8).contains(&pos.x) && (0..SIZE as i8).contains(&pos.y)
    }

    /// True if `pos` is on the board and empty.
    #[inline]
    pub fn cell_available(&self, pos: Position) -> bool {
        self.within_bounds(pos) && self.cell_content(pos).is_none()
    }

    /// The tile at `pos`, or `None` when empty or off the board.
    #[inline]
    pub fn cell_content(&self, pos: Position) -> Option<&Tile> {
        if !self.within_bounds(pos) {
            return None;
        }
        self.cells[pos.x as usize][pos.y as usize].as_ref()
    }

    /// True if at least one cell is empty.
    pub fn cells_available(&self) -> bool {
        self.cells.iter().flatten().any(Option::is_none)
    }

    /// All empty cells, column by column.
    pub fn available_cells(&self) -> Vec<Position> {
        let mut out = Vec::with_capacity(CELLS);
        for (x, column) in self.cells.iter().enumerate() {
            for (y, cell) in column.iter().enumerate() {
                if cell.is_none() {
                    out.push(Position::new(x as i8, y as i8));
                }
            }
        }
        out
    }

    /// A uniformly random empty cell, `None` on a full board.
    pub fn random_available_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        let cells = self.available_cells();
        if cells.is_empty() {
            return None;
        }
        Some(cells[rng.gen_range(0..cells.len())])
    }

    /// Place `tile` at its recorded position and assign it a fresh id.
    ///
    /// Panics if the position is off the board or already occupied.
    pub fn insert_tile(&mut self, mut tile: Tile) -> TileId {
        let pos = tile.position();
        assert!(self.within_bounds(pos), "tile position {pos} out of bounds");
        let slot = &mut self.cells[pos.x as usize][pos.y as usize];
        assert!(slot.is_none(), "cell {pos} is already occupied");
        self.next_id = self.next_id.wrapping_add(1);
        tile.id = TileId(self.next_id);
        let id = tile.id;
        *slot = Some(tile);
        id
    }

    /// Clear the cell at `pos`, handing back the tile that was there.
    pub fn remove_tile(&mut self, pos: Position) -> Option<Tile> {
        if !self.within_bounds(pos) {
            return None;
        }
        self.cells[pos.x as usize][pos.y as usize].take()
    }

    /// Insert a 2 (90%) or 4 (10%) into a random empty cell.
    ///
    /// Returns where the tile landed, or `None` if the board is full.
    pub fn add_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Position> {
        let pos = self.random_available_cell(rng)?;
        let value = if rng.gen_bool(FOUR_PROBABILITY) { 4 } else { 2 };
        self.insert_tile(Tile::new(pos, value));
        Some(pos)
    }

    /// Iterate over occupied cells, column by column.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.cells.iter().flatten().flatten()
    }

    /// Highest tile value on the board, 0 when empty.
    pub fn highest_tile(&self) -> u32 {
        self.tiles().map(Tile::value).max().unwrap_or(0)
    }

    /// True if some move would change the board: an empty cell exists or two
    /// orthogonal neighbours can merge.
    pub fn has_moves(&self) -> bool {
        self.cells_available() || self.tile_matches_available()
    }

    fn tile_matches_available(&self) -> bool {
        self.tiles().any(|tile| {
            let p = tile.position();
            [Position::new(p.x + 1, p.y), Position::new(p.x, p.y + 1)]
                .into_iter()
                .filter_map(|n| self.cell_content(n))
                .any(|other| can_merge(other.value(), tile.value()))
        })
    }

    /// Terminal flag supplied by the game context. The search reads it but never sets it.
    #[inline]
    pub fn is_over(&self) -> bool { self.over }

    #[inline]
    pub fn set_over(&mut self, over: bool) { self.over = over; }

    /// Pack into sixteen 4-bit exponents, row-major, first cell in the top nibble.
    ///
    /// Returns `None` if a tile is larger than 2^15.
    pub fn pack(&self) -> Option<u64> {
        let mut raw = 0u64;
        for tile in self.tiles() {
            let exp = tile.exponent() as u64;
            if exp > 0xf {
                return None;
            }
            let p = tile.position();
            let idx = p.y as usize * SIZE + p.x as usize;
            raw |= exp << ((CELLS - 1 - idx) * 4);
        }
        Some(raw)
    }

    /// Inverse of [`Board::pack`]. The `over` flag is not part of the packed form.
    pub fn unpack(raw: u64) -> Self {
        let mut board = Board::new();
        for idx in 0..CELLS {
            let exp = (raw >> ((CELLS - 1 - idx) * 4)) & 0xf;
            if exp != 0 {
                let pos = Position::new((idx % SIZE) as i8, (idx / SIZE) as i8);
                board.insert_tile(Tile::new(pos, 1 << exp));
            }
        }
        board
    }

    /// Relocate the tile at `from` to the empty cell `to`, keeping its id.
    pub(crate) fn move_tile(&mut self, from: Position, to: Position) {
        if from == to {
            return;
        }
        if let Some(mut tile) = self.remove_tile(from) {
            debug_assert!(self.cell_available(to));
            tile.position = to;
            self.cells[to.x as usize][to.y as usize] = Some(tile);
        }
    }

    /// Forget merge bookkeeping from the previous slide.
    pub(crate) fn prepare_tiles(&mut self) {
        for tile in self.cells.iter_mut().flatten().flatten() {
            tile.merged_from = None;
        }
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.over == other.over && self.rows() == other.rows()
    }
}

impl Eq for Board {}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board").field("rows", &self.rows()).field("over", &self.over).finish()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-------------------------------";
        for (i, row) in self.rows().iter().enumerate() {
            if i > 0 {
                writeln!(f, "{rule}")?;
            }
            let cells: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(val: u32) -> String {
    match val {
        0 => " ".repeat(7),
        v => format!("{v:^7}"),
    }
}

/// Error parsing the `a,b,c,d/e,f,g,h/...` text form of a board.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseBoardError {
    #[error("expected 4 rows, found {0}")]
    RowCount(usize),
    #[error("row {row}: expected 4 cells, found {found}")]
    ColumnCount { row: usize, found: usize },
    #[error("row {row}, column {col}: `{text}` is not a tile value")]
    Value { row: usize, col: usize, text: String },
}

impl FromStr for Board {
    type Err = ParseBoardError;

    /// Rows separated by `/`, cells by `,`; `0` or `.` marks an empty cell.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.trim().split('/').collect();
        if lines.len() != SIZE {
            return Err(ParseBoardError::RowCount(lines.len()));
        }
        let mut rows = [[0u32; SIZE]; SIZE];
        for (row, line) in lines.iter().enumerate() {
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            if cells.len() != SIZE {
                return Err(ParseBoardError::ColumnCount { row, found: cells.len() });
            }
            for (col, text) in cells.iter().enumerate() {
                let value = match *text {
                    "." | "" => 0,
                    t => t.parse::<u32>().ok().filter(|&v| v == 0 || is_tile_value(v)).ok_or_else(|| {
                        ParseBoardError::Value { row, col, text: t.to_string() }
                    })?,
                };
                rows[row][col] = value;
            }
        }
        Ok(Board::from_valid_rows(&rows))
    }
}
