use super::tile::can_merge;
use super::{Board, Move, Position, Tile, Vector, SIZE};

/// What a single in-place slide did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slide {
    /// Sum of the values of tiles created by merges.
    pub points: u64,
    /// True if any tile changed cell.
    pub moved: bool,
}

/// Result of [`apply_move`]: a fresh board plus the updated running score.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub board: Board,
    pub score: u64,
    pub moved: bool,
}

/// Slide/merge a copy of `board` in `direction`. No random tile is added.
///
/// `score` comes back increased by the value of every merged tile.
pub fn apply_move(board: &Board, score: u64, direction: Move) -> MoveOutcome {
    let mut board = board.clone();
    let slide = board.slide(direction);
    MoveOutcome { board, score: score + slide.points, moved: slide.moved }
}

/// Visiting order for one slide: the cells farthest along the vector come first.
struct Traversals {
    x: [i8; SIZE],
    y: [i8; SIZE],
}

fn build_traversals(vector: Vector) -> Traversals {
    let mut x = [0, 1, 2, 3];
    let mut y = [0, 1, 2, 3];
    if vector.x == 1 {
        x.reverse();
    }
    if vector.y == 1 {
        y.reverse();
    }
    Traversals { x, y }
}

struct Farthest {
    /// Last empty cell before an obstacle (or the start cell itself).
    farthest: Position,
    /// First cell that is off the board or occupied.
    next: Position,
}

fn find_farthest_position(board: &Board, cell: Position, vector: Vector) -> Farthest {
    let mut farthest = cell;
    let mut next = cell.step(vector);
    while board.cell_available(next) {
        farthest = next;
        next = next.step(vector);
    }
    Farthest { farthest, next }
}

impl Board {
    /// Slide and merge every tile in `direction`, in place.
    ///
    /// A tile produced by a merge during this call never merges again in the
    /// same call, so `[2, 2, 2, 2]` becomes `[4, 4, _, _]` and not `[8, _, _, _]`.
    ///
    /// ```
    /// use agent_2048::engine::{Board, Move};
    /// let mut b: Board = "2,2,2,2/0,0,0,0/0,0,0,0/0,0,0,0".parse().unwrap();
    /// let slide = b.slide(Move::Left);
    /// assert_eq!(slide.points, 8);
    /// assert_eq!(b.rows()[0], [4, 4, 0, 0]);
    /// ```
    pub fn slide(&mut self, direction: Move) -> Slide {
        let vector = direction.vector();
        let traversals = build_traversals(vector);
        let mut slide = Slide::default();
        self.prepare_tiles();

        for &x in &traversals.x {
            for &y in &traversals.y {
                let cell = Position::new(x, y);
                let Some(tile) = self.cell_content(cell) else { continue };
                let (id, value) = (tile.id(), tile.value());
                let positions = find_farthest_position(self, cell, vector);

                let merge_with = self
                    .cell_content(positions.next)
                    .filter(|next| can_merge(next.value(), value) && next.merged_from().is_none())
                    .map(Tile::id);

                if let Some(next_id) = merge_with {
                    self.remove_tile(cell);
                    self.remove_tile(positions.next);
                    let mut merged = Tile::new(positions.next, value * 2);
                    merged.merged_from = Some((id, next_id));
                    self.insert_tile(merged);
                    slide.points += u64::from(value * 2);
                    slide.moved = true;
                } else if positions.farthest != cell {
                    self.move_tile(cell, positions.farthest);
                    slide.moved = true;
                }
            }
        }
        slide
    }
}
