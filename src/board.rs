//! Board: walled grid, active piece placement, collision, lock and line clear.
//!
//! Two grids are kept. `cells` is what gets drawn: walls, locked cells and the
//! active piece added on top. `stage` holds only walls and locked cells; it is
//! the collision source and the working copy for line compaction, and is
//! re-synchronised from `cells` on every clear pass.

use crate::piece::{ActivePiece, PIECE_SIZE, PieceShape, all_shapes};
use rand::Rng;
use rand::rngs::StdRng;

pub const BOARD_HEIGHT: usize = 21;
pub const BOARD_WIDTH: usize = 12;

pub const EMPTY: u8 = 0;
/// Boundary and locked cells.
pub const WALL: u8 = 9;

/// Row holding the bottom wall. The row under it is padding for the 4x4 box.
pub const FLOOR_ROW: usize = BOARD_HEIGHT - 2;
/// Column holding the right wall. The column after it is padding.
pub const RIGHT_WALL_COL: usize = BOARD_WIDTH - 2;

pub const SPAWN_X: i32 = PIECE_SIZE as i32;
pub const SPAWN_Y: i32 = 0;

/// Points per completed row.
pub const LINE_BONUS: u32 = 10;
/// Rows moved down per completed row; tied to piece height.
const SHIFT_WINDOW: usize = PIECE_SIZE;

/// Fixed-size grid of cell values. Row 0 is the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: [[u8; BOARD_WIDTH]; BOARD_HEIGHT],
}

impl Grid {
    fn walled() -> Self {
        let mut cells = [[EMPTY; BOARD_WIDTH]; BOARD_HEIGHT];
        for (row, line) in cells.iter_mut().enumerate().take(FLOOR_ROW + 1) {
            for (col, cell) in line.iter_mut().enumerate().take(RIGHT_WALL_COL + 1) {
                if col == 0 || col == RIGHT_WALL_COL || row == FLOOR_ROW {
                    *cell = WALL;
                }
            }
        }
        Self { cells }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        self.cells.get(row).and_then(|line| line.get(col)).copied()
    }

    /// Cell value for a signed probe; `None` outside the walled region.
    fn probe(&self, row: i32, col: i32) -> Option<u8> {
        if row < 0 || col < 0 || row as usize > FLOOR_ROW || col as usize > RIGHT_WALL_COL {
            return None;
        }
        self.get(row as usize, col as usize)
    }

    fn cell_mut(&mut self, row: i32, col: i32) -> &mut u8 {
        assert!(
            row >= 0 && col >= 0 && (row as usize) < BOARD_HEIGHT && (col as usize) < BOARD_WIDTH,
            "piece cell ({row}, {col}) is off the {BOARD_HEIGHT}x{BOARD_WIDTH} grid"
        );
        &mut self.cells[row as usize][col as usize]
    }

    fn copy_row(&mut self, src: usize, dst: usize) {
        self.cells[dst] = self.cells[src];
    }

    fn is_row_complete(&self, row: usize) -> bool {
        self.cells[row][1..RIGHT_WALL_COL].iter().all(|&v| v != EMPTY)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8; BOARD_WIDTH]> {
        self.cells.iter()
    }
}

/// Result of one gravity step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Piece moved down one row.
    Fell,
    /// Piece locked; lists the rows found complete, in detection order.
    Locked { cleared: Vec<usize> },
}

#[derive(Debug, Clone)]
pub struct Board {
    cells: Grid,
    stage: Grid,
    piece: ActivePiece,
    score: u32,
    rng: StdRng,
}

impl Board {
    /// Builds the walls and spawns the first piece.
    pub fn new(mut rng: StdRng) -> Self {
        let shape = random_shape(&mut rng);
        let mut board = Self {
            cells: Grid::walled(),
            stage: Grid::walled(),
            piece: ActivePiece::new(shape, SPAWN_X, SPAWN_Y),
            score: 0,
            rng,
        };
        board.place_piece();
        board
    }

    pub fn piece(&self) -> &ActivePiece {
        &self.piece
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Committed grid snapshot for rendering.
    pub fn grid(&self) -> &Grid {
        &self.cells
    }

    /// True if the active piece's matrix anchored at (x, y) would overlap a
    /// wall or locked cell.
    pub fn is_colliding(&self, x: i32, y: i32) -> bool {
        self.piece
            .cells()
            .any(|(row, col)| self.stage.probe(y + row, x + col).is_none_or(|v| v != EMPTY))
    }

    /// Moves the piece without validation; check `is_colliding` first.
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.lift_piece();
        self.piece.x = x;
        self.piece.y = y;
        self.place_piece();
    }

    /// Rotates clockwise in place. Returns `true` if the rotation was rejected,
    /// in which case nothing changed.
    pub fn rotate(&mut self) -> bool {
        let before = self.piece;
        self.piece.rotate_cw();
        if self.is_colliding(self.piece.x, self.piece.y) {
            self.piece = before;
            return true;
        }
        let after = self.piece;
        self.piece = before;
        self.lift_piece();
        self.piece = after;
        self.place_piece();
        false
    }

    /// Gravity step: fall one row, or lock, clear lines and respawn when the
    /// row below is blocked.
    pub fn lock_if_grounded(&mut self) -> Step {
        let (x, y) = (self.piece.x, self.piece.y);
        if !self.is_colliding(x, y + 1) {
            self.move_to(x, y + 1);
            return Step::Fell;
        }
        self.lock_piece();
        let cleared = self.clear_completed_lines();
        self.spawn();
        Step::Locked { cleared }
    }

    /// Scores and compacts complete rows. Runs between lock and respawn, while
    /// `cells` holds no active piece; otherwise the piece would be copied into
    /// `stage` and collide with itself.
    ///
    /// Each complete row pulls the four rows above it down by one; rows further
    /// up are not moved.
    fn clear_completed_lines(&mut self) -> Vec<usize> {
        self.stage.clone_from(&self.cells);
        let mut cleared = Vec::new();
        for row in 1..FLOOR_ROW {
            if !self.stage.is_row_complete(row) {
                continue;
            }
            self.score += LINE_BONUS;
            cleared.push(row);
            for k in 0..SHIFT_WINDOW {
                let Some(src) = row.checked_sub(k + 1) else {
                    break;
                };
                self.stage.copy_row(src, row - k);
            }
        }
        self.cells.clone_from(&self.stage);
        cleared
    }

    /// Game over: a freshly spawned piece's 4x4 region holds a value above 1,
    /// i.e. it landed on locked cells.
    pub fn is_board_full(&self) -> bool {
        let cols = SPAWN_X as usize..SPAWN_X as usize + PIECE_SIZE;
        (0..PIECE_SIZE).any(|row| cols.clone().any(|col| self.cells.cells[row][col] > 1))
    }

    fn spawn(&mut self) {
        let shape = random_shape(&mut self.rng);
        self.piece = ActivePiece::new(shape, SPAWN_X, SPAWN_Y);
        self.place_piece();
    }

    fn lift_piece(&mut self) {
        for (row, col) in self.piece.footprint() {
            *self.cells.cell_mut(row, col) -= 1;
        }
    }

    fn place_piece(&mut self) {
        for (row, col) in self.piece.footprint() {
            *self.cells.cell_mut(row, col) += 1;
        }
    }

    fn lock_piece(&mut self) {
        for (row, col) in self.piece.footprint() {
            *self.cells.cell_mut(row, col) = WALL;
        }
    }
}

/// Uniform pick from the catalog.
fn random_shape(rng: &mut StdRng) -> PieceShape {
    let shapes = all_shapes();
    shapes[rng.gen_range(0..shapes.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::ShapeKind;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn board() -> Board {
        Board::new(StdRng::seed_from_u64(7))
    }

    /// Swaps the active piece for `kind` at the spawn anchor.
    fn board_with(kind: ShapeKind) -> Board {
        let mut b = board();
        b.lift_piece();
        b.piece = ActivePiece::new(PieceShape::new(kind), SPAWN_X, SPAWN_Y);
        b.place_piece();
        b
    }

    fn fill_row(b: &mut Board, row: usize) {
        for col in 1..RIGHT_WALL_COL {
            b.cells.cells[row][col] = WALL;
            b.stage.cells[row][col] = WALL;
        }
    }

    /// Moves by (dx, dy) if the target is free.
    fn try_move(b: &mut Board, dx: i32, dy: i32) -> bool {
        let (x, y) = (b.piece.x + dx, b.piece.y + dy);
        if b.is_colliding(x, y) {
            return false;
        }
        b.move_to(x, y);
        true
    }

    /// Clears rows the way a lock does: with the active piece off the grid,
    /// followed by a respawn.
    fn clear_lines(b: &mut Board) -> Vec<usize> {
        b.lift_piece();
        let cleared = b.clear_completed_lines();
        b.spawn();
        let p = *b.piece();
        assert!(!b.is_colliding(p.x, p.y));
        assert_grids_in_sync(b);
        cleared
    }

    /// cells == stage + active footprint, everywhere.
    fn assert_grids_in_sync(b: &Board) {
        let mut expected = b.stage.clone();
        for (row, col) in b.piece.footprint() {
            *expected.cell_mut(row, col) += 1;
        }
        assert_eq!(b.cells, expected);
    }

    #[test]
    fn walls_surround_the_playfield() {
        let b = board();
        for row in 0..=FLOOR_ROW {
            assert_eq!(b.grid().get(row, 0), Some(WALL));
            assert_eq!(b.grid().get(row, RIGHT_WALL_COL), Some(WALL));
            assert_eq!(b.grid().get(row, BOARD_WIDTH - 1), Some(EMPTY));
        }
        for col in 0..=RIGHT_WALL_COL {
            assert_eq!(b.grid().get(FLOOR_ROW, col), Some(WALL));
            assert_eq!(b.grid().get(BOARD_HEIGHT - 1, col), Some(EMPTY));
        }
        assert_eq!(b.score(), 0);
    }

    #[test]
    fn first_spawn_never_touches_walls() {
        for seed in 0..64 {
            let b = Board::new(StdRng::seed_from_u64(seed));
            let p = b.piece();
            assert_eq!((p.x, p.y), (SPAWN_X, SPAWN_Y));
            assert!(!b.is_colliding(p.x, p.y));
            for (row, col) in p.footprint() {
                assert_eq!(b.grid().get(row as usize, col as usize), Some(1));
            }
            assert!(!b.is_board_full());
            assert_grids_in_sync(&b);
        }
    }

    #[test]
    fn move_to_shifts_footprint() {
        let mut b = board_with(ShapeKind::O);
        b.move_to(SPAWN_X + 1, SPAWN_Y + 2);
        assert_eq!(b.grid().get(1, 5), Some(EMPTY));
        assert_eq!(b.grid().get(3, 6), Some(1));
        assert_eq!(b.grid().get(4, 7), Some(1));
        assert!(!b.is_colliding(b.piece().x, b.piece().y));
        assert_grids_in_sync(&b);
    }

    #[test]
    fn move_into_wall_is_refused() {
        let mut b = board_with(ShapeKind::O);
        while try_move(&mut b, -1, 0) {}
        // O occupies columns 1..=2 of its box, so it stops flush with the wall.
        assert_eq!(b.piece().x, 0);
        let grid = b.grid().clone();
        let piece = *b.piece();
        assert!(!try_move(&mut b, -1, 0));
        assert_eq!(b.grid(), &grid);
        assert_eq!(b.piece(), &piece);
    }

    #[test]
    fn right_wall_blocks_too() {
        let mut b = board_with(ShapeKind::I);
        while try_move(&mut b, 1, 0) {}
        // I sits in column 1 of its box; last free column is 9.
        assert_eq!(b.piece().x + 1, RIGHT_WALL_COL as i32 - 1);
    }

    #[test]
    fn accepted_rotation_updates_grid() {
        let mut b = board_with(ShapeKind::T);
        assert!(!b.rotate());
        assert_eq!(
            b.piece().matrix,
            [[0, 1, 0, 0], [0, 1, 1, 0], [0, 1, 0, 0], [0, 0, 0, 0]]
        );
        assert_eq!(b.grid().get(2, 4), Some(EMPTY));
        assert_eq!(b.grid().get(0, 5), Some(1));
        assert!(!b.is_colliding(b.piece().x, b.piece().y));
        assert_grids_in_sync(&b);
    }

    #[test]
    fn rotation_against_wall_rolls_back() {
        let mut b = board_with(ShapeKind::I);
        while try_move(&mut b, -1, 0) {}
        assert_eq!(b.piece().x, 0);
        let grid = b.grid().clone();
        let piece = *b.piece();
        // Lying flat would put a cell in the wall column.
        assert!(b.rotate());
        assert_eq!(b.piece(), &piece);
        assert_eq!(b.grid(), &grid);
    }

    #[test]
    fn single_line_clear_scores_and_shifts_window() {
        let mut b = board_with(ShapeKind::I);
        fill_row(&mut b, 18);
        b.cells.cells[17][3] = WALL;
        b.cells.cells[16][2] = WALL;
        b.cells.cells[14][5] = WALL;
        b.cells.cells[13][7] = WALL;
        let mut before = b.cells.clone();
        for (row, col) in b.piece.footprint() {
            *before.cell_mut(row, col) -= 1;
        }

        let cleared = clear_lines(&mut b);

        assert_eq!(cleared, vec![18]);
        assert_eq!(b.score(), LINE_BONUS);
        assert_eq!(b.stage.cells[18], before.cells[17]);
        assert_eq!(b.stage.cells[17], before.cells[16]);
        assert_eq!(b.stage.cells[16], before.cells[15]);
        assert_eq!(b.stage.cells[15], before.cells[14]);
        // The row above the window stays put (and now appears twice).
        assert_eq!(b.stage.cells[14], before.cells[14]);
        assert_eq!(b.stage.cells[13], before.cells[13]);
    }

    #[test]
    fn each_complete_row_scores() {
        let mut b = board_with(ShapeKind::I);
        fill_row(&mut b, 17);
        fill_row(&mut b, 18);
        let cleared = clear_lines(&mut b);
        assert_eq!(cleared, vec![17, 18]);
        assert_eq!(b.score(), 2 * LINE_BONUS);
    }

    #[test]
    fn incomplete_row_is_left_alone() {
        let mut b = board_with(ShapeKind::I);
        fill_row(&mut b, 18);
        b.cells.cells[18][4] = EMPTY;
        b.stage.cells[18][4] = EMPTY;
        let before = b.stage.clone();
        assert!(clear_lines(&mut b).is_empty());
        assert_eq!(b.score(), 0);
        assert_eq!(b.stage, before);
    }

    #[test]
    fn clear_near_top_truncates_window() {
        let mut b = board_with(ShapeKind::I);
        b.move_to(SPAWN_X, 10);
        fill_row(&mut b, 2);
        let row0 = b.stage.cells[0];
        assert_eq!(clear_lines(&mut b), vec![2]);
        assert_eq!(b.score(), LINE_BONUS);
        assert_eq!(b.stage.cells[1], row0);
        assert_eq!(b.stage.cells[0], row0);
    }

    #[test]
    fn board_full_when_spawn_region_overlaps() {
        let mut b = board();
        assert!(!b.is_board_full());
        b.cells.cells[1][5] += WALL;
        assert!(b.is_board_full());
    }

    #[test]
    fn respawn_onto_locked_cells_ends_game() {
        let mut b = board_with(ShapeKind::I);
        b.move_to(SPAWN_X, 10);
        for row in 0..PIECE_SIZE {
            for col in SPAWN_X as usize..SPAWN_X as usize + PIECE_SIZE {
                b.cells.cells[row][col] = WALL;
                b.stage.cells[row][col] = WALL;
            }
        }
        b.spawn();
        assert!(b.is_board_full());
    }

    #[test]
    fn soft_drops_then_gravity_lock_i_piece() {
        let mut b = board_with(ShapeKind::I);
        for expected in 1..=4 {
            assert!(try_move(&mut b, 0, 1));
            assert_eq!(b.piece().y, expected);
            assert_eq!(b.piece().x, SPAWN_X);
        }

        let mut falls = 0;
        let cleared = loop {
            let y = b.piece().y;
            match b.lock_if_grounded() {
                Step::Fell => {
                    falls += 1;
                    assert_eq!(b.piece().y, y + 1);
                }
                Step::Locked { cleared } => break cleared,
            }
        };
        // Bottom cell rests on row 18, so the anchor stopped at 15.
        assert_eq!(falls, 15 - 4);
        assert!(cleared.is_empty());
        for row in 15..=18 {
            assert_eq!(b.grid().get(row, SPAWN_X as usize + 1), Some(WALL));
        }
        assert_eq!((b.piece().x, b.piece().y), (SPAWN_X, SPAWN_Y));
        assert!(!b.is_colliding(SPAWN_X, SPAWN_Y));
        assert!(!b.is_board_full());
        assert_grids_in_sync(&b);
    }

    #[test]
    fn locking_into_full_row_clears_it() {
        let mut b = board_with(ShapeKind::I);
        for col in 1..RIGHT_WALL_COL {
            if col != SPAWN_X as usize + 1 {
                b.cells.cells[18][col] = WALL;
                b.stage.cells[18][col] = WALL;
            }
        }
        let cleared = loop {
            if let Step::Locked { cleared } = b.lock_if_grounded() {
                break cleared;
            }
        };
        assert_eq!(cleared, vec![18]);
        assert_eq!(b.score(), LINE_BONUS);
        // Rows 15..=17 held the rest of the I; each moved down one.
        assert_eq!(b.grid().get(18, SPAWN_X as usize + 1), Some(WALL));
        assert_eq!(b.grid().get(18, 1), Some(EMPTY));
        assert_eq!(b.grid().get(15, SPAWN_X as usize + 1), Some(EMPTY));
        let p = *b.piece();
        assert!(!b.is_colliding(p.x, p.y));
        assert_grids_in_sync(&b);
    }

    #[test]
    fn stack_left_by_a_clear_holds_no_active_piece() {
        let mut b = board_with(ShapeKind::O);
        fill_row(&mut b, 18);
        b.lift_piece();
        b.clear_completed_lines();
        assert_eq!(b.stage, b.cells);
        for (row, col) in b.piece.footprint() {
            assert_eq!(b.stage.get(row as usize, col as usize), Some(EMPTY));
        }
        b.place_piece();
        let p = *b.piece();
        assert!(!b.is_colliding(p.x, p.y));
        assert_grids_in_sync(&b);
    }

    proptest! {
        #[test]
        fn validated_commands_never_self_collide(
            seed in any::<u64>(),
            moves in proptest::collection::vec(0u8..5, 0..200),
        ) {
            let mut b = Board::new(StdRng::seed_from_u64(seed));
            for m in moves {
                match m {
                    0 => { try_move(&mut b, -1, 0); }
                    1 => { try_move(&mut b, 1, 0); }
                    2 => { try_move(&mut b, 0, 1); }
                    3 => { b.rotate(); }
                    _ => { b.lock_if_grounded(); }
                }
                if b.is_board_full() {
                    break;
                }
                let p = *b.piece();
                prop_assert!(!b.is_colliding(p.x, p.y));
                assert_grids_in_sync(&b);
            }
        }
    }
}
