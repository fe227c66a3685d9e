//! Game session: applies player commands, runs gravity ticks, tracks game over.

use crate::board::{Board, Step};
use crate::{GameConfig, Speed};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

/// Player commands that reach the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
}

#[derive(Debug)]
pub struct GameState {
    pub board: Board,
    pub speed: Speed,
    pub game_over: bool,
    pub lines_cleared: u32,
    pub pieces_locked: u32,
    /// Rows completed by the most recent lock, until taken for the flash effect.
    pub last_cleared: Vec<usize>,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let board = Board::new(rng);
        let game_over = board.is_board_full();
        Self {
            board,
            speed: config.speed,
            game_over,
            lines_cleared: 0,
            pieces_locked: 0,
            last_cleared: Vec::new(),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.speed.tick_interval()
    }

    pub fn score(&self) -> u32 {
        self.board.score()
    }

    /// Applies one command. Sideways and down moves happen only when the target
    /// is free; a blocked soft drop does not lock.
    pub fn apply(&mut self, command: Command) {
        if self.game_over {
            return;
        }
        let (x, y) = (self.board.piece().x, self.board.piece().y);
        let target = match command {
            Command::MoveLeft => (x - 1, y),
            Command::MoveRight => (x + 1, y),
            Command::SoftDrop => (x, y + 1),
            Command::Rotate => {
                self.board.rotate();
                return;
            }
        };
        if !self.board.is_colliding(target.0, target.1) {
            self.board.move_to(target.0, target.1);
        }
    }

    /// One gravity step.
    pub fn tick(&mut self) {
        if self.game_over {
            return;
        }
        if let Step::Locked { cleared } = self.board.lock_if_grounded() {
            self.pieces_locked += 1;
            self.lines_cleared += cleared.len() as u32;
            if !cleared.is_empty() {
                self.last_cleared = cleared;
            }
            self.game_over = self.board.is_board_full();
        }
    }

    pub fn take_cleared_rows(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.last_cleared)
    }
}
