//! App: terminal init, main loop, tick and key handling.

use crate::game::GameState;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::{Args, GameConfig, Speed};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    SpeedSelect,
    Playing,
    GameOver,
}

/// How the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Quit,
    /// Game over, acknowledged by the player.
    GameOver,
    /// Unknown choice on the start menu.
    InvalidSelection,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        !matches!(self, Self::InvalidSelection)
    }

    pub fn exit_code(self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    last_tick: Instant,
    /// Rows flashed by the line-clear effect.
    flash_rows: Vec<usize>,
    /// TachyonFX fade for cleared rows (created on first draw after a clear).
    line_clear_effect: Option<Effect>,
    /// Last time we processed the line-clear effect (for delta).
    line_clear_effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Self {
        let state = GameState::new(&config);
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        Self {
            args,
            config,
            theme,
            state,
            screen,
            paused: false,
            last_tick: Instant::now(),
            flash_rows: Vec::new(),
            line_clear_effect: None,
            line_clear_effect_process_time: None,
        }
    }

    fn start_game(&mut self, speed: Speed) {
        self.config.speed = speed;
        self.state = GameState::new(&self.config);
        self.screen = Screen::Playing;
        self.paused = false;
        self.last_tick = Instant::now();
        self.reset_flash();
    }

    fn reset_flash(&mut self) {
        self.flash_rows.clear();
        self.line_clear_effect = None;
        self.line_clear_effect_process_time = None;
    }

    /// Routes one action for the current screen. Returns the outcome when the
    /// session should end.
    pub fn handle_action(&mut self, action: Action) -> Option<Outcome> {
        match self.screen {
            Screen::Menu => match action {
                Action::Choice(1) | Action::Confirm => self.screen = Screen::SpeedSelect,
                Action::Choice(2) | Action::Quit => return Some(Outcome::Quit),
                Action::Choice(_) => return Some(Outcome::InvalidSelection),
                _ => {}
            },
            Screen::SpeedSelect => match action {
                Action::Choice(n) => {
                    if let Some(speed) = Speed::from_choice(n) {
                        self.start_game(speed);
                    }
                }
                Action::Quit => return Some(Outcome::Quit),
                _ => {}
            },
            Screen::Playing => match action {
                Action::Quit => return Some(Outcome::Quit),
                Action::Pause => self.paused = !self.paused,
                _ if self.paused => {}
                _ => {
                    if let Some(command) = action.command() {
                        self.state.apply(command);
                    }
                }
            },
            Screen::GameOver => {
                if matches!(action, Action::Confirm | Action::Quit) {
                    return Some(Outcome::GameOver);
                }
            }
        }
        None
    }

    /// Runs a gravity step if the tick interval has passed.
    fn tick(&mut self, now: Instant) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        if now.saturating_duration_since(self.last_tick) >= self.state.tick_interval() {
            self.last_tick = now;
            self.step_gravity();
        }
    }

    fn step_gravity(&mut self) {
        self.state.tick();
        let cleared = self.state.take_cleared_rows();
        if !cleared.is_empty() && !self.args.no_animation {
            self.reset_flash();
            self.flash_rows = cleared;
        }
        if self.state.game_over {
            self.screen = Screen::GameOver;
        }
    }

    pub fn run(&mut self) -> Result<Outcome> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let result = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))
            .context("failed to initialise terminal")
            .and_then(|mut terminal| self.run_loop(&mut terminal));

        restore_terminal(
            result,
            || execute!(std::io::stdout(), LeaveAlternateScreen),
            disable_raw_mode,
        )
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<Outcome> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.paused,
                    &self.flash_rows,
                    &mut self.line_clear_effect,
                    &mut self.line_clear_effect_process_time,
                    now,
                );
            })?;

            if self.line_clear_effect.as_ref().is_some_and(Effect::done) {
                self.reset_flash();
            }

            // Wake for whichever comes first: the next frame or the next gravity step.
            let until_tick = self
                .state
                .tick_interval()
                .saturating_sub(self.last_tick.elapsed());
            let timeout = frame_duration
                .saturating_sub(now.elapsed())
                .min(until_tick);

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if let Some(outcome) = self.handle_action(key_to_action(key)) {
                            return Ok(outcome);
                        }
                    }
                }
            }

            self.tick(Instant::now());
        }
    }
}

/// Runs both restore steps even when one fails. The loop's own error is
/// reported first, then the restore errors in order.
fn restore_terminal(
    result: Result<Outcome>,
    leave_screen: impl FnOnce() -> std::io::Result<()>,
    disable_raw: impl FnOnce() -> std::io::Result<()>,
) -> Result<Outcome> {
    let left = leave_screen().context("failed to leave alternate screen");
    let raw = disable_raw().context("failed to disable raw mode");
    let outcome = result?;
    left?;
    raw?;
    Ok(outcome)
}
