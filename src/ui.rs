//! Layout and drawing: menus, playfield, score sidebar, pause and game over.

use crate::Speed;
use crate::app::Screen;
use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, EMPTY, RIGHT_WALL_COL, WALL};
use crate::game::GameState;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

const SIDEBAR_WIDTH: u16 = 26;
/// Board plus its border.
const PLAYFIELD_WIDTH: u16 = BOARD_WIDTH as u16 + 2;
const PLAYFIELD_HEIGHT: u16 = BOARD_HEIGHT as u16 + 2;

/// Duration of the line-clear flash in ms.
const LINE_CLEAR_FADE_MS: u32 = 250;

const WALL_GLYPH: &str = "X";
const BLOCK_GLYPH: &str = "O";

/// Outer rect (border included) of the playfield, centred with the sidebar.
fn playfield_rect(area: Rect) -> Rect {
    let total_w = PLAYFIELD_WIDTH + SIDEBAR_WIDTH;
    Rect {
        x: area.x + area.width.saturating_sub(total_w) / 2,
        y: area.y + area.height.saturating_sub(PLAYFIELD_HEIGHT) / 2,
        width: PLAYFIELD_WIDTH.min(area.width),
        height: PLAYFIELD_HEIGHT.min(area.height),
    }
}

/// Board cells only, no border.
fn board_rect(area: Rect) -> Rect {
    let outer = playfield_rect(area);
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: (BOARD_WIDTH as u16).min(outer.width.saturating_sub(2)),
        height: (BOARD_HEIGHT as u16).min(outer.height.saturating_sub(2)),
    }
}

/// Glyph and style for one committed cell. Anything that is neither empty nor
/// a wall belongs to the active piece and takes its colour.
fn cell_glyph(value: u8, piece_index: usize, theme: &Theme) -> (&'static str, Style) {
    match value {
        EMPTY => (" ", Style::default().bg(theme.bg)),
        WALL => (WALL_GLYPH, Style::default().fg(theme.wall).bg(theme.bg)),
        _ => (
            BLOCK_GLYPH,
            Style::default().fg(theme.piece_color(piece_index)).bg(theme.bg),
        ),
    }
}

/// Draw the current screen. While `flash_rows` is non-empty, fades those rows
/// with a TachyonFX effect kept in `line_clear_effect`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    paused: bool,
    flash_rows: &[usize],
    line_clear_effect: &mut Option<Effect>,
    line_clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    match screen {
        Screen::Menu => draw_menu(frame, theme, area),
        Screen::SpeedSelect => draw_speed_menu(frame, theme, area),
        Screen::Playing => {
            draw_game(frame, state, theme, area);
            if !flash_rows.is_empty() {
                apply_line_clear_effect(
                    frame,
                    theme,
                    area,
                    flash_rows,
                    line_clear_effect,
                    line_clear_process_time,
                    now,
                );
            }
            if paused {
                draw_pause_overlay(frame, theme, area);
            }
        }
        Screen::GameOver => {
            draw_game(frame, state, theme, area);
            draw_game_over(frame, state, theme, area);
        }
    }
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn popup_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

fn banner(theme: &Theme) -> Vec<Line<'static>> {
    let rule = Line::from(Span::styled(
        "~~~~~~~~~~~~~~~~~~~~~~~~~~~~",
        Style::default().fg(theme.div_line),
    ));
    vec![
        Line::from(""),
        rule.clone(),
        Line::from(Span::styled(
            "****** blocktui ******",
            Style::default().fg(theme.title).bold(),
        )),
        rule,
        Line::from(""),
    ]
}

fn draw_menu(frame: &mut Frame, theme: &Theme, area: Rect) {
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = banner(theme);
    lines.extend([
        Line::from(Span::styled("*Menu*", Style::default().fg(theme.title))),
        Line::from(""),
        Line::from(Span::styled("1: Start", fg)),
        Line::from(Span::styled("2: Quit ", fg)),
        Line::from(""),
        Line::from(Span::styled("Choice >>", Style::default().fg(theme.div_line))),
    ]);
    let popup = centered_popup(area, 34, lines.len() as u16 + 2);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(popup_block(theme))
        .render(popup, frame.buffer_mut());
}

fn draw_speed_menu(frame: &mut Frame, theme: &Theme, area: Rect) {
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = banner(theme);
    lines.push(Line::from(Span::styled(
        "*Select Speed*",
        Style::default().fg(theme.title),
    )));
    lines.push(Line::from(""));
    for (i, speed) in Speed::ALL.iter().enumerate() {
        lines.push(Line::from(Span::styled(
            format!("{}: {:<10}", i + 1, speed.label()),
            fg,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Choice >>",
        Style::default().fg(theme.div_line),
    )));
    let popup = centered_popup(area, 34, lines.len() as u16 + 2);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(popup_block(theme))
        .render(popup, frame.buffer_mut());
}

/// Playfield plus sidebar, centred in the frame.
fn draw_game(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let outer = playfield_rect(area);
    let sidebar = Rect {
        x: outer.x + outer.width,
        y: outer.y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(outer.x + outer.width - area.x)),
        height: outer.height,
    };
    draw_playfield(frame, state, theme, area);
    draw_sidebar(frame, state, theme, sidebar);
}

fn draw_playfield(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let outer = playfield_rect(area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg));
    block.render(outer, frame.buffer_mut());

    let rect = board_rect(area);
    let piece_index = state.board.piece().kind.index();
    let buf = frame.buffer_mut();
    for (y, row) in state.board.grid().rows().enumerate() {
        for (x, &value) in row.iter().enumerate() {
            let rx = rect.x + x as u16;
            let ry = rect.y + y as u16;
            if rx < rect.x + rect.width && ry < rect.y + rect.height {
                let (glyph, style) = cell_glyph(value, piece_index, theme);
                buf[(rx, ry)].set_symbol(glyph).set_style(style);
            }
        }
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let key_style = Style::default().fg(theme.piece_color(3));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Score, lines, pieces, speed
            Constraint::Length(1), // gap
            Constraint::Min(8),    // Controls legend
        ])
        .split(area);

    let stats_block = popup_block(theme);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let stats = vec![
        Line::from(vec![
            Span::styled("Score : ", title_style),
            Span::styled(state.score().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Lines : ", title_style),
            Span::styled(state.lines_cleared.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Pieces: ", title_style),
            Span::styled(state.pieces_locked.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Speed : ", title_style),
            Span::styled(state.speed.label(), fg_style),
        ]),
    ];
    Paragraph::new(stats).render(stats_inner, frame.buffer_mut());

    let legend_block = popup_block(theme);
    let legend_inner = legend_block.inner(chunks[2]);
    legend_block.render(chunks[2], frame.buffer_mut());
    let key = |label: &'static str, glyph: &'static str| {
        Line::from(vec![
            Span::styled(label, fg_style),
            Span::styled(glyph, key_style),
        ])
    };
    let legend = vec![
        Line::from(Span::styled("arrow keys", title_style)),
        key("left:     ", "[←]"),
        key("down:     ", "[↓]"),
        key("right:    ", "[→]"),
        key("Rotation: ", "[↑]"),
        key("pause:    ", "[P]"),
        key("quit:     ", "[Q]"),
    ];
    Paragraph::new(legend).render(legend_inner, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
        Line::from(Span::styled(
            " P - Resume    Q - Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(popup_block(theme))
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 42, 8);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " ~ Game Over. It's ok, you'll live. ~ ",
            Style::default().fg(theme.alert).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Score : {}", state.score()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press enter to exit",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(popup_block(theme))
        .render(popup, frame.buffer_mut());
}

/// Create or update the line-clear fade over the interior of `rows` and process it.
fn apply_line_clear_effect(
    frame: &mut Frame,
    theme: &Theme,
    area: Rect,
    rows: &[usize],
    line_clear_effect: &mut Option<Effect>,
    line_clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let rect = board_rect(area);
    let delta = line_clear_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *line_clear_process_time = Some(now);

    if line_clear_effect.is_none() {
        let flashing: HashSet<(u16, u16)> = rows
            .iter()
            .flat_map(|&row| {
                (1..RIGHT_WALL_COL).map(move |col| (rect.x + col as u16, rect.y + row as u16))
            })
            .collect();
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            flashing.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_to(
            theme.title,
            theme.title,
            (LINE_CLEAR_FADE_MS, Interpolation::Linear),
        )
        .with_filter(filter)
        .with_area(rect);
        *line_clear_effect = Some(effect);
    }

    if let Some(effect) = line_clear_effect {
        frame.render_effect(effect, rect, TfxDuration::from_millis(delta_ms));
    }
}
