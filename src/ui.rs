//! Terminal UI rendering with ratatui

use crate::menu::{item_value, Menu, MenuAction, MenuItem, MenuItemType, MenuScreen};
use crate::settings::Settings;
use falling_bricks::board::{BOARD_HEIGHT, BOARD_WIDTH};
use falling_bricks::mode::FORTY_LINES_TARGET;
use falling_bricks::{Banner, CellView, Game, GameMode, GameOverReason, Phase, Piece};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph},
    Frame,
};

const EMPTY: &str = "  ";
const CROSS: &str = "><";

/// Stats(18) + board(22) + next(12)
const GAME_WIDTH: u16 = 52;
/// Board rows plus borders
const GAME_HEIGHT: u16 = BOARD_HEIGHT as u16 + 2;
const BOARD_BOX_WIDTH: u16 = BOARD_WIDTH as u16 * 2 + 2;
/// Blitz clock turns red below this
const LOW_TIME_MS: u64 = 10_000;

/// Render the title or settings menu
pub fn render_menu(frame: &mut Frame, menu: &Menu) {
    let area = frame.area();
    let menu_height = menu.items.len() as u16 * 2 + 5;
    let show_big_title = menu.screen == MenuScreen::Title;
    let title_height = if show_big_title { 6u16 } else { 3u16 };
    let menu_area = center_rect(area, 48, title_height + menu_height);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(title_height), Constraint::Min(6)])
        .split(menu_area);

    let title_lines = if show_big_title {
        let style = Style::default().fg(Color::Rgb(255, 113, 0));
        vec![
            Line::styled("█▀▀ ▄▀█ █   █   █ █▄ █ █▀▀", style),
            Line::styled("█▀  █▀█ █▄▄ █▄▄ █ █ ▀█ █▄█", style),
            Line::raw(""),
            Line::styled("█▄▄ █▀█ █ █▀▀ █▄▀ █▀", Style::default().fg(Color::Cyan)),
            Line::styled("█▄█ █▀▄ █ █▄▄ █ █ ▄█", Style::default().fg(Color::Cyan)),
        ]
    } else {
        vec![
            Line::raw(""),
            Line::styled("SETTINGS", Style::default().fg(Color::Cyan).bold()),
        ]
    };
    frame.render_widget(
        Paragraph::new(title_lines).alignment(Alignment::Center),
        layout[0],
    );

    render_menu_box(frame, layout[1], menu);
}

/// Render the game-over menu on top of the finished round
pub fn render_game_over(frame: &mut Frame, game: &Game, menu: &Menu) {
    let area = center_rect(frame.area(), 30, menu.items.len() as u16 * 2 + 10);
    frame.render_widget(Clear, area);

    let title = match game.game_over_reason() {
        Some(GameOverReason::LinesReached) => "COMPLETE!",
        Some(GameOverReason::TimeUp) => "TIME'S UP!",
        _ => "GAME OVER",
    };
    let summary = match game.mode() {
        GameMode::FortyLines if game.game_over_reason() == Some(GameOverReason::LinesReached) => {
            format!("Time {}", game.mode_state().display_time())
        }
        _ => format!("Score {}", game.score().points),
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(4)])
        .split(area);

    let header = Paragraph::new(vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(summary, Style::default().fg(Color::White)),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::TOP | Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::Yellow))
            .style(Style::default().bg(Color::Black)),
    );
    frame.render_widget(header, layout[0]);
    render_menu_box(frame, layout[1], menu);
}

fn render_menu_box(frame: &mut Frame, area: Rect, menu: &Menu) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::raw("")];
    for (i, item) in menu.items.iter().enumerate() {
        lines.push(render_menu_item(item, i == menu.selected));
        lines.push(Line::raw(""));
    }

    let selected = menu.items.get(menu.selected).map(|item| &item.item_type);
    if let Some(MenuItemType::Button(MenuAction::StartGame(mode))) = selected {
        lines.push(Line::styled(mode.description(), Style::default().fg(Color::Cyan)));
    }
    let hint = match selected {
        Some(MenuItemType::Button(_)) | None => "↑↓ Select  Enter Confirm",
        Some(_) => "↑↓ Select  ←→ Adjust",
    };
    lines.push(Line::styled(hint, Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Render a single menu item based on its type
fn render_menu_item(item: &MenuItem, is_selected: bool) -> Line<'static> {
    let prefix = if is_selected { "▶ " } else { "  " };
    let base_style = if is_selected {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::White)
    };

    match item_value(item) {
        None => Line::styled(format!("{}{}", prefix, item.label), base_style),
        Some(value) => {
            let value_color = match item.item_type {
                MenuItemType::Toggle { value: true, .. } => Color::Green,
                MenuItemType::Toggle { value: false, .. } => Color::Red,
                _ => Color::Cyan,
            };
            Line::from(vec![
                Span::styled(format!("{}{}: ", prefix, item.label), base_style),
                Span::styled(format!("< {} >", value), Style::default().fg(value_color)),
            ])
        }
    }
}

/// Render the playfield with its side panels and overlays
pub fn render_game(frame: &mut Frame, game: &Game, settings: &Settings, now_ms: u64) {
    let area = frame.area();
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    // stats | board | next queue
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(18),
            Constraint::Length(BOARD_BOX_WIDTH),
            Constraint::Length(12),
        ])
        .split(game_area);

    render_stats(frame, main_layout[0], game);
    render_board(frame, main_layout[1], game, settings);
    render_next_queue(frame, main_layout[2], game, settings);
    render_banners(frame, main_layout[1], game, now_ms);

    if game.phase() == Phase::Paused {
        render_overlay(frame, main_layout[1], "PAUSED", "Press P to resume");
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render the preview queue, head first
fn render_next_queue(frame: &mut Frame, area: Rect, game: &Game, settings: &Settings) {
    let (block_char, _) = settings.visual.block_chars();
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    for piece in game.queue().iter() {
        if lines.len() + piece.height() > inner.height as usize {
            break;
        }
        lines.extend(mini_piece_lines(piece, block_char));
        lines.push(Line::raw(""));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Rows of a piece mask as styled lines
fn mini_piece_lines(piece: &Piece, block_char: &'static str) -> Vec<Line<'static>> {
    let style = Style::default().fg(piece.color());
    (0..piece.height())
        .map(|row| {
            let spans: Vec<Span> = (0..piece.width())
                .map(|col| {
                    if piece.is_filled(row, col) {
                        Span::styled(block_char, style)
                    } else {
                        Span::raw(EMPTY)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Render the game board
fn render_board(frame: &mut Frame, area: Rect, game: &Game, settings: &Settings) {
    let (block_char, empty_char) = settings.visual.block_chars();
    let show_shadow = settings.visual.show_shadow;
    let shadow_color = game
        .active_piece()
        .map(Piece::color)
        .unwrap_or(Color::DarkGray);

    let title = format!(" {} ", game.mode().name());
    let block = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let board = game.board();
    let mut lines: Vec<Line> = Vec::with_capacity(board.height());
    let mut spans = Vec::with_capacity(board.width());
    for (_, col, view) in board.cells() {
        spans.push(cell_span(
            view,
            block_char,
            empty_char,
            show_shadow.then_some(shadow_color),
        ));
        if col + 1 == board.width() {
            lines.push(Line::from(std::mem::take(&mut spans)));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn cell_span(
    view: CellView,
    block_char: &'static str,
    empty_char: &'static str,
    shadow: Option<Color>,
) -> Span<'static> {
    if view.crossed {
        return Span::styled(CROSS, Style::default().fg(Color::Red).bold());
    }
    if view.marked {
        // Rows waiting to be cleared flash white
        return Span::styled(block_char, Style::default().fg(Color::White));
    }
    match (view.color, shadow) {
        (Some(color), _) => Span::styled(block_char, Style::default().fg(color)),
        (None, Some(color)) if view.shadow => {
            Span::styled(block_char, Style::default().fg(color).dim())
        }
        _ => Span::styled(empty_char, Style::default().fg(Color::DarkGray)),
    }
}

/// Render stats panel with the level bar
fn render_stats(frame: &mut Frame, area: Rect, game: &Game) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(inner);

    let score = game.score();
    let mode_state = game.mode_state();
    let label = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(Color::Gray)));

    let lines_text = match mode_state.target_lines() {
        Some(target) => format!("{}/{}", score.lines.min(target), FORTY_LINES_TARGET),
        None => score.lines.to_string(),
    };
    let time_color = match mode_state.time_remaining_ms() {
        Some(left) if left < LOW_TIME_MS => Color::Red,
        _ => Color::Yellow,
    };
    let time_label = if game.mode() == GameMode::Blitz {
        "TIME LEFT"
    } else {
        "TIME"
    };

    let lines = vec![
        label("SCORE"),
        Line::from(Span::styled(
            score.points.to_string(),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::raw(""),
        label("LINES"),
        Line::from(Span::styled(lines_text, Style::default().fg(Color::Green))),
        Line::raw(""),
        label(time_label),
        Line::from(Span::styled(
            mode_state.display_time(),
            Style::default().fg(time_color).bold(),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), layout[0]);

    let gauge = Gauge::default()
        .block(Block::default().title(format!("LEVEL {}", score.level)))
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
        .ratio(score.level_progress())
        .label(format!("{}/{}", score.lines_this_level, score.required_lines));
    frame.render_widget(gauge, layout[1]);
}

/// Draw the visible banners over the top of the board
fn render_banners(frame: &mut Frame, area: Rect, game: &Game, now_ms: u64) {
    let banners = [
        (game.main_banner(now_ms), Color::Yellow, 6),
        (game.level_up_banner(now_ms), Color::Cyan, 8),
        (game.combo_banner(now_ms), Color::Magenta, 10),
    ];

    for (banner, color, offset) in banners {
        let Some(banner) = banner else { continue };
        if area.height <= offset {
            continue;
        }
        let row = Rect {
            x: area.x + 1,
            y: area.y + offset,
            width: area.width.saturating_sub(2),
            height: 1,
        };
        let style = Style::default().fg(fade(color, banner, now_ms)).bold();
        frame.render_widget(
            Paragraph::new(Line::styled(banner.text.clone(), style)).alignment(Alignment::Center),
            row,
        );
    }
}

/// Dim a banner color in its last third of display time
fn fade(color: Color, banner: &Banner, now_ms: u64) -> Color {
    if banner.opacity(now_ms) < 1.0 / 3.0 {
        Color::DarkGray
    } else {
        color
    }
}

/// Render a small overlay box (pause)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let popup_area = center_rect(area, 20, 5);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title.to_string(), Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle.to_string(), Style::default().fg(Color::Gray)),
    ];

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_title_menu_renders_items() {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        let menu = Menu::title();
        terminal.draw(|frame| render_menu(frame, &menu)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("40 Lines"));
        assert!(text.contains("Quit"));
    }

    #[test]
    fn test_title_menu_describes_selected_mode() {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        let mut menu = Menu::title();
        menu.move_down();
        terminal.draw(|frame| render_menu(frame, &menu)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains(GameMode::Blitz.description()));
        assert!(!text.contains(GameMode::FortyLines.description()));

        // Non-mode items show no description
        let mut menu = Menu::title();
        menu.move_up();
        terminal.draw(|frame| render_menu(frame, &menu)).unwrap();
        let text = buffer_text(&terminal);
        for mode in GameMode::all() {
            assert!(!text.contains(mode.description()));
        }
    }

    #[test]
    fn test_board_renders_active_piece_and_stats() {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        let mut game = Game::with_seed(7);
        game.start(GameMode::FortyLines, 0);
        for now in (0..=4000).step_by(1000) {
            game.update(now);
        }
        assert_eq!(game.phase(), Phase::Playing);

        let settings = Settings::default();
        terminal
            .draw(|frame| render_game(frame, &game, &settings, 4000))
            .unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("SCORE"));
        assert!(text.contains("0/40"));
        assert!(text.contains("NEXT"));
        assert!(text.contains("██"));
    }

    #[test]
    fn test_cell_span_priorities() {
        let crossed = CellView {
            color: Some(Color::Red),
            locked: true,
            shadow: false,
            marked: false,
            crossed: true,
        };
        assert_eq!(cell_span(crossed, "██", " .", None).content, CROSS);

        let shadow = CellView {
            color: None,
            locked: false,
            shadow: true,
            marked: false,
            crossed: false,
        };
        assert_eq!(cell_span(shadow, "██", " .", Some(Color::Cyan)).content, "██");
        assert_eq!(cell_span(shadow, "██", " .", None).content, " .");
    }
}
