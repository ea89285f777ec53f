//! Ratatui frontend for the high-card game.
//!
//! Pure UI module: terminal lifecycle, rendering of the menu / game / end
//! screens, and input → intent mapping. All game state lives in
//! [`highcard_core::engine::SessionState`]; this module only reads it.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::io::{self, Stdout};

use highcard_core::cards::Card;
use highcard_core::engine::{OPPONENT_NAME, Phase, SessionState};

// ---------------------------------------------------------------------------
// UserIntent — result of processing user input
// ---------------------------------------------------------------------------

/// The result of processing a user input event.
#[derive(Debug, PartialEq, Eq)]
pub enum UserIntent {
    /// No action needed.
    None,
    /// Quit the application.
    Quit,
    /// Save the name currently in the input buffer.
    SaveName(String),
    /// Start a session.
    Start,
    /// Retry the deck call that faulted.
    Retry,
    /// Tear the session down and return to the menu.
    BackToMenu,
}

// ---------------------------------------------------------------------------
// Menu model
// ---------------------------------------------------------------------------

/// Everything the menu screen needs to render; built by the app loop from
/// the preference store and the location provider.
#[derive(Debug, Clone)]
pub struct MenuModel {
    pub name: String,
    pub name_entered: bool,
    /// Coordinate from the location provider; `None` means unavailable.
    pub longitude: Option<f64>,
    /// Side flag derived from the longitude, computed once.
    pub west_side: bool,
}

impl MenuModel {
    /// START is enabled once a name is saved and a location is known.
    pub fn start_enabled(&self) -> bool {
        self.name_entered && !self.name.is_empty() && self.longitude.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tui
// ---------------------------------------------------------------------------

/// Owns the ratatui terminal and the name-entry input buffer.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    name_input: String,
}

impl Tui {
    /// Set up the terminal (raw mode, alternate screen) and return a ready `Tui`.
    pub fn setup() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            name_input: String::new(),
        })
    }

    /// Restore the terminal to its original state.
    pub fn teardown(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Draw the menu screen.
    pub fn render_menu(&mut self, menu: &MenuModel) -> io::Result<()> {
        let input = self.name_input.clone();
        self.terminal.draw(|f| menu_ui(f, menu, &input))?;
        Ok(())
    }

    /// Draw the game (or end-of-session) screen.
    pub fn render_game(&mut self, state: &SessionState) -> io::Result<()> {
        self.terminal.draw(|f| game_ui(f, state))?;
        Ok(())
    }

    /// Poll for a menu keyboard event. Never blocks.
    pub fn poll_menu_input(&mut self, menu: &MenuModel) -> io::Result<UserIntent> {
        let Some(key) = next_key_press()? else {
            return Ok(UserIntent::None);
        };
        Ok(self.handle_menu_key(key, menu))
    }

    /// Poll for a game-screen keyboard event. Never blocks.
    pub fn poll_game_input(&mut self, state: &SessionState) -> io::Result<UserIntent> {
        let Some(key) = next_key_press()? else {
            return Ok(UserIntent::None);
        };
        Ok(match key.code {
            KeyCode::Esc => UserIntent::BackToMenu,
            KeyCode::Char('q') => UserIntent::BackToMenu,
            KeyCode::Char('r') if state.phase == Phase::Faulted => UserIntent::Retry,
            KeyCode::Char('b') | KeyCode::Enter if state.phase == Phase::Done => {
                UserIntent::BackToMenu
            }
            _ => UserIntent::None,
        })
    }

    // -- private -----------------------------------------------------------

    fn handle_menu_key(&mut self, key: KeyEvent, menu: &MenuModel) -> UserIntent {
        if !menu.name_entered {
            // Name entry: type, backspace, Enter to save.
            return match key.code {
                KeyCode::Esc => UserIntent::Quit,
                KeyCode::Enter if !self.name_input.trim().is_empty() => {
                    UserIntent::SaveName(self.name_input.trim().to_string())
                }
                KeyCode::Backspace => {
                    self.name_input.pop();
                    UserIntent::None
                }
                KeyCode::Char(c) if !c.is_control() => {
                    self.name_input.push(c);
                    UserIntent::None
                }
                _ => UserIntent::None,
            };
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => UserIntent::Quit,
            KeyCode::Enter | KeyCode::Char('s') if menu.start_enabled() => UserIntent::Start,
            _ => UserIntent::None,
        }
    }
}

/// Drain one pending key-press event, if any.
fn next_key_press() -> io::Result<Option<KeyEvent>> {
    if !event::poll(std::time::Duration::from_millis(0))? {
        return Ok(None);
    }
    let Event::Key(key) = event::read()? else {
        return Ok(None);
    };
    if key.kind != KeyEventKind::Press {
        return Ok(None);
    }
    Ok(Some(key))
}

// ---------------------------------------------------------------------------
// Menu screen
// ---------------------------------------------------------------------------

fn menu_ui(frame: &mut Frame, menu: &MenuModel, name_input: &str) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(frame.area());

    // Greeting or name entry.
    if menu.name_entered {
        let greeting = Paragraph::new(Line::from(vec![
            Span::raw("Hi "),
            Span::styled(menu.name.clone(), Style::default().fg(Color::Cyan).bold()),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" High Card "));
        frame.render_widget(greeting, layout[0]);
    } else {
        let entry = Paragraph::new(Line::from(vec![
            Span::styled(name_input, Style::default().fg(Color::White)),
            Span::styled("▏", Style::default().fg(Color::Gray)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Insert name (Enter to save) "),
        );
        frame.render_widget(entry, layout[0]);
    }

    // Side indicator, anchored to the side the flag names.
    let side_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[1]);
    let side_area = if menu.west_side { side_cols[0] } else { side_cols[1] };
    let side_label = if menu.west_side { "West Side" } else { "East Side" };
    let side = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("♦ ♠ ♣ ♥", Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled(side_label, Style::default().bold())),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(side, side_area);

    // Location status.
    let location = match menu.longitude {
        Some(lon) => Line::from(format!("Location: {lon:.6}")),
        None => Line::from(Span::styled(
            "Location unavailable — start with --longitude <value>",
            Style::default().fg(Color::Red),
        )),
    };
    frame.render_widget(Paragraph::new(location).alignment(Alignment::Center), layout[2]);

    // Start affordance / key hints.
    let start = if menu.start_enabled() {
        Line::from(vec![
            Span::styled(" START ", Style::default().fg(Color::Black).bg(Color::Blue).bold()),
            Span::raw("  Enter/s to play, q to quit"),
        ])
    } else if !menu.name_entered {
        Line::from("Type your name and press Enter")
    } else {
        Line::from(Span::styled(
            " START ",
            Style::default().fg(Color::White).bg(Color::Gray),
        ))
    };
    frame.render_widget(Paragraph::new(start).alignment(Alignment::Center), layout[3]);
}

// ---------------------------------------------------------------------------
// Game screen
// ---------------------------------------------------------------------------

fn game_ui(frame: &mut Frame, state: &SessionState) {
    if state.phase == Phase::Done {
        end_ui(frame, state);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(9),
            Constraint::Min(1),
        ])
        .split(frame.area());

    render_score_header(frame, state, layout[0]);
    render_table(frame, state, layout[1]);
    render_status_line(frame, state, layout[2]);
}

fn render_score_header(frame: &mut Frame, state: &SessionState, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    // The player sits on the side the location flag decided.
    let (left_name, left_score, right_name, right_score) = if state.player_on_left {
        (
            state.player_name.as_str(),
            state.player_score,
            OPPONENT_NAME,
            state.opponent_score,
        )
    } else {
        (
            OPPONENT_NAME,
            state.opponent_score,
            state.player_name.as_str(),
            state.player_score,
        )
    };

    let name_cell = |name: &str, score: u32| {
        Paragraph::new(vec![
            Line::from(name.to_string()),
            Line::from(Span::styled(score.to_string(), Style::default().bold())),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
    };
    frame.render_widget(name_cell(left_name, left_score), cols[0]);
    frame.render_widget(name_cell(right_name, right_score), cols[1]);
}

fn render_table(frame: &mut Frame, state: &SessionState, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(30),
            Constraint::Percentage(35),
        ])
        .split(area);

    let (left_card, right_card) = if state.player_on_left {
        (&state.player_card, &state.opponent_card)
    } else {
        (&state.opponent_card, &state.player_card)
    };

    render_card(frame, left_card, state.cards_revealed, cols[0]);

    // Countdown digits between the cards.
    let digit = if state.phase == Phase::Countdown {
        state.countdown.to_string()
    } else {
        "⏱".to_string()
    };
    let countdown = Paragraph::new(vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            digit,
            Style::default().fg(Color::Yellow).bold(),
        )),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(countdown, cols[1]);

    render_card(frame, right_card, state.cards_revealed, cols[2]);
}

fn render_card(frame: &mut Frame, card: &Option<Card>, revealed: bool, area: Rect) {
    let face = match card {
        Some(card) if revealed => Line::from(Span::styled(
            card.to_string(),
            Style::default().fg(Color::Cyan).bold(),
        )),
        Some(_) => Line::from(Span::styled("🂠", Style::default().fg(Color::Blue))),
        None => Line::from(Span::styled("· · ·", Style::default().fg(Color::Gray))),
    };
    let widget = Paragraph::new(vec![Line::from(""), Line::from(""), face, Line::from("")])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn render_status_line(frame: &mut Frame, state: &SessionState, area: Rect) {
    let line = match state.phase {
        Phase::Idle | Phase::Drawing => Line::from(Span::styled(
            "Preparing game...",
            Style::default().fg(Color::Gray),
        )),
        Phase::Faulted => {
            let err = state.last_error.as_deref().unwrap_or("deck error");
            Line::from(vec![
                Span::styled(err.to_string(), Style::default().fg(Color::Red)),
                Span::raw("  —  press "),
                Span::styled("r", Style::default().fg(Color::Yellow).bold()),
                Span::raw(" to retry, q for the menu"),
            ])
        }
        _ => Line::from(format!(
            "Round {} of 10   (q: back to menu)",
            (state.rounds_completed + 1).min(10)
        )),
    };
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

// ---------------------------------------------------------------------------
// End screen
// ---------------------------------------------------------------------------

fn end_ui(frame: &mut Frame, state: &SessionState) {
    let winner = state.winner.as_deref().unwrap_or("Tie");
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("Winner: "),
            Span::styled(winner.to_string(), Style::default().fg(Color::Green).bold()),
        ]),
        Line::from(""),
        Line::from(format!("Score: {}", state.winning_score())),
        Line::from(""),
        Line::from(vec![
            Span::styled(" BACK TO MENU ", Style::default().fg(Color::Black).bg(Color::Blue)),
            Span::raw("  (b or Enter)"),
        ]),
    ];
    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Game Over "));
    frame.render_widget(widget, frame.area());
}
