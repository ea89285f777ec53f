//! App orchestrator — connects the preference store, the location-derived
//! side flag, the session controller, and the TUI frontend.
//!
//! Two screens: the menu loop (name entry, side indicator, START) and the
//! game loop (snapshot-driven rendering of one session). Returning to the
//! menu tears the running session down.

use std::path::PathBuf;
use std::time::Duration;

use highcard_core::deck::HttpDeckClient;
use highcard_core::session::{SessionCommand, SessionHandle};

use crate::prefs::{FilePrefs, Prefs, PrefsStore};
use crate::tui::{MenuModel, Tui, UserIntent};

/// Reference longitude separating the two visual sides.
pub const REFERENCE_LONGITUDE: f64 = 34.817549168324334;

/// How often the game loop polls the keyboard between snapshots.
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Whether a coordinate falls on the west side of the reference longitude.
pub fn is_west_of_reference(longitude: f64) -> bool {
    longitude < REFERENCE_LONGITUDE
}

pub struct App {
    prefs_store: FilePrefs,
    prefs: Prefs,
    longitude: Option<f64>,
    api_base: String,
}

/// Why a screen loop ended.
enum ScreenOutcome {
    Quit,
    SwitchScreen,
}

impl App {
    pub fn new(prefs_path: PathBuf, longitude: Option<f64>, api_base: String) -> Self {
        let prefs_store = FilePrefs::new(prefs_path);
        let prefs = prefs_store.load().unwrap_or_default();
        Self {
            prefs_store,
            prefs,
            longitude,
            api_base,
        }
    }

    /// Run the app: set up the terminal, alternate between the menu and
    /// game loops, and restore the terminal on the way out.
    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut tui = Tui::setup()?;
        let result = self.run_screens(&mut tui).await;
        tui.teardown()?;
        result
    }

    async fn run_screens(&mut self, tui: &mut Tui) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            match self.menu_loop(tui).await? {
                ScreenOutcome::Quit => return Ok(()),
                ScreenOutcome::SwitchScreen => {}
            }
            match self.game_loop(tui).await? {
                ScreenOutcome::Quit => return Ok(()),
                ScreenOutcome::SwitchScreen => {}
            }
        }
    }

    fn menu_model(&self) -> MenuModel {
        MenuModel {
            name: self.prefs.user_name.clone(),
            name_entered: self.prefs.name_entered,
            longitude: self.longitude,
            west_side: self.longitude.map(is_west_of_reference).unwrap_or(false),
        }
    }

    async fn menu_loop(&mut self, tui: &mut Tui) -> Result<ScreenOutcome, Box<dyn std::error::Error>> {
        loop {
            let model = self.menu_model();
            tui.render_menu(&model)?;

            match tui.poll_menu_input(&model)? {
                UserIntent::Quit => return Ok(ScreenOutcome::Quit),
                UserIntent::SaveName(name) => {
                    // Written once, on submission.
                    self.prefs = Prefs {
                        user_name: name,
                        name_entered: true,
                    };
                    self.prefs_store.save(&self.prefs);
                }
                UserIntent::Start if model.start_enabled() => {
                    return Ok(ScreenOutcome::SwitchScreen);
                }
                _ => {}
            }

            tokio::time::sleep(INPUT_POLL_INTERVAL).await;
        }
    }

    async fn game_loop(&mut self, tui: &mut Tui) -> Result<ScreenOutcome, Box<dyn std::error::Error>> {
        let west_side = self.longitude.map(is_west_of_reference).unwrap_or(false);
        let deck = HttpDeckClient::with_base_url(&self.api_base);
        let handle = SessionHandle::spawn(deck, &self.prefs.user_name, west_side);

        let mut rx = handle.snapshots();
        let mut state = handle.snapshot();
        // The watch sender drops when the session task ends (after Done);
        // stop selecting on it then, but keep rendering the final snapshot.
        let mut session_live = true;

        loop {
            tui.render_game(&state)?;

            tokio::select! {
                changed = rx.changed(), if session_live => {
                    match changed {
                        Ok(()) => state = rx.borrow_and_update().clone(),
                        Err(_) => session_live = false,
                    }
                }
                _ = tokio::time::sleep(INPUT_POLL_INTERVAL) => {
                    match tui.poll_game_input(&state)? {
                        UserIntent::BackToMenu => {
                            handle.shutdown();
                            return Ok(ScreenOutcome::SwitchScreen);
                        }
                        UserIntent::Retry => handle.send(SessionCommand::Retry),
                        UserIntent::Quit => {
                            handle.shutdown();
                            return Ok(ScreenOutcome::Quit);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}
