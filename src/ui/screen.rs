use ratatui::Frame;

use crate::{
    ui::{field::render_playing, levels::render_level_select, render_level_complete, render_menu},
    App, AppState,
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct MenuScreen;

impl Screen for MenuScreen {
    fn render(&self, _app: &App, f: &mut Frame) {
        render_menu(f);
    }
}

pub struct LevelSelectScreen;

impl Screen for LevelSelectScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_level_select(app, f);
    }
}

/// Road, HUD and tool palette for a running session
pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_playing(app, f);
    }
}

pub struct LevelCompleteScreen;

impl Screen for LevelCompleteScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_level_complete(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Menu => Box::new(MenuScreen),
        AppState::LevelSelect => Box::new(LevelSelectScreen),
        AppState::Playing => Box::new(PlayingScreen),
        AppState::LevelComplete => Box::new(LevelCompleteScreen),
    }
}
