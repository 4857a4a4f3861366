mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::info;
use potholes::{
    app_dirs::AppDirs,
    clock::{Clock, MonotonicClock, SecondCounter},
    config::{Config, ConfigStore, FileConfigStore},
    obstacle::{ObstacleId, RepairStage, Tool},
    progression::{LevelProgression, Progression, LEVEL_COUNT},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, GameEventSource, Runner, Ticker},
    session::{reduce, retry, Notice, SessionEvent, SessionState, Step},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

/// How long a notice stays on screen
const NOTICE_TTL: Duration = Duration::from_secs(3);

/// repair the city's potholes before the clock runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A road crew game for your terminal: crack, clean and tar every pothole before time runs out. Harder levels bring more potholes and less time."
)]
pub struct Cli {
    /// jump straight into this level
    #[clap(short = 'l', long, value_parser = clap::value_parser!(u32).range(1..=LEVEL_COUNT as i64))]
    level: Option<u32>,

    /// milliseconds each repair step takes
    #[clap(short = 'd', long)]
    repair_delay_ms: Option<u64>,

    /// config file to read instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// write a debug log to this file (RUST_LOG alone logs to the default state dir)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Layer command line flags over the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(ms) = self.repair_delay_ms {
            config.repair_delay_ms = ms;
        }
        if let Some(level) = self.level {
            config.start_level = level;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Menu,
    LevelSelect,
    Playing,
    LevelComplete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub config: Config,
    pub state: AppState,
    pub progression: Progression,
    /// Level under the selector cursor
    pub selected_level: u32,
    pub session: Option<SessionState>,
    /// Index of the obstacle under the field cursor
    pub cursor: usize,
    pub notice: Option<(Notice, Duration)>,
    timer: SecondCounter,
    clock: Box<dyn Clock>,
}

impl App {
    pub fn new(config: Config, clock: Box<dyn Clock>) -> Self {
        let now = clock.now();
        let mut progression = Progression::new();
        let selected_level = config.start_level.clamp(1, LEVEL_COUNT);
        progression.unlock_through(selected_level);

        Self {
            config,
            state: AppState::Menu,
            progression,
            selected_level,
            session: None,
            cursor: 0,
            notice: None,
            timer: SecondCounter::new(now),
            clock,
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn start_level(&mut self, level: u32) {
        let session =
            SessionState::new(level, self.config.session_config(), &mut rand::thread_rng());
        self.begin(session);
    }

    fn begin(&mut self, session: SessionState) {
        self.selected_level = session.level;
        self.session = Some(session);
        self.cursor = 0;
        self.notice = None;
        self.timer.reset(self.clock.now());
        self.state = AppState::Playing;
    }

    fn retry(&mut self) {
        if let Some(session) = &self.session {
            let fresh = retry(session, &mut rand::thread_rng());
            self.begin(fresh);
        }
    }

    fn next_level(&mut self) {
        match self.progression.next_level(self.selected_level) {
            Some(level) if self.progression.is_unlocked(level) => self.start_level(level),
            Some(level) => {
                self.selected_level = level;
                self.state = AppState::LevelSelect;
            }
            None => self.state = AppState::LevelSelect,
        }
    }

    /// Feed one event to the running session and react to what it reports
    pub fn dispatch(&mut self, event: SessionEvent) {
        let Some(session) = self.session.take() else {
            return;
        };
        let Step { state, notices } = reduce(session, event);
        self.session = Some(state);

        let now = self.clock.now();
        for notice in notices {
            match notice {
                Notice::Completed(outcome) => {
                    self.progression.record(&outcome);
                    self.state = AppState::LevelComplete;
                }
                Notice::Progress {
                    stage: RepairStage::Repaired,
                    ..
                } => self.move_cursor(true),
                _ => {}
            }
            self.notice = Some((notice, now));
        }
    }

    pub fn on_tick(&mut self) {
        let now = self.clock.now();

        if let Some((_, shown_at)) = self.notice {
            if now.saturating_sub(shown_at) >= NOTICE_TTL {
                self.notice = None;
            }
        }

        if self.state != AppState::Playing {
            return;
        }

        let paused = self.session.as_ref().is_some_and(|s| s.paused);
        let elapsed_secs = if paused {
            // Paused time never reaches the countdown
            self.timer.reset(now);
            0
        } else {
            self.timer.take(now)
        };

        self.dispatch(SessionEvent::Clock(now));
        if elapsed_secs > 0 {
            self.dispatch(SessionEvent::TimerTick { elapsed_secs });
        }
    }

    fn cursor_id(&self) -> Option<ObstacleId> {
        self.session
            .as_ref()
            .and_then(|s| s.obstacles.get(self.cursor))
            .map(|o| o.id)
    }

    /// Step the cursor to the next (or previous) obstacle that still needs work
    fn move_cursor(&mut self, forward: bool) {
        let Some(session) = &self.session else {
            return;
        };
        let len = session.obstacles.len();
        if len == 0 {
            return;
        }
        for step in 1..=len {
            let idx = if forward {
                (self.cursor + step) % len
            } else {
                (self.cursor + len - step % len) % len
            };
            if !session.obstacles[idx].stage.is_repaired() {
                self.cursor = idx;
                return;
            }
        }
    }

    fn toggle_pause(&mut self) {
        let paused = self.session.as_ref().is_some_and(|s| s.paused);
        if paused {
            self.timer.reset(self.clock.now());
            self.dispatch(SessionEvent::Resume);
        } else {
            self.dispatch(SessionEvent::Pause);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        match self.state {
            AppState::Menu => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.state = AppState::LevelSelect,
                KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
                _ => {}
            },
            AppState::LevelSelect => self.handle_level_select_key(key),
            AppState::Playing => self.handle_playing_key(key),
            AppState::LevelComplete => match key.code {
                KeyCode::Char('r') => self.retry(),
                KeyCode::Char('n') | KeyCode::Enter => self.next_level(),
                KeyCode::Esc => self.state = AppState::LevelSelect,
                _ => {}
            },
        }
        Flow::Continue
    }

    fn handle_level_select_key(&mut self, key: KeyEvent) {
        let level = self.selected_level;
        match key.code {
            KeyCode::Left => self.selected_level = level.saturating_sub(1).max(1),
            KeyCode::Right => self.selected_level = (level + 1).min(LEVEL_COUNT),
            KeyCode::Up if level > ui::LEVEL_COLUMNS => self.selected_level = level - ui::LEVEL_COLUMNS,
            KeyCode::Down if level + ui::LEVEL_COLUMNS <= LEVEL_COUNT => {
                self.selected_level = level + ui::LEVEL_COLUMNS
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.progression.is_unlocked(level) {
                    self.start_level(level);
                }
            }
            KeyCode::Esc => self.state = AppState::Menu,
            _ => {}
        }
    }

    fn handle_playing_key(&mut self, key: KeyEvent) {
        let now = self.clock.now();
        match key.code {
            KeyCode::Char('1') | KeyCode::Char('h') => {
                self.dispatch(SessionEvent::SelectTool(Tool::Hammer))
            }
            KeyCode::Char('2') | KeyCode::Char('s') => {
                self.dispatch(SessionEvent::SelectTool(Tool::Shovel))
            }
            KeyCode::Char('3') | KeyCode::Char('t') => {
                self.dispatch(SessionEvent::SelectTool(Tool::Tar))
            }
            // Shifted tool keys use the tool on the next pothole in line
            KeyCode::Char('H') => self.dispatch(SessionEvent::UseTool {
                tool: Tool::Hammer,
                now,
            }),
            KeyCode::Char('S') => self.dispatch(SessionEvent::UseTool {
                tool: Tool::Shovel,
                now,
            }),
            KeyCode::Char('T') => self.dispatch(SessionEvent::UseTool {
                tool: Tool::Tar,
                now,
            }),
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => self.move_cursor(true),
            KeyCode::Left | KeyCode::Up | KeyCode::BackTab => self.move_cursor(false),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = self.cursor_id() {
                    self.dispatch(SessionEvent::ActivateObstacle { id, now });
                }
            }
            KeyCode::Char('p') => self.toggle_pause(),
            KeyCode::Esc => {
                self.session = None;
                self.state = AppState::LevelSelect;
            }
            _ => {}
        }
    }
}

fn init_logging(cli: &Cli) {
    let path = match &cli.log_file {
        Some(p) => p.clone(),
        None if std::env::var_os("RUST_LOG").is_some() => match AppDirs::log_path() {
            Some(p) => p,
            None => return,
        },
        None => return,
    };

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    // The terminal belongs to the UI, so the log only ever goes to a file
    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Pipe(Box::new(file)))
            .try_init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(&cli);

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = cli.apply(store.load());
    info!("config loaded from {}", store.path().display());

    let mut app = App::new(config, Box::new(MonotonicClock::new()));
    if let Some(level) = cli.level {
        app.start_level(level);
    }
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(app.config.tick_rate()),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: GameEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let flow = match runner.step() {
            GameEvent::Tick => {
                app.on_tick();
                Flow::Continue
            }
            GameEvent::Resize => Flow::Continue,
            GameEvent::Key(key) => app.handle_key(key),
        };

        if flow == Flow::Quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use potholes::clock::ManualClock;
    use potholes::runtime::TestEventSource;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;

    const DELAY: Duration = Duration::from_millis(2000);

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> (App, ManualClock) {
        let clock = ManualClock::new();
        let app = App::new(Config::default(), Box::new(clock.clone()));
        (app, clock)
    }

    fn playing_app(level: u32) -> (App, ManualClock) {
        let (mut app, clock) = test_app();
        app.progression.unlock_through(level);
        app.start_level(level);
        (app, clock)
    }

    fn screen_text(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui::draw(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["potholes"]);

        assert_eq!(cli.level, None);
        assert_eq!(cli.repair_delay_ms, None);
        assert_eq!(cli.config, None);
        assert_eq!(cli.log_file, None);
    }

    #[test]
    fn test_cli_level() {
        let cli = Cli::parse_from(["potholes", "-l", "4"]);
        assert_eq!(cli.level, Some(4));

        let cli = Cli::parse_from(["potholes", "--level", "12"]);
        assert_eq!(cli.level, Some(12));
    }

    #[test]
    fn test_cli_level_out_of_range() {
        assert!(Cli::try_parse_from(["potholes", "-l", "0"]).is_err());
        assert!(Cli::try_parse_from(["potholes", "-l", "13"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["potholes", "-d", "300", "-l", "3"]);
        let config = cli.apply(Config::default());

        assert_eq!(config.repair_delay_ms, 300);
        assert_eq!(config.start_level, 3);
        assert_eq!(config.tick_rate_ms, Config::default().tick_rate_ms);
    }

    #[test]
    fn test_cli_keeps_config_when_flags_absent() {
        let stored = Config {
            start_level: 2,
            repair_delay_ms: 900,
            tick_rate_ms: 50,
        };
        let config = Cli::parse_from(["potholes"]).apply(stored.clone());
        assert_eq!(config, stored);
    }

    #[test]
    fn test_app_starts_at_menu() {
        let (app, _) = test_app();

        assert_eq!(app.state, AppState::Menu);
        assert_eq!(app.selected_level, 1);
        assert!(app.session.is_none());
    }

    #[test]
    fn test_menu_to_first_level() {
        let (mut app, _) = test_app();

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::LevelSelect);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Playing);
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.level, 1);
        assert_eq!(session.obstacles.len(), 5);
    }

    #[test]
    fn test_locked_level_cannot_start() {
        let (mut app, _) = test_app();
        app.state = AppState::LevelSelect;

        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.selected_level, 2);
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.state, AppState::LevelSelect);
        assert!(app.session.is_none());
    }

    #[test]
    fn test_level_select_navigation_bounds() {
        let (mut app, _) = test_app();
        app.state = AppState::LevelSelect;

        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.selected_level, 1);
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.selected_level, 1);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected_level, 1 + ui::LEVEL_COLUMNS);

        app.selected_level = LEVEL_COUNT;
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.selected_level, LEVEL_COUNT);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected_level, LEVEL_COUNT);

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Menu);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _) = test_app();
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Flow::Quit);

        let (mut app, _) = playing_app(1);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Flow::Quit
        );
    }

    #[test]
    fn test_repair_through_keys() {
        let (mut app, clock) = playing_app(1);

        app.handle_key(key(KeyCode::Char('1')));
        app.handle_key(key(KeyCode::Enter));
        assert!(app.session.as_ref().unwrap().is_repairing());

        clock.advance(DELAY);
        app.on_tick();

        let session = app.session.as_ref().unwrap();
        assert_eq!(session.obstacles[0].stage, RepairStage::Cracked);
        assert_eq!(session.score, 100);
        assert!(matches!(app.notice, Some((Notice::Progress { .. }, _))));
    }

    #[test]
    fn test_wrong_tool_shows_notice() {
        let (mut app, _) = playing_app(1);

        app.handle_key(key(KeyCode::Char('t')));
        app.handle_key(key(KeyCode::Enter));

        assert!(matches!(
            app.notice,
            Some((
                Notice::WrongTool {
                    expected: Tool::Hammer,
                    ..
                },
                _
            ))
        ));
        assert!(screen_text(&app).contains("Wrong tool! You need the Hammer first"));
    }

    #[test]
    fn test_notice_expires() {
        let (mut app, clock) = playing_app(1);
        app.handle_key(key(KeyCode::Enter));
        assert!(app.notice.is_some());

        clock.advance(NOTICE_TTL);
        app.on_tick();
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_shifted_tool_key_repairs_next_pothole() {
        let (mut app, clock) = playing_app(1);

        app.handle_key(key(KeyCode::Char('H')));
        clock.advance(DELAY);
        app.on_tick();

        let session = app.session.as_ref().unwrap();
        assert_eq!(session.selected_tool, Some(Tool::Hammer));
        assert_eq!(session.obstacles[0].stage, RepairStage::Cracked);
    }

    #[test]
    fn test_cursor_skips_repaired_obstacles() {
        let (mut app, _) = playing_app(1);
        {
            let session = app.session.as_mut().unwrap();
            session.obstacles[1].stage = RepairStage::Repaired;
            session.obstacles[2].stage = RepairStage::Repaired;
        }

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.cursor, 3);
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.cursor, 0);
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.cursor, 4);
    }

    #[test]
    fn test_timer_follows_clock() {
        let (mut app, clock) = playing_app(1);

        clock.advance(Duration::from_millis(2500));
        app.on_tick();
        assert_eq!(app.session.as_ref().unwrap().remaining_secs, 56);

        clock.advance(Duration::from_millis(500));
        app.on_tick();
        assert_eq!(app.session.as_ref().unwrap().remaining_secs, 55);
    }

    #[test]
    fn test_pause_stops_the_clock() {
        let (mut app, clock) = playing_app(1);

        app.handle_key(key(KeyCode::Char('p')));
        clock.advance(Duration::from_secs(10));
        app.on_tick();
        assert_eq!(app.session.as_ref().unwrap().remaining_secs, 58);
        assert!(screen_text(&app).contains("PAUSED"));

        app.handle_key(key(KeyCode::Char('p')));
        clock.advance(Duration::from_secs(1));
        app.on_tick();
        assert_eq!(app.session.as_ref().unwrap().remaining_secs, 57);
    }

    #[test]
    fn test_timeout_completes_level_and_unlocks_next() {
        let (mut app, clock) = playing_app(1);

        clock.advance(Duration::from_secs(58));
        app.on_tick();

        assert_eq!(app.state, AppState::LevelComplete);
        let outcome = app.session.as_ref().unwrap().outcome.unwrap();
        assert_eq!(outcome.stars, 1);
        assert_eq!(app.progression.stars_for(1), 1);
        assert!(app.progression.is_unlocked(2));

        let text = screen_text(&app);
        assert!(text.contains("Level 1 Complete!"));
        assert!(text.contains("Score: 0"));
    }

    #[test]
    fn test_next_level_after_completion() {
        let (mut app, clock) = playing_app(1);
        clock.advance(Duration::from_secs(58));
        app.on_tick();

        app.handle_key(key(KeyCode::Char('n')));

        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.session.as_ref().unwrap().level, 2);
        assert_eq!(app.session.as_ref().unwrap().remaining_secs, 56);
    }

    #[test]
    fn test_next_after_last_level_returns_to_selector() {
        let (mut app, clock) = playing_app(LEVEL_COUNT);
        clock.advance(Duration::from_secs(60));
        app.on_tick();
        assert_eq!(app.state, AppState::LevelComplete);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::LevelSelect);
    }

    #[test]
    fn test_retry_restarts_same_level() {
        let (mut app, clock) = playing_app(3);
        app.handle_key(key(KeyCode::Char('H')));
        clock.advance(DELAY);
        app.on_tick();
        clock.advance(Duration::from_secs(60));
        app.on_tick();
        assert_eq!(app.state, AppState::LevelComplete);

        app.handle_key(key(KeyCode::Char('r')));

        let session = app.session.as_ref().unwrap();
        assert_eq!(app.state, AppState::Playing);
        assert_eq!(session.level, 3);
        assert_eq!(session.score, 0);
        assert_eq!(session.remaining_secs, 54);
        assert!(session
            .obstacles
            .iter()
            .all(|o| o.stage == RepairStage::Unrepaired));
    }

    #[test]
    fn test_escape_leaves_level() {
        let (mut app, _) = playing_app(1);
        app.handle_key(key(KeyCode::Esc));

        assert_eq!(app.state, AppState::LevelSelect);
        assert!(app.session.is_none());
    }

    #[test]
    fn test_render_every_screen() {
        let (mut app, _) = test_app();
        assert!(screen_text(&app).contains("POTHOLES"));

        app.state = AppState::LevelSelect;
        let text = screen_text(&app);
        assert!(text.contains("Level 1"));
        assert!(text.contains("locked"));

        app.start_level(1);
        let text = screen_text(&app);
        assert!(text.contains("Score: 0"));
        assert!(text.contains("Time: 58s"));
        assert!(text.contains("Crack Open"));
    }

    #[test]
    fn test_start_tui_quits_on_escape_from_menu() {
        let (mut app, _) = test_app();
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Key(key(KeyCode::Esc))).unwrap();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        start_tui(&mut terminal, &mut app, &runner).unwrap();
        assert_eq!(app.state, AppState::Menu);
    }
}
