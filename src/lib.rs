// Library surface for headless/integration tests and reuse.
// The terminal front end (screens, widgets, key bindings) lives in main.rs.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod difficulty;
pub mod obstacle;
pub mod outcome;
pub mod progression;
pub mod runtime;
pub mod session;
