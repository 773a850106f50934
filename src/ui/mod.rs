//! Ratatui front-end: an "add player" form over a roster list whose rows can
//! be switched between Yes, Maybe and No.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
