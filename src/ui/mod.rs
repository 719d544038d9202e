//! Ratatui front-end for the payroll manager. The roster screen plus a small
//! set of modal overlays (employee form, hours prompt, pay slip, report
//! prompt) cover every menu operation of the application; the core payroll
//! and persistence logic lives outside this module and is called from the key
//! handlers.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
