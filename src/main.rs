//! Binary entry point that glues the SQLite-backed employee store to the TUI.
//! The bootstrapping pipeline is short on purpose: open the database (one
//! connection for the whole process), seed the demo roster on first run,
//! hydrate the initial app state, and drive the Ratatui event loop until the
//! user exits. Dropping the `App` at the end closes the connection.

use payroll_manager::{load_or_seed_employees, open_database, run_app, App};

/// Initialize persistence, load the roster, and launch the event loop.
///
/// Returning a `Result` bubbles up fatal initialization problems (for example
/// an unwritable home directory) to the terminal instead of crashing
/// silently.
fn main() -> anyhow::Result<()> {
    let conn = open_database()?;
    let employees = load_or_seed_employees(&conn)?;

    let mut app = App::new(conn, employees);
    run_app(&mut app)
}
