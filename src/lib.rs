//! Core library surface for the Payroll Manager TUI application.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: the SQLite-backed employee store, the payroll calculator, and the
//! CSV report exporter.

pub mod db;
pub mod models;
pub mod payroll;
pub mod report;
pub mod ui;

/// Convenience re-exports for the persistence layer. These functions are
/// typically used by `main.rs` to initialize the embedded SQLite store and
/// preload the roster.
pub use db::{load_or_seed_employees, open_database};

/// The two primary domain types that other layers manipulate.
pub use models::{Employee, PayrollRun};

/// The calculator state plus the computed-slip type returned to callers.
pub use payroll::{HoursLedger, PayrollSlip};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
