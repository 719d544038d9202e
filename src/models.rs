//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. The intent is that these types stay light-weight data holders so other
//! layers can focus on presentation and persistence logic.

use std::fmt;

#[derive(Debug, Clone)]
/// One employee on the company roster. Validation (non-blank name,
/// non-negative salary, unique non-blank code) happens at write time in the
/// persistence layer, so instances freshly typed into a form may hold values
/// the store will reject.
pub struct Employee {
    /// Primary key from the database. Kept around even when the UI only needs
    /// display information because edit/delete/payroll flows bubble the id
    /// back to the persistence layer.
    pub id: i64,
    /// Short human-assigned code such as `E001`. An empty string means the
    /// employee has no code; uniqueness is only enforced for non-blank codes.
    pub code: String,
    /// Full display name. Required.
    pub name: String,
    /// Free-text department label, empty when unassigned.
    pub department: String,
    /// Monthly base salary the payroll formulas start from. Never negative
    /// once persisted.
    pub base_salary: f64,
}

impl Employee {
    /// Compose a `Code - Name` string that gracefully omits the hyphen when
    /// the code is blank. List rows and confirmation dialogs rely on this
    /// ready-to-use formatting.
    pub fn display_label(&self) -> String {
        if self.code.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.code, self.name)
        }
    }
}

impl fmt::Display for Employee {
    /// Write the display label to any formatter so the type plays nicely with
    /// Ratatui widgets that consume strings implicitly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_label())
    }
}

#[derive(Debug, Clone)]
/// One persisted payroll computation for one employee and calendar period.
/// Rows are append-only: the application inserts them when a calculation runs
/// and never updates or deletes them afterwards.
pub struct PayrollRun {
    /// Primary key from the database; 0 until the row is inserted.
    pub id: i64,
    /// Employee the run was computed for. Informational reference only; the
    /// employee row may be deleted later without touching this history.
    pub employee_id: i64,
    /// Calendar month (1-12) taken from the wall clock at calculation time.
    pub month: u32,
    /// Calendar year taken from the wall clock at calculation time.
    pub year: i32,
    /// Hours the calculation used (registered hours or the 160 default).
    pub hours_worked: f64,
    pub gross_salary: f64,
    pub afp: f64,
    pub ars: f64,
    pub isr: f64,
    pub net_salary: f64,
}
