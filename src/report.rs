//! Monthly CSV report generation. The report recomputes every employee's slip
//! from the live hours ledger instead of reading the Payrolls history, so it
//! reflects the hours as currently registered, which may differ from slips
//! persisted earlier in the session.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::db::fetch_employees;
use crate::payroll::{compute_slip, HoursLedger};

/// Fixed header row of the exported report. The column names are part of the
/// file format consumed downstream, so they stay in Spanish regardless of the
/// UI language.
pub const REPORT_HEADER: &str = "Empleado,Salario Bruto,AFP,ARS,ISR,Salario Neto";

/// Write the monthly report to `path`, overwriting any existing file, and
/// return the number of data rows written. One row per employee in store
/// order, every amount formatted with exactly two decimals. Generation is
/// read-only with respect to the database: no payroll run is recorded.
pub fn generate_monthly_report(
    conn: &Connection,
    ledger: &HoursLedger,
    path: &Path,
) -> Result<usize> {
    let employees = fetch_employees(conn)?;

    let mut lines = Vec::with_capacity(employees.len() + 1);
    lines.push(REPORT_HEADER.to_string());

    for employee in &employees {
        let slip = compute_slip(employee, ledger.hours_for(employee.id));
        lines.push(format!(
            "{},{:.2},{:.2},{:.2},{:.2},{:.2}",
            employee.name,
            slip.gross_salary,
            slip.afp,
            slip.ars,
            slip.isr,
            slip.net_salary
        ));
    }

    let row_count = lines.len() - 1;
    fs::write(path, lines.join("\n") + "\n")
        .with_context(|| format!("failed to write report to {}", path.display()))?;

    Ok(row_count)
}
