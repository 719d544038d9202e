use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::models::PayrollRun;

/// Append one payroll run to the history table and return the assigned id.
/// Runs are write-once: nothing in the application updates or deletes them,
/// so this is the whole surface of the module.
pub fn insert_payroll_run(conn: &Connection, run: &PayrollRun) -> Result<i64> {
    conn.execute(
        "INSERT INTO Payrolls
         (EmployeeId, Month, Year, HoursWorked, GrossSalary, AFP, ARS, ISR, NetSalary)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            run.employee_id,
            run.month,
            run.year,
            run.hours_worked,
            run.gross_salary,
            run.afp,
            run.ars,
            run.isr,
            run.net_salary
        ],
    )
    .context("failed to insert payroll run")?;

    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    #[test]
    fn inserted_run_round_trips_through_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        let run = PayrollRun {
            id: 0,
            employee_id: 7,
            month: 6,
            year: 2026,
            hours_worked: 152.0,
            gross_salary: 23_750.0,
            afp: 681.63,
            ars: 722.0,
            isr: 0.0,
            net_salary: 22_346.37,
        };
        let id = insert_payroll_run(&conn, &run).unwrap();
        assert!(id > 0);

        let (employee_id, month, year, net): (i64, u32, i32, f64) = conn
            .query_row(
                "SELECT EmployeeId, Month, Year, NetSalary FROM Payrolls WHERE Id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(employee_id, 7);
        assert_eq!(month, 6);
        assert_eq!(year, 2026);
        assert_eq!(net, 22_346.37);
    }
}
