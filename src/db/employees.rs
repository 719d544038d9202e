use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::Employee;

/// Map one `Employees` row onto the domain struct. Shared by every query in
/// this module so the column order stays in a single place. Code and
/// department are nullable in the schema and come back as empty strings.
fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        code: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        name: row.get(2)?,
        department: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        base_salary: row.get(4)?,
    })
}

/// Blank codes are stored as NULL so the UNIQUE column constraint only ever
/// applies to real codes; any number of employees may go without one.
fn code_param(code: &str) -> Option<&str> {
    if code.trim().is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Retrieve every employee in insertion order. The query doubles as the
/// single source of truth for how the roster is ordered in the UI and in the
/// monthly report.
pub fn fetch_employees(conn: &Connection) -> Result<Vec<Employee>> {
    let mut stmt = conn
        .prepare("SELECT Id, Code, Name, Department, BaseSalary FROM Employees ORDER BY Id")
        .context("failed to prepare employee query")?;

    let employees = stmt
        .query_map([], employee_from_row)
        .context("failed to load employees")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect employees")?;

    Ok(employees)
}

/// Look up a single employee by primary key. Absence is an expected outcome
/// (the payroll flow relies on it), so it comes back as `None` rather than an
/// error.
pub fn fetch_employee_by_id(conn: &Connection, id: i64) -> Result<Option<Employee>> {
    conn.query_row(
        "SELECT Id, Code, Name, Department, BaseSalary FROM Employees WHERE Id = ?1",
        params![id],
        employee_from_row,
    )
    .optional()
    .context("failed to query employee by id")
}

/// Look up a single employee by exact code match.
pub fn fetch_employee_by_code(conn: &Connection, code: &str) -> Result<Option<Employee>> {
    conn.query_row(
        "SELECT Id, Code, Name, Department, BaseSalary FROM Employees WHERE Code = ?1",
        params![code],
        employee_from_row,
    )
    .optional()
    .context("failed to query employee by code")
}

/// Insert a new employee, returning the hydrated struct so the caller can
/// push it straight into the in-memory roster. Business rejections (blank
/// name, negative salary, non-blank code already taken) come back as
/// `Ok(None)`; only genuine storage faults become errors. Blank codes are
/// deliberately exempt from the duplicate check, so any number of employees
/// may share an empty code.
pub fn create_employee(
    conn: &Connection,
    code: &str,
    name: &str,
    department: &str,
    base_salary: f64,
) -> Result<Option<Employee>> {
    if name.trim().is_empty() || base_salary < 0.0 {
        return Ok(None);
    }

    if !code.trim().is_empty() && fetch_employee_by_code(conn, code)?.is_some() {
        return Ok(None);
    }

    conn.execute(
        "INSERT INTO Employees (Code, Name, Department, BaseSalary)
         VALUES (?1, ?2, ?3, ?4)",
        params![code_param(code), name, department, base_salary],
    )
    .context("failed to insert employee")?;

    let id = conn.last_insert_rowid();
    Ok(Some(Employee {
        id,
        code: code.to_string(),
        name: name.to_string(),
        department: department.to_string(),
        base_salary,
    }))
}

/// Overwrite every mutable field of the row matching `employee.id`. Returns
/// `Ok(false)` without touching the row when a *different* employee already
/// owns the target non-blank code, or when no row matches the id.
pub fn update_employee(conn: &Connection, employee: &Employee) -> Result<bool> {
    if !employee.code.trim().is_empty() {
        if let Some(existing) = fetch_employee_by_code(conn, &employee.code)? {
            if existing.id != employee.id {
                return Ok(false);
            }
        }
    }

    let updated = conn
        .execute(
            "UPDATE Employees SET Code = ?1, Name = ?2, Department = ?3, BaseSalary = ?4
             WHERE Id = ?5",
            params![
                code_param(&employee.code),
                employee.name,
                employee.department,
                employee.base_salary,
                employee.id
            ],
        )
        .context("failed to update employee")?;

    Ok(updated > 0)
}

/// Remove an employee row. Deleting an id that never existed is a silent
/// no-op, and historical Payrolls rows for the employee are left untouched.
pub fn delete_employee(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM Employees WHERE Id = ?1", params![id])
        .context("failed to delete employee")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn create_assigns_ids_in_insertion_order() {
        let conn = memory_db();
        let first = create_employee(&conn, "E010", "Ada", "IT", 30_000.0)
            .unwrap()
            .unwrap();
        let second = create_employee(&conn, "E011", "Grace", "IT", 31_000.0)
            .unwrap()
            .unwrap();

        assert!(second.id > first.id);
        let roster = fetch_employees(&conn).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].name, "Ada");
        assert_eq!(roster[1].name, "Grace");
    }

    #[test]
    fn create_rejects_blank_name_and_negative_salary() {
        let conn = memory_db();
        assert!(create_employee(&conn, "E001", "   ", "IT", 1_000.0)
            .unwrap()
            .is_none());
        assert!(create_employee(&conn, "E001", "Ada", "IT", -0.01)
            .unwrap()
            .is_none());
        assert!(fetch_employees(&conn).unwrap().is_empty());
    }

    #[test]
    fn create_rejects_duplicate_code() {
        let conn = memory_db();
        create_employee(&conn, "E001", "Ada", "IT", 1_000.0).unwrap();
        assert!(create_employee(&conn, "E001", "Grace", "IT", 2_000.0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn blank_codes_never_conflict() {
        let conn = memory_db();
        assert!(create_employee(&conn, "", "Ada", "IT", 1_000.0)
            .unwrap()
            .is_some());
        assert!(create_employee(&conn, "", "Grace", "IT", 2_000.0)
            .unwrap()
            .is_some());
        assert_eq!(fetch_employees(&conn).unwrap().len(), 2);
    }

    #[test]
    fn fetch_by_code_is_exact_match() {
        let conn = memory_db();
        create_employee(&conn, "E001", "Ada", "IT", 1_000.0).unwrap();

        assert!(fetch_employee_by_code(&conn, "E001").unwrap().is_some());
        assert!(fetch_employee_by_code(&conn, "e001").unwrap().is_none());
        assert!(fetch_employee_by_code(&conn, "E00").unwrap().is_none());
    }

    #[test]
    fn update_rejects_code_owned_by_another_employee() {
        let conn = memory_db();
        create_employee(&conn, "E001", "Ada", "IT", 1_000.0).unwrap();
        let mut grace = create_employee(&conn, "E002", "Grace", "IT", 2_000.0)
            .unwrap()
            .unwrap();

        grace.code = "E001".to_string();
        assert!(!update_employee(&conn, &grace).unwrap());

        // The rejected update must leave the row untouched.
        let stored = fetch_employee_by_id(&conn, grace.id).unwrap().unwrap();
        assert_eq!(stored.code, "E002");
        assert_eq!(stored.name, "Grace");
    }

    #[test]
    fn update_with_own_code_succeeds() {
        let conn = memory_db();
        let mut ada = create_employee(&conn, "E001", "Ada", "IT", 1_000.0)
            .unwrap()
            .unwrap();

        ada.department = "Research".to_string();
        ada.base_salary = 1_500.0;
        assert!(update_employee(&conn, &ada).unwrap());

        let stored = fetch_employee_by_id(&conn, ada.id).unwrap().unwrap();
        assert_eq!(stored.department, "Research");
        assert_eq!(stored.base_salary, 1_500.0);
    }

    #[test]
    fn update_of_missing_id_reports_no_rows() {
        let conn = memory_db();
        let ghost = Employee {
            id: 42,
            code: "E099".to_string(),
            name: "Nobody".to_string(),
            department: String::new(),
            base_salary: 0.0,
        };
        assert!(!update_employee(&conn, &ghost).unwrap());
    }

    #[test]
    fn delete_leaves_payroll_history_behind() {
        let conn = memory_db();
        let ada = create_employee(&conn, "E001", "Ada", "IT", 25_000.0)
            .unwrap()
            .unwrap();

        let ledger = crate::payroll::HoursLedger::new();
        crate::payroll::calculate_for_employee(&conn, &ledger, ada.id)
            .unwrap()
            .unwrap();

        delete_employee(&conn, ada.id).unwrap();
        assert!(fetch_employee_by_id(&conn, ada.id).unwrap().is_none());

        // The hard delete must not cascade into (or be blocked by) the
        // employee's historical runs.
        let runs: i64 = conn
            .query_row("SELECT COUNT(*) FROM Payrolls", [], |row| row.get(0))
            .unwrap();
        assert_eq!(runs, 1);
    }

    #[test]
    fn delete_is_silent_for_missing_rows() {
        let conn = memory_db();
        delete_employee(&conn, 999).unwrap();

        let ada = create_employee(&conn, "E001", "Ada", "IT", 1_000.0)
            .unwrap()
            .unwrap();
        delete_employee(&conn, ada.id).unwrap();
        assert!(fetch_employee_by_id(&conn, ada.id).unwrap().is_none());
    }
}
