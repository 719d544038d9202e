use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::{params, Connection};

use crate::models::Employee;

use super::employees::fetch_employees;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".payroll-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "payroll.sqlite";

/// Demonstration roster inserted the first time the store comes up empty, so
/// the application is usable straight away.
const DEMO_EMPLOYEES: &[(&str, &str, &str, f64)] = &[
    ("E001", "María López", "Contabilidad", 25_000.0),
    ("E002", "Juan Pérez", "Operaciones", 18_000.0),
    ("E003", "Ana Gómez", "RRHH", 22_000.0),
];

/// Open the on-disk database, creating the data directory and running lazy
/// migrations on the way. The connection is opened exactly once at startup
/// and owned by the application for the process lifetime; dropping it on
/// shutdown closes the store deterministically.
pub fn open_database() -> Result<Connection> {
    let db_path = db_path()?;

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(&db_path).context("failed to open SQLite database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create both tables if they do not exist yet. The foreign key on
/// `Payrolls.EmployeeId` stays informational (SQLite's default, enforcement
/// off): payroll history must survive the hard delete of its employee, and
/// runs may reference ids that no longer exist.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS Employees (
            Id INTEGER PRIMARY KEY AUTOINCREMENT,
            Code TEXT UNIQUE,
            Name TEXT NOT NULL,
            Department TEXT,
            BaseSalary REAL NOT NULL
        )",
        [],
    )
    .context("failed to create Employees table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Payrolls (
            Id INTEGER PRIMARY KEY AUTOINCREMENT,
            EmployeeId INTEGER,
            Month INTEGER,
            Year INTEGER,
            HoursWorked REAL,
            GrossSalary REAL,
            AFP REAL,
            ARS REAL,
            ISR REAL,
            NetSalary REAL,
            FOREIGN KEY(EmployeeId) REFERENCES Employees(Id)
        )",
        [],
    )
    .context("failed to create Payrolls table")?;

    Ok(())
}

/// Load the existing roster or seed the demonstration employees when the
/// store is brand new. Keeping a named function makes the startup flow in
/// `main.rs` easy to read, and basing the decision on the row count (rather
/// than file existence) keeps the behavior identical for in-memory test
/// databases.
pub fn load_or_seed_employees(conn: &Connection) -> Result<Vec<Employee>> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM Employees", [], |row| row.get(0))
        .context("failed to count employees")?;

    if count == 0 {
        for (code, name, department, base_salary) in DEMO_EMPLOYEES {
            conn.execute(
                "INSERT INTO Employees (Code, Name, Department, BaseSalary)
                 VALUES (?1, ?2, ?3, ?4)",
                params![code, name, department, base_salary],
            )
            .context("failed to seed demo employee")?;
        }
    }

    fetch_employees(conn)
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn seeds_demo_roster_into_empty_store() {
        let conn = memory_db();
        let employees = load_or_seed_employees(&conn).unwrap();

        assert_eq!(employees.len(), 3);
        assert_eq!(employees[0].code, "E001");
        assert_eq!(employees[0].name, "María López");
        assert_eq!(employees[0].base_salary, 25_000.0);
        assert_eq!(employees[2].code, "E003");
    }

    #[test]
    fn does_not_reseed_populated_store() {
        let conn = memory_db();
        load_or_seed_employees(&conn).unwrap();
        let employees = load_or_seed_employees(&conn).unwrap();

        assert_eq!(employees.len(), 3);
    }

    #[test]
    fn schema_creation_is_idempotent() {
        let conn = memory_db();
        ensure_schema(&conn).unwrap();
    }
}
