//! Payroll calculation: turning (base salary, hours worked) into a pay slip
//! and recording each computed run. The formulas live in one pure function so
//! the monthly report can reuse them without touching the history table.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{Datelike, Local};
use rusqlite::Connection;

use crate::db::{fetch_employee_by_id, insert_payroll_run};
use crate::models::{Employee, PayrollRun};

/// Denominator for the hourly rate. The divisor stays fixed at the standard
/// month even when the registered hours differ, which is how overtime ends up
/// paid at the plain hourly rate.
pub const STANDARD_MONTHLY_HOURS: f64 = 160.0;
/// Pension-fund contribution rate applied to gross pay.
pub const AFP_RATE: f64 = 0.0287;
/// Health-insurance contribution rate applied to gross pay.
pub const ARS_RATE: f64 = 0.0304;
/// Monthly gross amount above which income tax starts applying.
pub const ISR_THRESHOLD: f64 = 34_685.0;
/// Flat income-tax rate on the gross amount exceeding the threshold. A
/// single-bracket simplification, not a real progressive table.
pub const ISR_RATE: f64 = 0.15;

/// Round a currency amount to two decimals, halves away from zero.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Transient mapping from employee id to the most recently registered hours
/// for the current process lifetime. Owned by the composition root and passed
/// by reference into the calculator and the report, so separate app or test
/// instances never leak hours into each other.
#[derive(Debug, Default)]
pub struct HoursLedger {
    hours: HashMap<i64, f64>,
}

impl HoursLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the hours worked for an employee, unconditionally overwriting
    /// any earlier entry. No check that the employee exists; a stale entry
    /// for a deleted id is harmless because nothing ever looks it up again.
    pub fn register(&mut self, employee_id: i64, hours: f64) {
        self.hours.insert(employee_id, hours);
    }

    /// Hours to use for an employee: the registered value, or the standard
    /// month when nothing has been registered yet.
    pub fn hours_for(&self, employee_id: i64) -> f64 {
        self.hours
            .get(&employee_id)
            .copied()
            .unwrap_or(STANDARD_MONTHLY_HOURS)
    }
}

/// The result of one payroll computation, every amount already rounded to two
/// decimals and ready for display or CSV serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollSlip {
    pub employee_id: i64,
    pub employee_name: String,
    pub hours_worked: f64,
    pub gross_salary: f64,
    pub afp: f64,
    pub ars: f64,
    pub isr: f64,
    pub net_salary: f64,
}

/// Apply the deduction formulas to one employee. Pure function: both the
/// interactive calculation and the monthly report go through here so the two
/// can never drift apart.
pub fn compute_slip(employee: &Employee, hours: f64) -> PayrollSlip {
    let hourly_rate = employee.base_salary / STANDARD_MONTHLY_HOURS;
    let gross = round_currency(hourly_rate * hours);
    let afp = round_currency(gross * AFP_RATE);
    let ars = round_currency(gross * ARS_RATE);
    let isr = compute_isr(gross);
    let net = round_currency(gross - afp - ars - isr);

    PayrollSlip {
        employee_id: employee.id,
        employee_name: employee.name.clone(),
        hours_worked: hours,
        gross_salary: gross,
        afp,
        ars,
        isr,
        net_salary: net,
    }
}

/// Income tax on one month's gross pay: nothing up to the threshold, a flat
/// 15% on the excess above it.
fn compute_isr(gross: f64) -> f64 {
    if gross <= ISR_THRESHOLD {
        0.0
    } else {
        round_currency((gross - ISR_THRESHOLD) * ISR_RATE)
    }
}

/// Compute the pay slip for one employee and append it to the Payrolls
/// history, stamped with the current local month and year. An unknown id
/// yields `Ok(None)` and persists nothing; the caller decides how to surface
/// the absence.
pub fn calculate_for_employee(
    conn: &Connection,
    ledger: &HoursLedger,
    employee_id: i64,
) -> Result<Option<PayrollSlip>> {
    let Some(employee) = fetch_employee_by_id(conn, employee_id)? else {
        return Ok(None);
    };

    let hours = ledger.hours_for(employee_id);
    let slip = compute_slip(&employee, hours);

    let now = Local::now();
    let run = PayrollRun {
        id: 0,
        employee_id: employee.id,
        month: now.month(),
        year: now.year(),
        hours_worked: hours,
        gross_salary: slip.gross_salary,
        afp: slip.afp,
        ars: slip.ars,
        isr: slip.isr,
        net_salary: slip.net_salary,
    };
    insert_payroll_run(conn, &run)?;

    Ok(Some(slip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_employee, ensure_schema};

    fn employee(base_salary: f64) -> Employee {
        Employee {
            id: 1,
            code: "E001".to_string(),
            name: "María López".to_string(),
            department: "Contabilidad".to_string(),
            base_salary,
        }
    }

    fn payroll_row_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM Payrolls", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn default_hours_reproduce_base_salary_exactly() {
        let slip = compute_slip(&employee(25_000.0), STANDARD_MONTHLY_HOURS);
        assert_eq!(slip.gross_salary, 25_000.0);
    }

    #[test]
    fn gross_scales_with_hours_at_fixed_hourly_rate() {
        // 80 hours at 25000/160 = 156.25 per hour.
        let slip = compute_slip(&employee(25_000.0), 80.0);
        assert_eq!(slip.gross_salary, 12_500.0);

        // Overtime keeps the same divisor.
        let slip = compute_slip(&employee(25_000.0), 170.0);
        assert_eq!(slip.gross_salary, 26_562.5);
    }

    #[test]
    fn slip_below_isr_threshold_matches_reference_values() {
        let slip = compute_slip(&employee(25_000.0), 160.0);
        assert_eq!(slip.gross_salary, 25_000.0);
        assert_eq!(slip.afp, 717.5);
        assert_eq!(slip.ars, 760.0);
        assert_eq!(slip.isr, 0.0);
        assert_eq!(slip.net_salary, 23_522.5);
    }

    #[test]
    fn slip_above_isr_threshold_matches_reference_values() {
        let slip = compute_slip(&employee(50_000.0), 160.0);
        assert_eq!(slip.gross_salary, 50_000.0);
        assert_eq!(slip.afp, 1_435.0);
        assert_eq!(slip.ars, 1_520.0);
        assert_eq!(slip.isr, 2_297.25);
        assert_eq!(slip.net_salary, 44_747.75);
    }

    #[test]
    fn isr_boundary_cases() {
        assert_eq!(compute_isr(34_685.0), 0.0);
        // One cent over the threshold still rounds down to zero tax.
        assert_eq!(compute_isr(34_685.01), 0.0);
        assert_eq!(compute_isr(34_785.0), 15.0);
    }

    #[test]
    fn net_never_exceeds_gross() {
        for base in [0.0, 999.99, 25_000.0, 34_685.0, 50_000.0, 123_456.78] {
            for hours in [0.0, 40.0, 160.0, 200.0] {
                let slip = compute_slip(&employee(base), hours);
                assert!(slip.net_salary <= slip.gross_salary);
            }
        }
    }

    #[test]
    fn ledger_defaults_to_standard_hours_and_overwrites_on_register() {
        let mut ledger = HoursLedger::new();
        assert_eq!(ledger.hours_for(1), 160.0);

        ledger.register(1, 120.0);
        assert_eq!(ledger.hours_for(1), 120.0);

        ledger.register(1, 150.0);
        assert_eq!(ledger.hours_for(1), 150.0);
        assert_eq!(ledger.hours_for(2), 160.0);
    }

    #[test]
    fn calculation_persists_exactly_one_run() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let ada = create_employee(&conn, "E001", "María López", "Contabilidad", 25_000.0)
            .unwrap()
            .unwrap();

        let mut ledger = HoursLedger::new();
        ledger.register(ada.id, 160.0);

        let slip = calculate_for_employee(&conn, &ledger, ada.id)
            .unwrap()
            .unwrap();
        assert_eq!(slip.employee_name, "María López");
        assert_eq!(slip.net_salary, 23_522.5);
        assert_eq!(payroll_row_count(&conn), 1);

        calculate_for_employee(&conn, &ledger, ada.id).unwrap();
        assert_eq!(payroll_row_count(&conn), 2);
    }

    #[test]
    fn calculation_for_unknown_employee_persists_nothing() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        let ledger = HoursLedger::new();
        assert!(calculate_for_employee(&conn, &ledger, 404)
            .unwrap()
            .is_none());
        assert_eq!(payroll_row_count(&conn), 0);
    }
}
