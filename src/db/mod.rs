//! Persistence module split across logical submodules.

mod connection;
mod employees;
mod payrolls;

pub use connection::{ensure_schema, load_or_seed_employees, open_database};
pub use employees::{
    create_employee, delete_employee, fetch_employee_by_code, fetch_employee_by_id,
    fetch_employees, update_employee,
};
pub use payrolls::insert_payroll_run;
