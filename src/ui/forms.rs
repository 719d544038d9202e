use anyhow::{anyhow, Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::Employee;

/// Internal representation of the employee form fields. Shared between the
/// add and edit flows; the salary stays a string until save so the user can
/// type partial values like `2500.` without fighting the parser.
#[derive(Default, Clone)]
pub(crate) struct EmployeeForm {
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) department: String,
    pub(crate) salary: String,
    pub(crate) active: EmployeeField,
    pub(crate) error: Option<String>,
}

/// Fields available within the employee form.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum EmployeeField {
    #[default]
    Code,
    Name,
    Department,
    Salary,
}

impl EmployeeForm {
    /// Populate the form from an existing employee when editing.
    pub(crate) fn from_employee(employee: &Employee) -> Self {
        Self {
            code: employee.code.clone(),
            name: employee.name.clone(),
            department: employee.department.clone(),
            salary: format_salary(employee.base_salary),
            active: EmployeeField::Code,
            error: None,
        }
    }

    /// Cycle focus across the four fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            EmployeeField::Code => EmployeeField::Name,
            EmployeeField::Name => EmployeeField::Department,
            EmployeeField::Department => EmployeeField::Salary,
            EmployeeField::Salary => EmployeeField::Code,
        };
    }

    /// Append a character to the active field, validating allowed input. The
    /// salary field accepts digits and at most one decimal point, so negative
    /// or non-numeric salaries cannot even be typed.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            EmployeeField::Salary => {
                if ch.is_ascii_digit() || (ch == '.' && !self.salary.contains('.')) {
                    self.salary.push(ch);
                    true
                } else {
                    false
                }
            }
            EmployeeField::Code => push_text(&mut self.code, ch),
            EmployeeField::Name => push_text(&mut self.name, ch),
            EmployeeField::Department => push_text(&mut self.department, ch),
        }
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            EmployeeField::Code => {
                self.code.pop();
            }
            EmployeeField::Name => {
                self.name.pop();
            }
            EmployeeField::Department => {
                self.department.pop();
            }
            EmployeeField::Salary => {
                self.salary.pop();
            }
        }
    }

    /// Validate and normalize the inputs, returning typed values ready for
    /// persistence. Parse failures stay in this layer; the store only ever
    /// sees a well-formed salary.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String, String, f64)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(anyhow!("Employee name is required."));
        }
        let salary_raw = self.salary.trim();
        if salary_raw.is_empty() {
            return Err(anyhow!("Base salary is required."));
        }
        let salary = salary_raw
            .parse::<f64>()
            .context("Base salary must be a number.")?;
        Ok((
            self.code.trim().to_string(),
            name.to_string(),
            self.department.trim().to_string(),
            salary,
        ))
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: EmployeeField) -> Line<'static> {
        let value = self.value(field);
        let placeholder = match field {
            EmployeeField::Name | EmployeeField::Salary => "<required>",
            EmployeeField::Code | EmployeeField::Department => "<optional>",
        };
        build_field_line(field_name, value, placeholder, self.active == field)
    }

    /// Return the character count for the requested field.
    pub(crate) fn value_len(&self, field: EmployeeField) -> usize {
        self.value(field).chars().count()
    }

    fn value(&self, field: EmployeeField) -> &str {
        match field {
            EmployeeField::Code => &self.code,
            EmployeeField::Name => &self.name,
            EmployeeField::Department => &self.department,
            EmployeeField::Salary => &self.salary,
        }
    }
}

/// State for confirming the removal of an employee. Historical payroll runs
/// survive the deletion, so the dialog says so.
#[derive(Clone)]
pub(crate) struct ConfirmEmployeeDelete {
    pub(crate) id: i64,
    pub(crate) label: String,
}

impl ConfirmEmployeeDelete {
    /// Build the confirmation state from the employee being considered.
    pub(crate) fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            label: employee.display_label(),
        }
    }
}

/// Single-field prompt for the hours worked this month by one employee.
#[derive(Clone)]
pub(crate) struct HoursForm {
    pub(crate) employee_id: i64,
    pub(crate) employee_label: String,
    pub(crate) hours: String,
    pub(crate) error: Option<String>,
}

impl HoursForm {
    /// Seed the prompt with the hours currently in the ledger so re-running a
    /// calculation shows what it will use by default.
    pub(crate) fn new(employee: &Employee, current_hours: f64) -> Self {
        Self {
            employee_id: employee.id,
            employee_label: employee.display_label(),
            hours: format_salary(current_hours),
            error: None,
        }
    }

    /// Append a character, digits and at most one decimal point only.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_ascii_digit() || (ch == '.' && !self.hours.contains('.')) {
            self.hours.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.hours.pop();
    }

    /// Parse the typed hours.
    pub(crate) fn parse_hours(&self) -> Result<f64> {
        let raw = self.hours.trim();
        if raw.is_empty() {
            return Err(anyhow!("Hours worked are required."));
        }
        raw.parse::<f64>().context("Hours must be a number.")
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        build_field_line("Hours", &self.hours, "<required>", true)
    }

    pub(crate) fn value_len(&self) -> usize {
        self.hours.chars().count()
    }
}

/// Prompt for the CSV report destination, pre-filled with the conventional
/// file name in the current working directory.
#[derive(Clone)]
pub(crate) struct ReportForm {
    pub(crate) path: String,
    pub(crate) error: Option<String>,
}

impl ReportForm {
    pub(crate) fn new() -> Self {
        Self {
            path: "monthly_report.csv".to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.path.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.path.pop();
    }

    pub(crate) fn parse_path(&self) -> Result<String> {
        let raw = self.path.trim();
        if raw.is_empty() {
            return Err(anyhow!("Report path is required."));
        }
        Ok(raw.to_string())
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        build_field_line("Path", &self.path, "<required>", true)
    }

    pub(crate) fn value_len(&self) -> usize {
        self.path.chars().count()
    }
}

/// Append a printable character to a free-text field.
fn push_text(value: &mut String, ch: char) -> bool {
    if ch.is_control() {
        false
    } else {
        value.push(ch);
        true
    }
}

/// Style one `Name: value` line, highlighting the active field and ghosting
/// placeholders for empty ones.
fn build_field_line(
    field_name: &str,
    value: &str,
    placeholder: &str,
    is_active: bool,
) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// Format a stored amount for editing: drop the decimals when they are zero
/// so `25000` round-trips as typed instead of becoming `25000.00`.
fn format_salary(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee() -> Employee {
        Employee {
            id: 1,
            code: "E001".to_string(),
            name: "Ada".to_string(),
            department: "IT".to_string(),
            base_salary: 25_000.0,
        }
    }

    #[test]
    fn salary_field_rejects_non_numeric_input() {
        let mut form = EmployeeForm::default();
        form.active = EmployeeField::Salary;

        assert!(form.push_char('2'));
        assert!(form.push_char('.'));
        assert!(!form.push_char('.'));
        assert!(!form.push_char('-'));
        assert!(!form.push_char('x'));
        assert_eq!(form.salary, "2.");
    }

    #[test]
    fn parse_inputs_requires_name_and_salary() {
        let mut form = EmployeeForm::default();
        assert!(form.parse_inputs().is_err());

        form.name = "Ada".to_string();
        assert!(form.parse_inputs().is_err());

        form.salary = "25000".to_string();
        let (code, name, department, salary) = form.parse_inputs().unwrap();
        assert_eq!(code, "");
        assert_eq!(name, "Ada");
        assert_eq!(department, "");
        assert_eq!(salary, 25_000.0);
    }

    #[test]
    fn edit_form_round_trips_whole_salaries_without_decimals() {
        let form = EmployeeForm::from_employee(&employee());
        assert_eq!(form.salary, "25000");
    }

    #[test]
    fn hours_form_parses_typed_value() {
        let mut form = HoursForm::new(&employee(), 160.0);
        assert_eq!(form.hours, "160");

        form.backspace();
        form.backspace();
        form.backspace();
        form.push_char('8');
        form.push_char('0');
        assert_eq!(form.parse_hours().unwrap(), 80.0);
    }

    #[test]
    fn report_form_rejects_blank_path() {
        let mut form = ReportForm::new();
        assert_eq!(form.parse_path().unwrap(), "monthly_report.csv");

        form.path.clear();
        assert!(form.parse_path().is_err());
    }
}
