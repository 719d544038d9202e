use std::mem;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use crossterm::event::KeyCode;
use open::that as open_report;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use crate::db::{create_employee, delete_employee, fetch_employees, update_employee};
use crate::models::Employee;
use crate::payroll::{calculate_for_employee, HoursLedger, PayrollSlip};
use crate::report::generate_monthly_report;

use super::forms::{ConfirmEmployeeDelete, EmployeeField, EmployeeForm, HoursForm, ReportForm};
use super::helpers::{centered_rect, surface_error};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// Fine-grained modes layered over the roster screen. Keeping this explicit
/// makes it easy to reason about which rendering path runs and what keyboard
/// shortcuts should do.
enum Mode {
    Normal,
    AddingEmployee(EmployeeForm),
    EditingEmployee { id: i64, form: EmployeeForm },
    ConfirmDelete(ConfirmEmployeeDelete),
    RegisteringHours(HoursForm),
    ViewingSlip(PayrollSlip),
    ExportingReport(ReportForm),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI. The composition root
/// owns the single database connection and the in-memory hours ledger;
/// everything else borrows them through here.
pub struct App {
    conn: Connection,
    employees: Vec<Employee>,
    selected: usize,
    ledger: HoursLedger,
    mode: Mode,
    status: Option<StatusMessage>,
    last_report: Option<PathBuf>,
}

impl App {
    pub fn new(conn: Connection, employees: Vec<Employee>) -> Self {
        Self {
            conn,
            employees,
            selected: 0,
            ledger: HoursLedger::new(),
            mode: Mode::Normal,
            status: None,
            last_report: None,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingEmployee(form) => self.handle_add_employee(code, form)?,
            Mode::EditingEmployee { id, form } => self.handle_edit_employee(code, id, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::RegisteringHours(form) => self.handle_register_hours(code, form)?,
            Mode::ViewingSlip(_) => Mode::Normal,
            Mode::ExportingReport(form) => self.handle_export_report(code, form)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingEmployee(EmployeeForm::default()));
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(employee) = self.current_employee().cloned() {
                    self.clear_status();
                    return Ok(Mode::EditingEmployee {
                        id: employee.id,
                        form: EmployeeForm::from_employee(&employee),
                    });
                } else {
                    self.set_status("No employee selected to edit.", StatusKind::Error);
                }
            }
            KeyCode::Char('-') => {
                if let Some(employee) = self.current_employee() {
                    let confirm = ConfirmEmployeeDelete::from(employee);
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(confirm));
                } else {
                    self.set_status("No employee selected to remove.", StatusKind::Error);
                }
            }
            KeyCode::Enter | KeyCode::Char('h') | KeyCode::Char('H') => {
                if let Some(employee) = self.current_employee() {
                    let form = HoursForm::new(employee, self.ledger.hours_for(employee.id));
                    self.clear_status();
                    return Ok(Mode::RegisteringHours(form));
                } else {
                    self.set_status("No employee selected for payroll.", StatusKind::Error);
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.clear_status();
                return Ok(Mode::ExportingReport(ReportForm::new()));
            }
            KeyCode::Char('o') | KeyCode::Char('O') => {
                if let Some(path) = self.last_report.clone() {
                    if let Err(err) = open_report(&path) {
                        self.set_status(
                            format!("Failed to open report: {err}"),
                            StatusKind::Error,
                        );
                    } else {
                        self.set_status(
                            format!("Opened {}.", path.display()),
                            StatusKind::Info,
                        );
                    }
                } else {
                    self.set_status("No report generated yet.", StatusKind::Error);
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_employee(&mut self, code: KeyCode, mut form: EmployeeForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add employee cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_employee(&form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingEmployee(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_employee(
        &mut self,
        code: KeyCode,
        id: i64,
        mut form: EmployeeForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_employee(id, &form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingEmployee { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmEmployeeDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(_) => Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_register_hours(&mut self, code: KeyCode, mut form: HoursForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Payroll calculation cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                form.backspace();
                Ok(Mode::RegisteringHours(form))
            }
            KeyCode::Enter => match form.parse_hours() {
                Ok(hours) => {
                    self.ledger.register(form.employee_id, hours);
                    match calculate_for_employee(&self.conn, &self.ledger, form.employee_id)? {
                        Some(slip) => {
                            self.set_status(
                                format!("Payroll saved for {}.", slip.employee_name),
                                StatusKind::Info,
                            );
                            Ok(Mode::ViewingSlip(slip))
                        }
                        None => {
                            self.set_status("Employee not found.", StatusKind::Error);
                            Ok(Mode::Normal)
                        }
                    }
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Ok(Mode::RegisteringHours(form))
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
                Ok(Mode::RegisteringHours(form))
            }
            _ => Ok(Mode::RegisteringHours(form)),
        }
    }

    fn handle_export_report(&mut self, code: KeyCode, mut form: ReportForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Report cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                form.backspace();
                Ok(Mode::ExportingReport(form))
            }
            KeyCode::Enter => match form.parse_path() {
                Ok(path) => {
                    let path = PathBuf::from(path);
                    match generate_monthly_report(&self.conn, &self.ledger, &path) {
                        Ok(rows) => {
                            self.set_status(
                                format!("Report written to {} ({rows} rows).", path.display()),
                                StatusKind::Info,
                            );
                            self.last_report = Some(path);
                            Ok(Mode::Normal)
                        }
                        Err(err) => {
                            let message = surface_error(&err);
                            form.error = Some(message.clone());
                            self.set_status(message, StatusKind::Error);
                            Ok(Mode::ExportingReport(form))
                        }
                    }
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Ok(Mode::ExportingReport(form))
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
                Ok(Mode::ExportingReport(form))
            }
            _ => Ok(Mode::ExportingReport(form)),
        }
    }

    /// Persist a brand new employee from the form. Store-level rejections
    /// (duplicate code, invalid data) are surfaced as a single message, the
    /// same way the store collapses them into one boolean outcome.
    fn save_new_employee(&mut self, form: &EmployeeForm) -> Result<()> {
        let (code, name, department, salary) = form.parse_inputs()?;
        match create_employee(&self.conn, &code, &name, &department, salary)? {
            Some(employee) => {
                self.refresh_employees()?;
                self.select_employee(employee.id);
                self.set_status(
                    format!("Employee {} added.", employee.display_label()),
                    StatusKind::Info,
                );
                Ok(())
            }
            None => Err(anyhow!("Invalid data or duplicate code.")),
        }
    }

    /// Persist edits to an existing employee.
    fn save_existing_employee(&mut self, id: i64, form: &EmployeeForm) -> Result<()> {
        let (code, name, department, salary) = form.parse_inputs()?;
        let employee = Employee {
            id,
            code,
            name,
            department,
            base_salary: salary,
        };
        if update_employee(&self.conn, &employee)? {
            self.refresh_employees()?;
            self.select_employee(id);
            self.set_status(
                format!("Employee {} updated.", employee.display_label()),
                StatusKind::Info,
            );
            Ok(())
        } else {
            Err(anyhow!("Invalid data or duplicate code."))
        }
    }

    /// Delete the confirmed employee and reload the roster. Historical
    /// payroll runs stay behind on purpose.
    fn perform_delete(&mut self, confirm: &ConfirmEmployeeDelete) -> Result<()> {
        delete_employee(&self.conn, confirm.id)?;
        self.refresh_employees()?;
        self.set_status(
            format!("Employee {} removed.", confirm.label),
            StatusKind::Info,
        );
        Ok(())
    }

    /// Reload the roster from the store and clamp the selection so it always
    /// points at a real row (or nothing when the roster emptied out).
    fn refresh_employees(&mut self) -> Result<()> {
        self.employees = fetch_employees(&self.conn)?;
        if self.selected >= self.employees.len() {
            self.selected = self.employees.len().saturating_sub(1);
        }
        Ok(())
    }

    fn select_employee(&mut self, id: i64) {
        if let Some(index) = self.employees.iter().position(|e| e.id == id) {
            self.selected = index;
        }
    }

    fn current_employee(&self) -> Option<&Employee> {
        self.employees.get(self.selected)
    }

    fn move_selection(&mut self, delta: isize) {
        if self.employees.is_empty() {
            return;
        }
        let last = self.employees.len() - 1;
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, last as isize) as usize;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_roster(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingEmployee(form) => {
                self.draw_employee_form(frame, area, "Add Employee", form)
            }
            Mode::EditingEmployee { form, .. } => {
                self.draw_employee_form(frame, area, "Edit Employee", form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::RegisteringHours(form) => self.draw_hours_form(frame, area, form),
            Mode::ViewingSlip(slip) => self.draw_slip(frame, area, slip),
            Mode::ExportingReport(form) => self.draw_report_form(frame, area, form),
            Mode::Normal => {}
        }
    }

    fn draw_roster(&self, frame: &mut Frame, area: Rect) {
        if self.employees.is_empty() {
            let message = Paragraph::new("No employees yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::NONE));
            frame.render_widget(message, area);
            return;
        }

        let header = Row::new(vec!["Id", "Code", "Name", "Department", "Base Salary"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = self.employees.iter().map(|employee| {
            Row::new(vec![
                Cell::from(employee.id.to_string()),
                Cell::from(employee.code.clone()),
                Cell::from(employee.name.clone()),
                Cell::from(employee.department.clone()),
                Cell::from(format!("{:.2}", employee.base_salary)),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(5),
                Constraint::Length(8),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Length(12),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Employees"))
        .row_highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let mut state = TableState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::Normal => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[-]", key_style),
                Span::raw(" Remove   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Payroll   "),
                Span::styled("[r]", key_style),
                Span::raw(" Report   "),
                Span::styled("[o]", key_style),
                Span::raw(" Open Report   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
            Mode::ConfirmDelete(_) => Line::from(vec![
                Span::styled("[Y]", key_style),
                Span::raw(" Confirm   "),
                Span::styled("[N/Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::ViewingSlip(_) => Line::from(vec![
                Span::styled("[Any key]", key_style),
                Span::raw(" Close"),
            ]),
            _ => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
        }
    }

    fn draw_employee_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &EmployeeForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Code", EmployeeField::Code),
            form.build_line("Name", EmployeeField::Name),
            form.build_line("Department", EmployeeField::Department),
            form.build_line("Base salary", EmployeeField::Salary),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (prefix, row) = match form.active {
            EmployeeField::Code => ("Code: ", 0),
            EmployeeField::Name => ("Name: ", 1),
            EmployeeField::Department => ("Department: ", 2),
            EmployeeField::Salary => ("Base salary: ", 3),
        };
        let cursor_x = inner.x + prefix.len() as u16 + form.value_len(form.active) as u16;
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_hours_form(&self, frame: &mut Frame, area: Rect, form: &HoursForm) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Register Hours")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(format!("Hours worked this month for {}.", form.employee_label)),
            form.build_line(),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to calculate • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + "Hours: ".len() as u16 + form.value_len() as u16;
        frame.set_cursor_position((cursor_x, inner.y + 1));
    }

    fn draw_report_form(&self, frame: &mut Frame, area: Rect, form: &ReportForm) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Generate Monthly Report")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![form.build_line(), Line::from("")];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to write the CSV • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + "Path: ".len() as u16 + form.value_len() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmEmployeeDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Remove employee {}?", confirm.label)),
            Line::from("Historical payroll runs are kept."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_slip(&self, frame: &mut Frame, area: Rect, slip: &PayrollSlip) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Pay Slip").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Employee: {}", slip.employee_name)),
            Line::from(format!("Hours worked: {}", slip.hours_worked)),
            Line::from(format!("Gross salary: {:.2}", slip.gross_salary)),
            Line::from(format!("AFP: {:.2}", slip.afp)),
            Line::from(format!("ARS: {:.2}", slip.ars)),
            Line::from(format!("ISR: {:.2}", slip.isr)),
            Line::from(Span::styled(
                format!("Net salary: {:.2}", slip.net_salary),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press any key to close.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
