use std::mem;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::models::{RecordField, UserId};
use crate::registry::{EditOutcome, Registry, Submission};

use super::forms::{ConfirmUser, EditForm, RegisterForm};
use super::helpers::{centered_rect, surface_error};
use super::screens::UserTable;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Columns of the listing. The password is never shown.
const TABLE_COLUMNS: [&str; 6] = ["Id", "Name", "Family", "Age", "City", "Email"];
/// Borders plus the header row of the listing.
const TABLE_CHROME_HEIGHT: u16 = 3;

/// Fine-grained modes layered over the listing.
enum Mode {
    Normal,
    Registering(RegisterForm),
    Editing(EditForm),
    ConfirmEdit(ConfirmUser),
    ConfirmDelete(ConfirmUser),
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

/// Central application state shared across the TUI.
pub struct App {
    registry: Registry,
    table: UserTable,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Wrap an opened registry and load the initial listing.
    pub fn new(registry: Registry) -> Result<Self> {
        let mut table = UserTable::default();
        registry
            .refresh(&mut table)
            .context("failed to load users")?;

        let status = registry.store().upgrade().map(|upgrade| StatusMessage {
            text: format!(
                "Database upgraded from version {} to {}.",
                upgrade.from, upgrade.to
            ),
            kind: StatusKind::Info,
        });

        Ok(Self {
            registry,
            table,
            mode: Mode::Normal,
            status,
        })
    }

    /// Hand the registry back for shutdown once the event loop ends.
    pub fn into_registry(self) -> Registry {
        self.registry
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Registering(form) => self.handle_register(code, form)?,
            Mode::Editing(form) => self.handle_edit(code, form)?,
            Mode::ConfirmEdit(confirm) => self.handle_confirm_edit(code, confirm)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.table.move_selection(-1),
            KeyCode::Down => self.table.move_selection(1),
            KeyCode::PageUp => self.table.move_selection(-5),
            KeyCode::PageDown => self.table.move_selection(5),
            KeyCode::Home => self.table.select_first(),
            KeyCode::End => self.table.select_last(),
            KeyCode::Char('+') | KeyCode::Char('a') | KeyCode::Char('A') => {
                self.clear_status();
                return Ok(Mode::Registering(RegisterForm::default()));
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(user) = self.table.current_user() {
                    let confirm = ConfirmUser::from(user);
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(confirm));
                }
                self.set_status("No user selected to remove.", StatusKind::Error);
            }
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                if let Some(user) = self.table.current_user() {
                    let confirm = ConfirmUser::from(user);
                    self.clear_status();
                    return Ok(Mode::ConfirmEdit(confirm));
                }
                self.set_status("No user selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let count = self.registry.refresh(&mut self.table)?;
                self.set_status(format!("Loaded {count} users."), StatusKind::Info);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_register(&mut self, code: KeyCode, mut form: RegisterForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Registration form closed.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => self.submit_registration(&mut form),
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Registering(form))
    }

    /// Submit the form. Accepted input clears the form so the next person can
    /// be entered; rejected input and store failures stay visible in it.
    fn submit_registration(&mut self, form: &mut RegisterForm) {
        match self.registry.submit(&form.to_fields(), &mut self.table) {
            Ok(Submission::Accepted(record)) => {
                form.clear();
                self.table.focus(record.user_id);
                self.set_status(
                    format!(
                        "Registered {} as user #{}.",
                        record.display_name(),
                        record.user_id
                    ),
                    StatusKind::Info,
                );
            }
            Ok(Submission::Rejected(err)) => {
                let message = err.to_string();
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
            }
            Err(err) => {
                let message = surface_error(&anyhow::Error::from(err));
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
            }
        }
    }

    fn handle_confirm_edit(&mut self, code: KeyCode, confirm: ConfirmUser) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.open_edit(confirm.user_id)
            }
            _ => Ok(Mode::ConfirmEdit(confirm)),
        }
    }

    fn open_edit(&mut self, user_id: UserId) -> Result<Mode> {
        match self.registry.begin_edit(user_id)? {
            Some(session) => {
                self.clear_status();
                Ok(Mode::Editing(EditForm::new(session)))
            }
            None => {
                self.registry.refresh(&mut self.table)?;
                self.set_status(
                    format!("User #{user_id} no longer exists."),
                    StatusKind::Error,
                );
                Ok(Mode::Normal)
            }
        }
    }

    /// Edit loop: every Enter applies the focused field and commits the whole
    /// record; the form stays open until Esc.
    fn handle_edit(&mut self, code: KeyCode, mut form: EditForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status(
                    format!("Finished editing user #{}.", form.user_id()),
                    StatusKind::Info,
                );
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.switch_field(1),
            KeyCode::BackTab | KeyCode::Up => form.switch_field(-1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                form.apply();
                match self.registry.commit_edit(&form.session, &mut self.table) {
                    Ok(EditOutcome::Updated(record)) => {
                        form.error = None;
                        self.table.focus(record.user_id);
                        self.set_status(
                            format!(
                                "Updated {} for user #{}.",
                                form.field.label(),
                                record.user_id
                            ),
                            StatusKind::Info,
                        );
                    }
                    Ok(EditOutcome::Rejected(err)) => {
                        let message = err.to_string();
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                    Err(err) => {
                        let message = surface_error(&anyhow::Error::from(err));
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Editing(form))
    }

    fn handle_confirm_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmUser,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.registry.remove(confirm.user_id, &mut self.table) {
                    Ok(true) => {
                        self.set_status(
                            format!("Removed {} (#{}).", confirm.display_name, confirm.user_id),
                            StatusKind::Info,
                        );
                        Ok(Mode::Normal)
                    }
                    Ok(false) => {
                        self.registry.refresh(&mut self.table)?;
                        self.set_status(
                            format!("User #{} was already removed.", confirm.user_id),
                            StatusKind::Info,
                        );
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        let message = surface_error(&anyhow::Error::from(err));
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
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

        self.draw_user_table(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Registering(form) => self.draw_register_form(frame, area, form),
            Mode::Editing(form) => self.draw_edit_form(frame, area, form),
            Mode::ConfirmEdit(confirm) => self.draw_confirm(
                frame,
                area,
                "Edit User",
                format!("Edit {} (#{})?", confirm.display_name, confirm.user_id),
                "y to edit • n to cancel",
            ),
            Mode::ConfirmDelete(confirm) => self.draw_confirm(
                frame,
                area,
                "Remove User",
                format!("Remove {} (#{})?", confirm.display_name, confirm.user_id),
                "y to remove • n to keep",
            ),
            Mode::Normal => {}
        }
    }

    fn draw_user_table(&self, frame: &mut Frame, area: Rect) {
        let title = format!("Users ({})", self.table.records.len());
        if self.table.records.is_empty() {
            let message = Paragraph::new("No users yet. Press '+' to register one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(message, area);
            return;
        }

        let visible = area.height.saturating_sub(TABLE_CHROME_HEIGHT) as usize;
        let offset = self.table.scroll_offset(visible);
        let rows = self
            .table
            .records
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(idx, user)| {
                let row = Row::new(vec![
                    Cell::from(user.user_id.to_string()),
                    Cell::from(user.name.clone()),
                    Cell::from(user.family.clone()),
                    Cell::from(user.age.clone()),
                    Cell::from(user.city.clone()),
                    Cell::from(user.email.clone()),
                ]);
                if idx == self.table.selected {
                    row.style(
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    row
                }
            });

        let header = Row::new(TABLE_COLUMNS.iter().map(|name| Cell::from(*name)))
            .style(Style::default().add_modifier(Modifier::BOLD));
        let widths = [
            Constraint::Length(5),
            Constraint::Percentage(18),
            Constraint::Percentage(18),
            Constraint::Length(6),
            Constraint::Percentage(18),
            Constraint::Min(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from(Span::styled(
                self.registry.store().location().to_string(),
                Style::default().fg(Color::DarkGray),
            ))
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match &self.mode {
            Mode::Normal => &[
                ("[↑↓]", " Navigate   "),
                ("[+]", " Register   "),
                ("[e]", " Edit   "),
                ("[-]", " Remove   "),
                ("[r]", " Reload   "),
                ("[q]", " Quit"),
            ],
            Mode::Registering(_) => &[
                ("[Tab]", " Next field   "),
                ("[Enter]", " Submit   "),
                ("[Esc]", " Close"),
            ],
            Mode::Editing(_) => &[
                ("[Tab]", " Pick field   "),
                ("[Enter]", " Save field   "),
                ("[Esc]", " Done"),
            ],
            Mode::ConfirmEdit(_) => &[("[y]", " Edit   "), ("[n]", " Cancel")],
            Mode::ConfirmDelete(_) => &[("[y]", " Remove   "), ("[n]", " Keep")],
        };

        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, text)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(text.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_register_form(&self, frame: &mut Frame, area: Rect, form: &RegisterForm) {
        let popup_area = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Register").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line<'static>> = RecordField::ALL
            .into_iter()
            .map(|field| form.build_line(field))
            .collect();
        lines.push(Line::from(""));
        lines.push(hint_or_error(
            form.error.as_deref(),
            "Enter to submit • Tab to switch • Esc to close",
        ));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let row = RecordField::ALL
            .iter()
            .position(|field| *field == form.active)
            .unwrap_or(0);
        let prefix = form.active.label().len() + 2;
        frame.set_cursor_position((
            inner.x + (prefix + form.value_len(form.active)) as u16,
            inner.y + row as u16,
        ));
    }

    fn draw_edit_form(&self, frame: &mut Frame, area: Rect, form: &EditForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let title = format!(
            "Edit user #{} • {}",
            form.user_id(),
            form.session.record().display_name()
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.build_lines();
        lines.push(Line::from(Span::styled(
            format!("Email: {}", form.session.record().email),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(""));
        lines.push(hint_or_error(
            form.error.as_deref(),
            "Enter to save field • Tab to pick field • Esc when done",
        ));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = form.field.label().len() + 2;
        frame.set_cursor_position((
            inner.x + (prefix + form.value.chars().count()) as u16,
            inner.y + form.active_index() as u16,
        ));
    }

    fn draw_confirm(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &'static str,
        question: String,
        hint: &'static str,
    ) {
        let popup_area = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup_area);

        let lines = vec![
            Line::from(question),
            Line::from(""),
            Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(paragraph, popup_area);
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

/// Red error text when present, otherwise a gray key hint.
fn hint_or_error(error: Option<&str>, hint: &'static str) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
    }
}
