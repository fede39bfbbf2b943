use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{FormFields, RecordField, UserId, UserRecord};
use crate::registry::EditSession;

/// Render one `Label: value` line, highlighting the focused field and showing
/// a placeholder for empty values.
fn field_line(label: &str, value: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        "<required>".to_string()
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
        Span::raw(format!("{label}: ")),
        Span::styled(display, style),
    ])
}

/// Registration form state. Values are kept raw; the registry validates.
#[derive(Clone)]
pub(crate) struct RegisterForm {
    values: FormFields,
    pub(crate) active: RecordField,
    pub(crate) error: Option<String>,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            values: FormFields::new(),
            active: RecordField::Name,
            error: None,
        }
    }
}

impl RegisterForm {
    /// Move focus to the next field, wrapping around.
    pub(crate) fn next_field(&mut self) {
        self.active = step(&RecordField::ALL, self.active, 1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = step(&RecordField::ALL, self.active, -1);
    }

    /// Append a character to the active field. Control characters are
    /// ignored.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.values
            .entry(self.active.key().to_string())
            .or_default()
            .push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(value) = self.values.get_mut(self.active.key()) {
            value.pop();
        }
    }

    /// Raw input as submitted to the registry.
    pub(crate) fn to_fields(&self) -> FormFields {
        RecordField::ALL
            .into_iter()
            .map(|field| (field.key().to_string(), self.value(field).to_string()))
            .collect()
    }

    /// Empty every input after a successful registration.
    pub(crate) fn clear(&mut self) {
        self.values.clear();
        self.active = RecordField::Name;
        self.error = None;
    }

    fn value(&self, field: RecordField) -> &str {
        self.values
            .get(field.key())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Render the line for `field`. The password is masked.
    pub(crate) fn build_line(&self, field: RecordField) -> Line<'static> {
        let value = self.value(field);
        let shown = if field == RecordField::Password {
            "*".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        field_line(field.label(), &shown, self.active == field)
    }

    /// Character count of `field`, used to place the cursor.
    pub(crate) fn value_len(&self, field: RecordField) -> usize {
        self.value(field).chars().count()
    }
}

/// One pass of the edit prompt: pick a field among the editable ones, type a
/// new value, apply it to the session copy and commit.
pub(crate) struct EditForm {
    pub(crate) session: EditSession,
    pub(crate) field: RecordField,
    pub(crate) value: String,
    pub(crate) error: Option<String>,
}

impl EditForm {
    pub(crate) fn new(session: EditSession) -> Self {
        let field = RecordField::EDITABLE[0];
        let value = session.record().field(field).to_string();
        Self {
            session,
            field,
            value,
            error: None,
        }
    }

    pub(crate) fn user_id(&self) -> UserId {
        self.session.user_id()
    }

    /// Cycle through the editable fields, loading the working value of the
    /// newly focused one into the input buffer.
    pub(crate) fn switch_field(&mut self, offset: isize) {
        self.field = step(&RecordField::EDITABLE, self.field, offset);
        self.value = self.session.record().field(self.field).to_string();
        self.error = None;
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    /// Copy the input buffer into the session record.
    pub(crate) fn apply(&mut self) {
        self.session.apply(self.field, self.value.clone());
    }

    /// Lines for every editable field; the focused one shows the buffer.
    pub(crate) fn build_lines(&self) -> Vec<Line<'static>> {
        RecordField::EDITABLE
            .into_iter()
            .map(|field| {
                if field == self.field {
                    field_line(field.label(), &self.value, true)
                } else {
                    field_line(field.label(), self.session.record().field(field), false)
                }
            })
            .collect()
    }

    /// Index of the focused field among the editable ones.
    pub(crate) fn active_index(&self) -> usize {
        RecordField::EDITABLE
            .iter()
            .position(|field| *field == self.field)
            .unwrap_or(0)
    }
}

/// Pending delete or edit waiting for a yes/no answer.
#[derive(Clone)]
pub(crate) struct ConfirmUser {
    pub(crate) user_id: UserId,
    pub(crate) display_name: String,
}

impl ConfirmUser {
    pub(crate) fn from(record: &UserRecord) -> Self {
        Self {
            user_id: record.user_id,
            display_name: record.display_name(),
        }
    }
}

/// Wrap-around step through a fixed field order.
fn step(order: &[RecordField], current: RecordField, offset: isize) -> RecordField {
    let len = order.len() as isize;
    let index = order.iter().position(|field| *field == current).unwrap_or(0) as isize;
    order[(index + offset).rem_euclid(len) as usize]
}
