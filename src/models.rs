//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. These types stay light-weight data holders so the validator, the store
//! and the screens can share them without conversions.

use std::collections::BTreeMap;
use std::fmt;

/// Primary key of a registrant. Integers keep ordering numeric.
pub type UserId = i64;

/// Raw form input keyed by field name (`name`, `family`, ...). Extra keys are
/// tolerated and ignored by validation.
pub type FormFields = BTreeMap<String, String>;

/// The six data columns a registrant carries besides its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordField {
    Name,
    Family,
    Age,
    City,
    Email,
    Password,
}

impl RecordField {
    /// Every field in form order.
    pub const ALL: [RecordField; 6] = [
        RecordField::Name,
        RecordField::Family,
        RecordField::Age,
        RecordField::City,
        RecordField::Email,
        RecordField::Password,
    ];

    /// Fields the edit prompt offers. Email and password are only set at
    /// registration time.
    pub const EDITABLE: [RecordField; 4] = [
        RecordField::Name,
        RecordField::Family,
        RecordField::Age,
        RecordField::City,
    ];

    /// Key used in [`FormFields`] and as the column name.
    pub fn key(self) -> &'static str {
        match self {
            RecordField::Name => "name",
            RecordField::Family => "family",
            RecordField::Age => "age",
            RecordField::City => "city",
            RecordField::Email => "email",
            RecordField::Password => "password",
        }
    }

    /// Human-facing label for forms and table headers.
    pub fn label(self) -> &'static str {
        match self {
            RecordField::Name => "Name",
            RecordField::Family => "Family",
            RecordField::Age => "Age",
            RecordField::City => "City",
            RecordField::Email => "Email",
            RecordField::Password => "Password",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One registrant row. Field values are kept exactly as entered; trimming only
/// happens during validation so an update writes back what the operator typed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserRecord {
    /// Primary key. Edit and delete flows bubble the id back to the store.
    pub user_id: UserId,
    pub name: String,
    pub family: String,
    /// Numeric text; the schema keeps it as TEXT like the form delivers it.
    pub age: String,
    pub city: String,
    pub email: String,
    /// Stored as entered and never shown in the listing.
    pub password: String,
}

impl UserRecord {
    /// Build a record from raw form input. Missing keys become empty strings
    /// so they fail validation instead of panicking here.
    pub fn from_fields(user_id: UserId, fields: &FormFields) -> Self {
        let take = |field: RecordField| fields.get(field.key()).cloned().unwrap_or_default();
        Self {
            user_id,
            name: take(RecordField::Name),
            family: take(RecordField::Family),
            age: take(RecordField::Age),
            city: take(RecordField::City),
            email: take(RecordField::Email),
            password: take(RecordField::Password),
        }
    }

    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::Name => &self.name,
            RecordField::Family => &self.family,
            RecordField::Age => &self.age,
            RecordField::City => &self.city,
            RecordField::Email => &self.email,
            RecordField::Password => &self.password,
        }
    }

    pub fn set_field(&mut self, field: RecordField, value: impl Into<String>) {
        let value = value.into();
        match field {
            RecordField::Name => self.name = value,
            RecordField::Family => self.family = value,
            RecordField::Age => self.age = value,
            RecordField::City => self.city = value,
            RecordField::Email => self.email = value,
            RecordField::Password => self.password = value,
        }
    }

    /// `Name Family`, falling back to whichever part is present.
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        let family = self.family.trim();
        match (name.is_empty(), family.is_empty()) {
            (false, false) => format!("{name} {family}"),
            (false, true) => name.to_string(),
            (true, false) => family.to_string(),
            (true, true) => format!("User #{}", self.user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fields_fills_missing_keys_with_empty_strings() {
        let mut fields = FormFields::new();
        fields.insert("name".into(), "Ana".into());
        fields.insert("nickname".into(), "ignored".into());

        let record = UserRecord::from_fields(3, &fields);

        assert_eq!(record.user_id, 3);
        assert_eq!(record.name, "Ana");
        assert_eq!(record.family, "");
        assert_eq!(record.password, "");
    }

    #[test]
    fn field_keys_round_trip_through_from_key() {
        for field in RecordField::ALL {
            assert_eq!(RecordField::from_key(field.key()), Some(field));
        }
        assert_eq!(RecordField::from_key("userId"), None);
    }

    #[test]
    fn display_name_handles_blank_parts() {
        let mut record = UserRecord {
            user_id: 9,
            ..UserRecord::default()
        };
        assert_eq!(record.display_name(), "User #9");
        record.set_field(RecordField::Family, "Lee");
        assert_eq!(record.display_name(), "Lee");
        record.set_field(RecordField::Name, " Ana ");
        assert_eq!(record.display_name(), "Ana Lee");
    }
}
