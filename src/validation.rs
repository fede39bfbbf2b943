//! Acceptance rules applied to a candidate registrant before it reaches the
//! store. Everything here is pure: no I/O, no store access.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::models::{FormFields, RecordField, UserRecord};

/// `local@domain.tld` where each part is word characters optionally joined by
/// `.` or `-`, ending in one or more 2-3 character suffixes. `\w` is spelled
/// out so it stays ASCII-only.
const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

/// A candidate record failed one or more field rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please fill the inputs correctly: {}", describe(.fields))]
pub struct ValidationError {
    /// Failing fields in form order.
    pub fields: Vec<RecordField>,
}

fn describe(fields: &[RecordField]) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check one field value. `None` means the field was absent and is treated
/// like an empty string.
pub fn field_is_valid(field: RecordField, value: Option<&str>) -> bool {
    let value = value.unwrap_or_default();
    match field {
        RecordField::Name | RecordField::Family | RecordField::City | RecordField::Password => {
            !value.trim().is_empty()
        }
        RecordField::Age => is_numeric(value),
        RecordField::Email => email_regex().is_match(value),
    }
}

/// Trimmed, non-empty and a finite number (`30`, `-4`, `2.5`, `1e3`).
fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && trimmed
            .parse::<f64>()
            .map(|number| number.is_finite())
            .unwrap_or(false)
}

/// Validate raw form input. Unknown keys are ignored.
pub fn validate_fields(fields: &FormFields) -> Result<(), ValidationError> {
    collect_failures(|field| fields.get(field.key()).map(String::as_str))
}

/// Validate a full record, e.g. after an edit was applied to it.
pub fn validate_record(record: &UserRecord) -> Result<(), ValidationError> {
    collect_failures(|field| Some(record.field(field)))
}

/// Boolean verdict over raw form input.
pub fn is_valid(fields: &FormFields) -> bool {
    validate_fields(fields).is_ok()
}

fn collect_failures<'a>(
    lookup: impl Fn(RecordField) -> Option<&'a str>,
) -> Result<(), ValidationError> {
    let fields: Vec<RecordField> = RecordField::ALL
        .into_iter()
        .filter(|field| !field_is_valid(*field, lookup(*field)))
        .collect();

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> FormFields {
        [
            ("name", "Ana"),
            ("family", "Lee"),
            ("age", "30"),
            ("city", "Rome"),
            ("email", "a@b.co"),
            ("password", "x"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn accepts_complete_candidate() {
        assert!(is_valid(&ana()));
    }

    #[test]
    fn rejects_blank_required_fields() {
        for key in ["name", "family", "city", "password", "age"] {
            for blank in ["", "   ", "\t"] {
                let mut fields = ana();
                fields.insert(key.to_string(), blank.to_string());
                let err = validate_fields(&fields).unwrap_err();
                assert_eq!(err.fields, vec![RecordField::from_key(key).unwrap()]);
            }
        }
    }

    #[test]
    fn missing_fields_fail_their_rule() {
        let mut fields = ana();
        fields.remove("city");
        fields.remove("email");
        let err = validate_fields(&fields).unwrap_err();
        assert_eq!(err.fields, vec![RecordField::City, RecordField::Email]);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let mut fields = ana();
        fields.insert("userId".into(), "not a number".into());
        fields.insert("favourite_colour".into(), String::new());
        assert!(is_valid(&fields));
    }

    #[test]
    fn age_must_be_numeric() {
        for good in ["30", " 42 ", "-1", "2.5", "1e3", "0"] {
            assert!(field_is_valid(RecordField::Age, Some(good)), "{good}");
        }
        for bad in ["thirty", "3O", "NaN", "inf", "Infinity", "0x10", "", "  "] {
            assert!(!field_is_valid(RecordField::Age, Some(bad)), "{bad}");
        }
    }

    #[test]
    fn email_shape() {
        for good in [
            "a@b.co",
            "ana.lee@mail.example.com",
            "ana-lee@my-host.org",
            "user_1@host.io.uk",
        ] {
            assert!(field_is_valid(RecordField::Email, Some(good)), "{good}");
        }
        for bad in [
            "",
            "plain",
            "@b.co",
            "a@b",
            "a@b.c",
            "a@b.comma",
            "a..b@c.co",
            "a b@c.co",
            "ana@höst.co",
        ] {
            assert!(!field_is_valid(RecordField::Email, Some(bad)), "{bad}");
        }
    }

    #[test]
    fn error_lists_failing_labels() {
        let err = ValidationError {
            fields: vec![RecordField::Name, RecordField::Email],
        };
        assert_eq!(
            err.to_string(),
            "Please fill the inputs correctly: Name, Email"
        );
    }

    #[test]
    fn validate_record_uses_current_values() {
        let mut record = UserRecord::from_fields(7, &ana());
        assert!(validate_record(&record).is_ok());
        record.set_field(RecordField::Age, "old");
        assert_eq!(
            validate_record(&record).unwrap_err().fields,
            vec![RecordField::Age]
        );
    }
}
