//! The registration workflow: validation, id assignment, persistence and the
//! read-after-write refresh toward whatever renders the listing.

use std::path::Path;

use tracing::{debug, warn};

use crate::ids::IdSource;
use crate::models::{FormFields, RecordField, UserId, UserRecord};
use crate::store::{RecordStore, Result};
use crate::validation::{validate_fields, validate_record, ValidationError};

/// Receives the listing after every successful write.
pub trait ListingRenderer {
    /// Replace the displayed rows with `records` (ascending id order).
    fn render(&mut self, records: &[UserRecord]);

    /// Drop the row for a deleted record.
    fn remove_row(&mut self, user_id: UserId);
}

/// Result of submitting the registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Stored under the assigned id.
    Accepted(UserRecord),
    /// Failed validation; nothing was written.
    Rejected(ValidationError),
}

/// Result of committing an edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Updated(UserRecord),
    Rejected(ValidationError),
}

/// In-memory copy of a stored record being edited field by field. Changes
/// reach the store only through [`Registry::commit_edit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    record: UserRecord,
}

impl EditSession {
    pub fn user_id(&self) -> UserId {
        self.record.user_id
    }

    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    /// Apply one field change to the working copy.
    pub fn apply(&mut self, field: RecordField, value: impl Into<String>) {
        self.record.set_field(field, value);
    }
}

/// Composition of the store, the id policy and the refresh protocol.
pub struct Registry {
    store: RecordStore,
    ids: Box<dyn IdSource>,
}

impl Registry {
    pub fn new(store: RecordStore, ids: Box<dyn IdSource>) -> Self {
        Self { store, ids }
    }

    /// Open the database at `path` and wrap it. Called once at startup.
    pub fn init(path: &Path, ids: Box<dyn IdSource>) -> Result<Self> {
        Ok(Self::new(RecordStore::open(path)?, ids))
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Release the database handle.
    pub fn shutdown(self) -> Result<()> {
        self.store.close()
    }

    /// Re-read every record and hand it to `renderer`. Returns the row count.
    pub fn refresh(&self, renderer: &mut dyn ListingRenderer) -> Result<usize> {
        let records = self.store.list_all()?;
        renderer.render(&records);
        Ok(records.len())
    }

    /// Validate the form input, assign an id, store the record and refresh the
    /// listing. A rejected candidate leaves the store untouched.
    pub fn submit(
        &mut self,
        fields: &FormFields,
        renderer: &mut dyn ListingRenderer,
    ) -> Result<Submission> {
        if let Err(err) = validate_fields(fields) {
            debug!(fields = ?err.fields, "registration rejected");
            return Ok(Submission::Rejected(err));
        }

        let user_id = self.ids.next_id(&self.store)?;
        let record = UserRecord::from_fields(user_id, fields);
        if let Err(err) = self.store.create(&record) {
            warn!(user_id, error = %err, "registration failed");
            return Err(err);
        }
        self.refresh(renderer)?;
        Ok(Submission::Accepted(record))
    }

    /// Start editing a stored record. `None` when the id is not stored.
    pub fn begin_edit(&self, user_id: UserId) -> Result<Option<EditSession>> {
        let session = self
            .store
            .get_one(user_id)?
            .map(|record| EditSession { record });
        if session.is_none() {
            debug!(user_id, "edit requested for missing user");
        }
        Ok(session)
    }

    /// Re-validate the whole working copy and persist it with full-replace
    /// semantics, then refresh the listing.
    pub fn commit_edit(
        &self,
        session: &EditSession,
        renderer: &mut dyn ListingRenderer,
    ) -> Result<EditOutcome> {
        if let Err(err) = validate_record(&session.record) {
            debug!(user_id = session.user_id(), fields = ?err.fields, "edit rejected");
            return Ok(EditOutcome::Rejected(err));
        }

        self.store.update(&session.record)?;
        self.refresh(renderer)?;
        Ok(EditOutcome::Updated(session.record.clone()))
    }

    /// Delete a record and drop its row. Unknown ids are a no-op returning
    /// `false`.
    pub fn remove(&self, user_id: UserId, renderer: &mut dyn ListingRenderer) -> Result<bool> {
        let removed = self.store.delete(user_id)?;
        if removed {
            renderer.remove_row(user_id);
        }
        Ok(removed)
    }
}
