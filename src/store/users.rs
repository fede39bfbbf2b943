use rusqlite::{params, Connection, Error as SqlError, ErrorCode, OptionalExtension, Row};

use super::error::{Result, StoreError};
use crate::models::{UserId, UserRecord};

/// Map a `users` row selected with the column order used by every query here.
fn row_to_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get(0)?,
        name: row.get(1)?,
        family: row.get(2)?,
        age: row.get(3)?,
        city: row.get(4)?,
        email: row.get(5)?,
        password: row.get(6)?,
    })
}

/// Retrieve every registrant by ascending id. The ordering is the listing
/// order shown in the UI and is stable for a fixed table state.
pub(crate) fn fetch_users(conn: &Connection) -> Result<Vec<UserRecord>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, name, family, age, city, email, password
         FROM users
         ORDER BY user_id",
    )?;

    let users = stmt
        .query_map([], row_to_user)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(users)
}

pub(crate) fn fetch_user(conn: &Connection, user_id: UserId) -> Result<Option<UserRecord>> {
    let user = conn
        .query_row(
            "SELECT user_id, name, family, age, city, email, password
             FROM users
             WHERE user_id = ?1",
            params![user_id],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

/// Insert a new registrant. An existing id is reported as a duplicate rather
/// than overwritten.
pub(crate) fn insert_user(conn: &Connection, user: &UserRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO users (user_id, name, family, age, city, email, password)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.user_id,
            user.name,
            user.family,
            user.age,
            user.city,
            user.email,
            user.password
        ],
    )
    .map_err(|err| map_unique_constraint(err, user.user_id))?;
    Ok(())
}

/// Replace every column of the row at `user.user_id`, inserting it when the
/// id is unknown.
pub(crate) fn put_user(conn: &Connection, user: &UserRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO users (user_id, name, family, age, city, email, password)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id) DO UPDATE SET
           name = excluded.name,
           family = excluded.family,
           age = excluded.age,
           city = excluded.city,
           email = excluded.email,
           password = excluded.password",
        params![
            user.user_id,
            user.name,
            user.family,
            user.age,
            user.city,
            user.email,
            user.password
        ],
    )?;
    Ok(())
}

/// Remove a registrant, returning whether a row existed.
pub(crate) fn delete_user(conn: &Connection, user_id: UserId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
    Ok(deleted > 0)
}

pub(crate) fn max_user_id(conn: &Connection) -> Result<Option<UserId>> {
    let max = conn.query_row("SELECT MAX(user_id) FROM users", [], |row| row.get(0))?;
    Ok(max)
}

/// Coerce SQLite constraint errors into the duplicate-key variant. The only
/// constraint on `users` is its primary key.
fn map_unique_constraint(err: SqlError, user_id: UserId) -> StoreError {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        StoreError::DuplicateKey(user_id)
    } else {
        err.into()
    }
}
