use crate::Database;
use crate::models::{NewProfile, ProfileRow, ProfileUpdate, UserRow, WriteOutcome};
use anyhow::Result;
use rusqlite::Connection;

const PROFILE_SELECT: &str = "SELECT p.user_id, p.username, p.display_name, p.bio, p.profile_photo_id, ph.original_url
     FROM profiles p
     LEFT JOIN photos ph ON ph.id = p.profile_photo_id";

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, email: &str, password_hash: &str) -> Result<WriteOutcome> {
        self.with_conn(|conn| {
            let res = conn.execute(
                "INSERT INTO users (id, email, password) VALUES (?1, ?2, ?3)",
                (id, email, password_hash),
            );
            outcome(res)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Profiles --

    pub fn create_profile(&self, profile: &NewProfile<'_>) -> Result<WriteOutcome> {
        self.with_conn(|conn| {
            let res = conn.execute(
                "INSERT INTO profiles (user_id, username, display_name, bio) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    profile.user_id,
                    profile.username,
                    profile.display_name,
                    profile.bio
                ],
            );
            outcome(res)
        })
    }

    pub fn get_profile_by_user_id(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, "p.user_id", user_id))
    }

    pub fn get_profile_by_username(&self, username: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, "p.username", username))
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM profiles WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Rewrites the editable columns of the profile owned by `user_id`.
    /// A username collision reports `Conflict` instead of failing.
    pub fn update_profile(&self, user_id: &str, update: &ProfileUpdate<'_>) -> Result<WriteOutcome> {
        self.with_conn(|conn| {
            let res = conn.execute(
                "UPDATE profiles
                 SET username = ?2, display_name = ?3, bio = ?4, updated_at = datetime('now')
                 WHERE user_id = ?1",
                rusqlite::params![user_id, update.username, update.display_name, update.bio],
            );
            outcome(res)
        })
    }

    /// Stores a photo and makes it the owner's profile photo.
    pub fn attach_profile_photo(&self, photo_id: &str, user_id: &str, original_url: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO photos (id, owner_id, original_url) VALUES (?1, ?2, ?3)",
                (photo_id, user_id, original_url),
            )?;
            tx.execute(
                "UPDATE profiles SET profile_photo_id = ?1, updated_at = datetime('now') WHERE user_id = ?2",
                (photo_id, user_id),
            )?;
            tx.commit()?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT id, email, password, created_at FROM users WHERE {} = ?1", column);
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_profile(conn: &Connection, column: &str, value: &str) -> Result<Option<ProfileRow>> {
    let sql = format!("{} WHERE {} = ?1", PROFILE_SELECT, column);
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(ProfileRow {
                user_id: row.get(0)?,
                username: row.get(1)?,
                display_name: row.get(2)?,
                bio: row.get(3)?,
                profile_photo_id: row.get(4)?,
                photo_url: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Maps UNIQUE / PRIMARY KEY violations to [`WriteOutcome::Conflict`].
fn outcome(res: rusqlite::Result<usize>) -> Result<WriteOutcome> {
    match res {
        Ok(_) => Ok(WriteOutcome::Written),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Ok(WriteOutcome::Conflict)
        }
        Err(e) => Err(e.into()),
    }
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
