/// Database row types. These map directly to SQLite rows and are kept apart
/// from the coffeehaus-types API models.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

/// A profile joined with its photo.
#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub profile_photo_id: Option<String>,
    pub photo_url: Option<String>,
}

pub struct NewProfile<'a> {
    pub user_id: &'a str,
    pub username: &'a str,
    pub display_name: &'a str,
    pub bio: Option<&'a str>,
}

/// Full replacement values for the editable profile columns.
pub struct ProfileUpdate<'a> {
    pub username: &'a str,
    pub display_name: &'a str,
    pub bio: Option<&'a str>,
}

/// Outcome of a write that can trip a UNIQUE constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Conflict,
}
