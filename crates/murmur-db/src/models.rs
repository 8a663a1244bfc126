/// Database row types. These map directly to SQLite rows and are kept
/// distinct from murmur-types models so the DB layer stays independent.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Password hash in PHC string form.
    pub password: String,
    pub profile_image: Option<String>,
    pub created_at: String,
}

pub struct ChatUserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub profile_image: Option<String>,
}

pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub sender_username: String,
    pub body: String,
    pub created_at: String,
    pub is_read: bool,
    pub reaction: Option<String>,
}
