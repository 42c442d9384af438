use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The type used for primary keys in the database.
pub type PrimaryKey = i64;

/// The opaque subject id a member is identified by
pub type MemberId = String;

/// A book in the catalog
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BookData {
    pub id: PrimaryKey,
    pub title: String,
    pub author: String,
    pub publish_year: i32,
    pub description: String,
    /// Bumped on every write, used to detect concurrent modification
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct GenreData {
    pub id: PrimaryKey,
    pub name: String,
    pub version: i64,
}

/// Associates a book with a genre.
/// Note: `book_id` and `genre_id` are unique together.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BookGenreData {
    pub id: PrimaryKey,
    pub book_id: PrimaryKey,
    pub genre_id: PrimaryKey,
    pub version: i64,
}

/// A member's review of a book
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ReviewData {
    pub id: PrimaryKey,
    /// The author of the review, who owns it
    pub member_id: MemberId,
    pub book_id: PrimaryKey,
    /// From 1 to 5
    pub rating: i32,
    pub comment: String,
    /// Always stamped by the server, on creation and on every update
    pub reviewed_at: DateTime<Utc>,
    pub version: i64,
}

/// A book saved by a member.
/// Note: `member_id` and `book_id` are unique together.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BookmarkData {
    pub id: PrimaryKey,
    pub member_id: MemberId,
    pub book_id: PrimaryKey,
    pub version: i64,
}

/// A book review account
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MemberData {
    pub id: MemberId,
    pub username: String,
    pub name: String,
    pub email: String,
    /// The argon2 hash of the password
    pub password: String,
    /// Admins can curate the catalog and moderate any review
    pub admin: bool,
}

/// Login session data for authentication
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: PrimaryKey,
    /// The session token, or key if you will
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// The member that is logged in
    pub member: MemberData,
}
