use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use validator::Validate;

mod data;
pub use data::*;

mod sqlite;
pub use sqlite::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource changed or vanished between being read and being written
    #[error("{resource} {id} was modified by someone else")]
    Modified {
        resource: &'static str,
        id: PrimaryKey,
    },
    /// A resource in the database doesn't exist
    #[error("{resource} with that {identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    /// Maps a broken unique constraint to [DatabaseError::Conflict] and a
    /// broken foreign key to [DatabaseError::NotFound]
    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str)
        -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(DatabaseError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Represents a type that can fetch book review data from a database.
///
/// Every method is a single atomic unit of work. The `update_*` methods write the
/// whole record and only succeed if its `version` still matches the stored row,
/// returning [DatabaseError::Modified] otherwise.
#[async_trait]
pub trait Database: Send + Sync {
    async fn list_books(&self) -> Result<Vec<BookData>>;
    async fn book_by_id(&self, book_id: PrimaryKey) -> Result<BookData>;
    async fn books_by_genre(&self, genre_id: PrimaryKey) -> Result<Vec<BookData>>;
    async fn create_book(&self, new_book: NewBook) -> Result<BookData>;
    async fn update_book(&self, book: BookData) -> Result<BookData>;
    async fn delete_book(&self, book_id: PrimaryKey) -> Result<()>;

    async fn list_genres(&self) -> Result<Vec<GenreData>>;
    async fn genre_by_id(&self, genre_id: PrimaryKey) -> Result<GenreData>;
    async fn create_genre(&self, new_genre: NewGenre) -> Result<GenreData>;
    async fn update_genre(&self, genre: GenreData) -> Result<GenreData>;
    async fn delete_genre(&self, genre_id: PrimaryKey) -> Result<()>;

    async fn list_book_genres(&self) -> Result<Vec<BookGenreData>>;
    async fn book_genre_by_id(&self, book_genre_id: PrimaryKey) -> Result<BookGenreData>;
    async fn book_genre_by_pair(
        &self,
        book_id: PrimaryKey,
        genre_id: PrimaryKey,
    ) -> Result<BookGenreData>;
    async fn create_book_genre(&self, new_book_genre: NewBookGenre) -> Result<BookGenreData>;
    async fn update_book_genre(&self, book_genre: BookGenreData) -> Result<BookGenreData>;
    async fn delete_book_genre(&self, book_genre_id: PrimaryKey) -> Result<()>;

    async fn list_reviews(&self) -> Result<Vec<ReviewData>>;
    async fn review_by_id(&self, review_id: PrimaryKey) -> Result<ReviewData>;
    async fn reviews_by_book(&self, book_id: PrimaryKey) -> Result<Vec<ReviewData>>;
    async fn create_review(
        &self,
        new_review: NewReview,
        reviewed_at: DateTime<Utc>,
    ) -> Result<ReviewData>;
    async fn update_review(&self, review: ReviewData) -> Result<ReviewData>;
    async fn delete_review(&self, review_id: PrimaryKey) -> Result<()>;

    async fn list_bookmarks(&self) -> Result<Vec<BookmarkData>>;
    async fn bookmark_by_id(&self, bookmark_id: PrimaryKey) -> Result<BookmarkData>;
    async fn bookmarks_by_member(&self, member_id: &str) -> Result<Vec<BookmarkData>>;
    async fn bookmark_by_pair(&self, member_id: &str, book_id: PrimaryKey)
        -> Result<BookmarkData>;
    async fn create_bookmark(&self, new_bookmark: NewBookmark) -> Result<BookmarkData>;
    async fn update_bookmark(&self, bookmark: BookmarkData) -> Result<BookmarkData>;
    async fn delete_bookmark(&self, bookmark_id: PrimaryKey) -> Result<()>;

    async fn check_for_admin(&self) -> Result<bool>;
    async fn member_by_id(&self, member_id: &str) -> Result<MemberData>;
    async fn member_by_username(&self, username: &str) -> Result<MemberData>;
    async fn create_member(&self, new_member: NewMember) -> Result<MemberData>;

    async fn session_by_token(&self, token: &str) -> Result<SessionData>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    async fn delete_session_by_token(&self, token: &str) -> Result<()>;
    async fn clear_expired_sessions(&self) -> Result<()>;
}

#[derive(Debug, Clone, Validate)]
pub struct NewBook {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub author: String,
    #[validate(range(min = 0, max = 9999))]
    pub publish_year: i32,
    #[validate(length(min = 100, max = 300))]
    pub description: String,
}

/// The complete set of mutable book fields, along with the id of the book they belong to
#[derive(Debug, Clone, Validate)]
pub struct UpdatedBook {
    pub id: PrimaryKey,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub author: String,
    #[validate(range(min = 0, max = 9999))]
    pub publish_year: i32,
    #[validate(length(min = 100, max = 300))]
    pub description: String,
}

#[derive(Debug, Clone, Validate)]
pub struct NewGenre {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Clone, Validate)]
pub struct UpdatedGenre {
    pub id: PrimaryKey,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewBookGenre {
    pub book_id: PrimaryKey,
    pub genre_id: PrimaryKey,
}

#[derive(Debug, Clone)]
pub struct UpdatedBookGenre {
    pub id: PrimaryKey,
    pub book_id: PrimaryKey,
    pub genre_id: PrimaryKey,
}

#[derive(Debug, Clone, Validate)]
pub struct NewReview {
    #[validate(length(min = 1))]
    pub member_id: MemberId,
    pub book_id: PrimaryKey,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(min = 5, max = 300))]
    pub comment: String,
}

/// The mutable fields of a review. The author and the book are fixed once created,
/// so they have to match the stored review.
#[derive(Debug, Clone, Validate)]
pub struct UpdatedReview {
    pub id: PrimaryKey,
    pub member_id: MemberId,
    pub book_id: PrimaryKey,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(min = 5, max = 300))]
    pub comment: String,
}

#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub member_id: MemberId,
    pub book_id: PrimaryKey,
}

#[derive(Debug, Clone)]
pub struct UpdatedBookmark {
    pub id: PrimaryKey,
    pub book_id: PrimaryKey,
}

#[derive(Debug)]
pub struct NewMember {
    pub id: MemberId,
    pub username: String,
    /// Already hashed
    pub password: String,
    pub name: String,
    pub email: String,
    pub admin: bool,
}

#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub member_id: MemberId,
    pub expires_at: DateTime<Utc>,
}
