use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    query, query_as,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteQueryResult},
    Error as SqlxError, FromRow, SqlitePool,
};

use crate::{
    BookData, BookGenreData, BookmarkData, Database, DatabaseError, DatabaseResult, GenreData,
    IntoDatabaseError, MemberData, NewBook, NewBookGenre, NewBookmark, NewGenre, NewMember,
    NewReview, NewSession, PrimaryKey, Result, ReviewData, SessionData,
};

/// A sqlite database implementation for the book review system
pub struct SqliteDatabase {
    pool: SqlitePool,
}

/// A session joined with the member it belongs to
#[derive(FromRow)]
struct SessionRow {
    id: PrimaryKey,
    token: String,
    expires_at: DateTime<Utc>,
    member_id: String,
    username: String,
    name: String,
    email: String,
    password: String,
    admin: bool,
}

impl SqliteDatabase {
    /// Connects to the database at `url`, creating it if needed, and applies pending migrations
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| e.any())?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| e.any())?;

        Self::migrated(pool).await
    }

    /// Creates an empty database that lives as long as the returned value
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| e.any())?;

        // Every connection to :memory: opens a separate database, so there can only be one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| e.any())?;

        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }
}

/// Checks that a versioned write actually touched its row
fn versioned(
    result: Result<SqliteQueryResult>,
    resource: &'static str,
    id: PrimaryKey,
) -> Result<()> {
    if result?.rows_affected() == 0 {
        return Err(DatabaseError::Modified { resource, id });
    }

    Ok(())
}

/// Checks that a delete removed something
fn deleted(
    result: std::result::Result<SqliteQueryResult, SqlxError>,
    resource: &'static str,
    identifier: &'static str,
) -> Result<()> {
    if result.map_err(|e| e.any())?.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            resource,
            identifier,
        });
    }

    Ok(())
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn list_books(&self) -> Result<Vec<BookData>> {
        query_as::<_, BookData>("SELECT * FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn book_by_id(&self, book_id: PrimaryKey) -> Result<BookData> {
        query_as::<_, BookData>("SELECT * FROM books WHERE id = ?")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("book", "id"))
    }

    async fn books_by_genre(&self, genre_id: PrimaryKey) -> Result<Vec<BookData>> {
        query_as::<_, BookData>(
            "
            SELECT DISTINCT books.*
            FROM books
                INNER JOIN book_genres ON book_genres.book_id = books.id
            WHERE book_genres.genre_id = ?
            ORDER BY books.id",
        )
        .bind(genre_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn create_book(&self, new_book: NewBook) -> Result<BookData> {
        let id = query(
            "INSERT INTO books (title, author, publish_year, description) VALUES (?, ?, ?, ?)",
        )
        .bind(new_book.title)
        .bind(new_book.author)
        .bind(new_book.publish_year)
        .bind(new_book.description)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?
        .last_insert_rowid();

        self.book_by_id(id).await
    }

    async fn update_book(&self, book: BookData) -> Result<BookData> {
        let result = query(
            "UPDATE books SET
                title = ?,
                author = ?,
                publish_year = ?,
                description = ?,
                version = version + 1
            WHERE id = ? AND version = ?",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.publish_year)
        .bind(&book.description)
        .bind(book.id)
        .bind(book.version)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any());

        versioned(result, "book", book.id)?;
        self.book_by_id(book.id).await
    }

    async fn delete_book(&self, book_id: PrimaryKey) -> Result<()> {
        let result = query("DELETE FROM books WHERE id = ?")
            .bind(book_id)
            .execute(&self.pool)
            .await;

        deleted(result, "book", "id")
    }

    async fn list_genres(&self) -> Result<Vec<GenreData>> {
        query_as::<_, GenreData>("SELECT * FROM genres ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn genre_by_id(&self, genre_id: PrimaryKey) -> Result<GenreData> {
        query_as::<_, GenreData>("SELECT * FROM genres WHERE id = ?")
            .bind(genre_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("genre", "id"))
    }

    async fn create_genre(&self, new_genre: NewGenre) -> Result<GenreData> {
        let id = query("INSERT INTO genres (name) VALUES (?)")
            .bind(new_genre.name)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?
            .last_insert_rowid();

        self.genre_by_id(id).await
    }

    async fn update_genre(&self, genre: GenreData) -> Result<GenreData> {
        let result =
            query("UPDATE genres SET name = ?, version = version + 1 WHERE id = ? AND version = ?")
                .bind(&genre.name)
                .bind(genre.id)
                .bind(genre.version)
                .execute(&self.pool)
                .await
                .map_err(|e| e.any());

        versioned(result, "genre", genre.id)?;
        self.genre_by_id(genre.id).await
    }

    async fn delete_genre(&self, genre_id: PrimaryKey) -> Result<()> {
        let result = query("DELETE FROM genres WHERE id = ?")
            .bind(genre_id)
            .execute(&self.pool)
            .await;

        deleted(result, "genre", "id")
    }

    async fn list_book_genres(&self) -> Result<Vec<BookGenreData>> {
        query_as::<_, BookGenreData>("SELECT * FROM book_genres ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn book_genre_by_id(&self, book_genre_id: PrimaryKey) -> Result<BookGenreData> {
        query_as::<_, BookGenreData>("SELECT * FROM book_genres WHERE id = ?")
            .bind(book_genre_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("book genre", "id"))
    }

    async fn book_genre_by_pair(
        &self,
        book_id: PrimaryKey,
        genre_id: PrimaryKey,
    ) -> Result<BookGenreData> {
        query_as::<_, BookGenreData>(
            "SELECT * FROM book_genres WHERE book_id = ? AND genre_id = ?",
        )
        .bind(book_id)
        .bind(genre_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("book genre", "book:genre"))
    }

    async fn create_book_genre(&self, new_book_genre: NewBookGenre) -> Result<BookGenreData> {
        self.book_genre_by_pair(new_book_genre.book_id, new_book_genre.genre_id)
            .await
            .conflict_or_ok(
                "book genre",
                "book:genre",
                format!("{}:{}", new_book_genre.book_id, new_book_genre.genre_id).as_str(),
            )?;

        let id = query("INSERT INTO book_genres (book_id, genre_id) VALUES (?, ?)")
            .bind(new_book_genre.book_id)
            .bind(new_book_genre.genre_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                e.conflict_or(
                    "book genre",
                    "book:genre",
                    &format!("{}:{}", new_book_genre.book_id, new_book_genre.genre_id),
                )
            })?
            .last_insert_rowid();

        self.book_genre_by_id(id).await
    }

    async fn update_book_genre(&self, book_genre: BookGenreData) -> Result<BookGenreData> {
        // Ensure the new pairing doesn't belong to another row
        match self
            .book_genre_by_pair(book_genre.book_id, book_genre.genre_id)
            .await
        {
            Ok(existing) if existing.id != book_genre.id => {
                return Err(DatabaseError::Conflict {
                    resource: "book genre",
                    field: "book:genre",
                    value: format!("{}:{}", book_genre.book_id, book_genre.genre_id),
                })
            }
            Err(DatabaseError::NotFound { .. }) | Ok(_) => {}
            Err(e) => return Err(e),
        }

        let result = query(
            "UPDATE book_genres SET
                book_id = ?,
                genre_id = ?,
                version = version + 1
            WHERE id = ? AND version = ?",
        )
        .bind(book_genre.book_id)
        .bind(book_genre.genre_id)
        .bind(book_genre.id)
        .bind(book_genre.version)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            e.conflict_or(
                "book genre",
                "book:genre",
                &format!("{}:{}", book_genre.book_id, book_genre.genre_id),
            )
        });

        versioned(result, "book genre", book_genre.id)?;
        self.book_genre_by_id(book_genre.id).await
    }

    async fn delete_book_genre(&self, book_genre_id: PrimaryKey) -> Result<()> {
        let result = query("DELETE FROM book_genres WHERE id = ?")
            .bind(book_genre_id)
            .execute(&self.pool)
            .await;

        deleted(result, "book genre", "id")
    }

    async fn list_reviews(&self) -> Result<Vec<ReviewData>> {
        query_as::<_, ReviewData>("SELECT * FROM reviews ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn review_by_id(&self, review_id: PrimaryKey) -> Result<ReviewData> {
        query_as::<_, ReviewData>("SELECT * FROM reviews WHERE id = ?")
            .bind(review_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("review", "id"))
    }

    async fn reviews_by_book(&self, book_id: PrimaryKey) -> Result<Vec<ReviewData>> {
        query_as::<_, ReviewData>("SELECT * FROM reviews WHERE book_id = ? ORDER BY id")
            .bind(book_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_review(
        &self,
        new_review: NewReview,
        reviewed_at: DateTime<Utc>,
    ) -> Result<ReviewData> {
        let id = query(
            "
            INSERT INTO reviews (member_id, book_id, rating, comment, reviewed_at)
            VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_review.member_id)
        .bind(new_review.book_id)
        .bind(new_review.rating)
        .bind(new_review.comment)
        .bind(reviewed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            e.conflict_or(
                "review",
                "member:book",
                &format!("{}:{}", new_review.member_id, new_review.book_id),
            )
        })?
        .last_insert_rowid();

        self.review_by_id(id).await
    }

    async fn update_review(&self, review: ReviewData) -> Result<ReviewData> {
        let result = query(
            "UPDATE reviews SET
                rating = ?,
                comment = ?,
                reviewed_at = ?,
                version = version + 1
            WHERE id = ? AND version = ?",
        )
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.reviewed_at)
        .bind(review.id)
        .bind(review.version)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any());

        versioned(result, "review", review.id)?;
        self.review_by_id(review.id).await
    }

    async fn delete_review(&self, review_id: PrimaryKey) -> Result<()> {
        let result = query("DELETE FROM reviews WHERE id = ?")
            .bind(review_id)
            .execute(&self.pool)
            .await;

        deleted(result, "review", "id")
    }

    async fn list_bookmarks(&self) -> Result<Vec<BookmarkData>> {
        query_as::<_, BookmarkData>("SELECT * FROM bookmarks ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn bookmark_by_id(&self, bookmark_id: PrimaryKey) -> Result<BookmarkData> {
        query_as::<_, BookmarkData>("SELECT * FROM bookmarks WHERE id = ?")
            .bind(bookmark_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("bookmark", "id"))
    }

    async fn bookmarks_by_member(&self, member_id: &str) -> Result<Vec<BookmarkData>> {
        query_as::<_, BookmarkData>("SELECT * FROM bookmarks WHERE member_id = ? ORDER BY id")
            .bind(member_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn bookmark_by_pair(
        &self,
        member_id: &str,
        book_id: PrimaryKey,
    ) -> Result<BookmarkData> {
        query_as::<_, BookmarkData>("SELECT * FROM bookmarks WHERE member_id = ? AND book_id = ?")
            .bind(member_id)
            .bind(book_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("bookmark", "member:book"))
    }

    async fn create_bookmark(&self, new_bookmark: NewBookmark) -> Result<BookmarkData> {
        self.bookmark_by_pair(&new_bookmark.member_id, new_bookmark.book_id)
            .await
            .conflict_or_ok(
                "bookmark",
                "member:book",
                format!("{}:{}", new_bookmark.member_id, new_bookmark.book_id).as_str(),
            )?;

        let id = query("INSERT INTO bookmarks (member_id, book_id) VALUES (?, ?)")
            .bind(&new_bookmark.member_id)
            .bind(new_bookmark.book_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                e.conflict_or(
                    "bookmark",
                    "member:book",
                    &format!("{}:{}", new_bookmark.member_id, new_bookmark.book_id),
                )
            })?
            .last_insert_rowid();

        self.bookmark_by_id(id).await
    }

    async fn update_bookmark(&self, bookmark: BookmarkData) -> Result<BookmarkData> {
        // Ensure the member hasn't bookmarked the new book already
        match self
            .bookmark_by_pair(&bookmark.member_id, bookmark.book_id)
            .await
        {
            Ok(existing) if existing.id != bookmark.id => {
                return Err(DatabaseError::Conflict {
                    resource: "bookmark",
                    field: "member:book",
                    value: format!("{}:{}", bookmark.member_id, bookmark.book_id),
                })
            }
            Err(DatabaseError::NotFound { .. }) | Ok(_) => {}
            Err(e) => return Err(e),
        }

        let result = query(
            "UPDATE bookmarks SET book_id = ?, version = version + 1 WHERE id = ? AND version = ?",
        )
        .bind(bookmark.book_id)
        .bind(bookmark.id)
        .bind(bookmark.version)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            e.conflict_or(
                "bookmark",
                "member:book",
                &format!("{}:{}", bookmark.member_id, bookmark.book_id),
            )
        });

        versioned(result, "bookmark", bookmark.id)?;
        self.bookmark_by_id(bookmark.id).await
    }

    async fn delete_bookmark(&self, bookmark_id: PrimaryKey) -> Result<()> {
        let result = query("DELETE FROM bookmarks WHERE id = ?")
            .bind(bookmark_id)
            .execute(&self.pool)
            .await;

        deleted(result, "bookmark", "id")
    }

    async fn check_for_admin(&self) -> Result<bool> {
        let result = query("SELECT id FROM members WHERE admin = TRUE")
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(SqlxError::RowNotFound) => Ok(false),
            Err(e) => Err(e.any()),
        }
    }

    async fn member_by_id(&self, member_id: &str) -> Result<MemberData> {
        query_as::<_, MemberData>("SELECT * FROM members WHERE id = ?")
            .bind(member_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("member", "id"))
    }

    async fn member_by_username(&self, username: &str) -> Result<MemberData> {
        query_as::<_, MemberData>("SELECT * FROM members WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("member", "username"))
    }

    async fn create_member(&self, new_member: NewMember) -> Result<MemberData> {
        self.member_by_username(&new_member.username)
            .await
            .conflict_or_ok("member", "username", &new_member.username)?;

        query(
            "
            INSERT INTO members (id, username, name, email, password, admin)
            VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_member.id)
        .bind(&new_member.username)
        .bind(new_member.name)
        .bind(new_member.email)
        .bind(new_member.password)
        .bind(new_member.admin)
        .execute(&self.pool)
        .await
        .map_err(|e| e.conflict_or("member", "username", &new_member.username))?;

        self.member_by_id(&new_member.id).await
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let row = query_as::<_, SessionRow>(
            "
            SELECT
                sessions.id,
                sessions.token,
                sessions.expires_at,
                members.id AS member_id,
                members.username,
                members.name,
                members.email,
                members.password,
                members.admin
            FROM sessions
                INNER JOIN members ON sessions.member_id = members.id
            WHERE token = ?",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("session", "token"))?;

        if row.expires_at <= Utc::now() {
            return Err(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            });
        }

        Ok(SessionData {
            id: row.id,
            token: row.token,
            expires_at: row.expires_at,
            member: MemberData {
                id: row.member_id,
                username: row.username,
                name: row.name,
                email: row.email,
                password: row.password,
                admin: row.admin,
            },
        })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_token(&new_session.token)
            .await
            .conflict_or_ok("session", "token", &new_session.token)?;

        query("INSERT INTO sessions (token, member_id, expires_at) VALUES (?, ?, ?)")
            .bind(&new_session.token)
            .bind(new_session.member_id)
            .bind(new_session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.session_by_token(&new_session.token).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        // Ensure session exists
        let _ = self.session_by_token(token).await?;

        let result = query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await;

        deleted(result, "session", "token")
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }

    fn conflict_or(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> DatabaseError {
        let (unique, foreign_key) = match self.as_database_error() {
            Some(e) => (e.is_unique_violation(), e.is_foreign_key_violation()),
            None => (false, false),
        };

        if unique {
            DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }
        } else if foreign_key {
            DatabaseError::NotFound {
                resource: "referenced row",
                identifier: "id",
            }
        } else {
            self.any()
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};

    use crate::{
        Database, DatabaseError, IntoDatabaseError, MemberData, NewBook, NewBookmark, NewGenre,
        NewMember, NewSession,
    };

    use super::SqliteDatabase;

    fn new_book(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Ursula K. Le Guin".to_string(),
            publish_year: 1969,
            description: "d".repeat(120),
        }
    }

    async fn member(db: &SqliteDatabase, id: &str) -> MemberData {
        db.create_member(NewMember {
            id: id.to_string(),
            username: id.to_string(),
            password: "not-a-real-hash".to_string(),
            name: "Lauren Olamina".to_string(),
            email: format!("{id}@example.com"),
            admin: false,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let book = db.create_book(new_book("The Left Hand of Darkness")).await.unwrap();

        let mut first = book.clone();
        first.title = "First writer".to_string();
        let written = db.update_book(first).await.unwrap();
        assert_eq!(written.version, book.version + 1);

        let mut second = book.clone();
        second.title = "Second writer".to_string();
        let result = db.update_book(second).await;

        assert!(matches!(
            result,
            Err(DatabaseError::Modified {
                resource: "book",
                ..
            })
        ));
        assert_eq!(db.book_by_id(book.id).await.unwrap().title, "First writer");
    }

    #[tokio::test]
    async fn update_of_vanished_row_is_modified() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let genre = db
            .create_genre(NewGenre {
                name: "Fantasy".to_string(),
            })
            .await
            .unwrap();

        db.delete_genre(genre.id).await.unwrap();

        assert!(matches!(
            db.update_genre(genre).await,
            Err(DatabaseError::Modified { .. })
        ));
    }

    #[tokio::test]
    async fn deleting_a_book_cascades_to_its_genres() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let book = db.create_book(new_book("A Wizard of Earthsea")).await.unwrap();
        let genre = db
            .create_genre(NewGenre {
                name: "Fantasy".to_string(),
            })
            .await
            .unwrap();

        db.create_book_genre(crate::NewBookGenre {
            book_id: book.id,
            genre_id: genre.id,
        })
        .await
        .unwrap();

        db.delete_book(book.id).await.unwrap();

        assert!(db.list_book_genres().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_sessions_are_not_found() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let member = db
            .create_member(NewMember {
                id: "m1".to_string(),
                username: "mary".to_string(),
                password: "not-a-real-hash".to_string(),
                name: "Mary".to_string(),
                email: "mary@example.com".to_string(),
                admin: false,
            })
            .await
            .unwrap();

        let session = db
            .create_session(NewSession {
                token: "fresh".to_string(),
                member_id: member.id.clone(),
                expires_at: Utc::now() + Duration::days(1),
            })
            .await
            .unwrap();
        assert_eq!(session.member, member);

        // Inserted directly since create_session reads the session back
        sqlx::query("INSERT INTO sessions (token, member_id, expires_at) VALUES (?, ?, ?)")
            .bind("stale")
            .bind(&member.id)
            .bind(Utc::now() - Duration::days(1))
            .execute(&db.pool)
            .await
            .unwrap();

        assert!(matches!(
            db.session_by_token("stale").await,
            Err(DatabaseError::NotFound { .. })
        ));

        db.clear_expired_sessions().await.unwrap();
        assert!(db.session_by_token("fresh").await.is_ok());
    }

    #[tokio::test]
    async fn racing_bookmarks_conflict() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let member = member(&db, "lauren").await;
        let book = db.create_book(new_book("Parable of the Sower")).await.unwrap();

        let new_bookmark = NewBookmark {
            member_id: member.id,
            book_id: book.id,
        };

        let (first, second) = tokio::join!(
            db.create_bookmark(new_bookmark.clone()),
            db.create_bookmark(new_bookmark.clone())
        );

        let conflicts = [&first, &second]
            .iter()
            .filter(|r| matches!(r, Err(DatabaseError::Conflict { .. })))
            .count();

        assert!(first.is_ok() || second.is_ok());
        assert_eq!(conflicts, 1);
        assert_eq!(db.list_bookmarks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unique_violations_are_conflicts() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let member = member(&db, "lauren").await;
        let book = db.create_book(new_book("Parable of the Sower")).await.unwrap();

        let insert = || {
            sqlx::query("INSERT INTO bookmarks (member_id, book_id) VALUES (?, ?)")
                .bind(&member.id)
                .bind(book.id)
                .execute(&db.pool)
        };

        insert().await.unwrap();
        let error = insert()
            .await
            .unwrap_err()
            .conflict_or("bookmark", "member:book", "lauren:1");

        assert!(matches!(
            error,
            DatabaseError::Conflict {
                resource: "bookmark",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn missing_references_are_not_found() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let member = member(&db, "lauren").await;

        let result = db
            .create_bookmark(NewBookmark {
                member_id: member.id,
                book_id: 404,
            })
            .await;

        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn racing_deletes_remove_once() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let book = db.create_book(new_book("Parable of the Talents")).await.unwrap();

        let (first, second) = tokio::join!(db.delete_book(book.id), db.delete_book(book.id));

        let not_found = [&first, &second]
            .iter()
            .filter(|r| matches!(r, Err(DatabaseError::NotFound { .. })))
            .count();

        assert!(first.is_ok() || second.is_ok());
        assert_eq!(not_found, 1);
        assert!(matches!(
            db.delete_book(book.id).await,
            Err(DatabaseError::NotFound { resource: "book", .. })
        ));
    }
}
