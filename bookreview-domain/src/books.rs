use std::sync::Arc;

use log::info;
use validator::Validate;

use crate::{
    error::LogFailure, BookData, Database, LibraryError, LibraryResult, NewBook, PrimaryKey,
    UpdatedBook,
};

pub struct BookService<Db> {
    db: Arc<Db>,
}

impl<Db> BookService<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    pub async fn list(&self) -> LibraryResult<Vec<BookData>> {
        Ok(self
            .db
            .list_books()
            .await
            .log_failure("list", "books")?)
    }

    pub async fn get_by_id(&self, book_id: PrimaryKey) -> LibraryResult<BookData> {
        Ok(self
            .db
            .book_by_id(book_id)
            .await
            .log_failure("get book", book_id)?)
    }

    /// Returns the books associated with a genre, which may be none at all
    pub async fn list_by_genre(&self, genre_id: PrimaryKey) -> LibraryResult<Vec<BookData>> {
        Ok(self
            .db
            .books_by_genre(genre_id)
            .await
            .log_failure("list books of genre", genre_id)?)
    }

    pub async fn add(&self, new_book: NewBook) -> LibraryResult<BookData> {
        new_book.validate()?;

        let book = self
            .db
            .create_book(new_book)
            .await
            .log_failure("create", "a new book")?;

        info!("Book {} created", book.id);
        Ok(book)
    }

    /// Replaces every mutable field of a book
    pub async fn update(&self, book_id: PrimaryKey, updated: UpdatedBook) -> LibraryResult<BookData> {
        if book_id != updated.id {
            return Err(LibraryError::IdMismatch {
                path: book_id,
                body: updated.id,
            });
        }

        updated.validate()?;

        let existing = self
            .db
            .book_by_id(book_id)
            .await
            .log_failure("update book", book_id)?;

        let book = self
            .db
            .update_book(BookData {
                title: updated.title,
                author: updated.author,
                publish_year: updated.publish_year,
                description: updated.description,
                ..existing
            })
            .await
            .log_failure("update book", book_id)?;

        info!("Book {} updated", book_id);
        Ok(book)
    }

    pub async fn delete(&self, book_id: PrimaryKey) -> LibraryResult<()> {
        self.db
            .delete_book(book_id)
            .await
            .log_failure("delete book", book_id)?;

        info!("Book {} deleted", book_id);
        Ok(())
    }
}
