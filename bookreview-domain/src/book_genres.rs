use std::sync::Arc;

use log::info;

use crate::{
    error::{LogFailure, Reference},
    BookGenreData, Database, LibraryError, LibraryResult, NewBookGenre, PrimaryKey,
    UpdatedBookGenre,
};

/// Manages which books belong to which genres
pub struct BookGenreService<Db> {
    db: Arc<Db>,
}

impl<Db> BookGenreService<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    pub async fn list(&self) -> LibraryResult<Vec<BookGenreData>> {
        Ok(self
            .db
            .list_book_genres()
            .await
            .log_failure("list", "book genres")?)
    }

    pub async fn get_by_id(&self, book_genre_id: PrimaryKey) -> LibraryResult<BookGenreData> {
        Ok(self
            .db
            .book_genre_by_id(book_genre_id)
            .await
            .log_failure("get book genre", book_genre_id)?)
    }

    pub async fn add(&self, new_book_genre: NewBookGenre) -> LibraryResult<BookGenreData> {
        self.ensure_references(new_book_genre.book_id, new_book_genre.genre_id)
            .await?;

        let book_genre = self
            .db
            .create_book_genre(new_book_genre)
            .await
            .log_failure("create", "a new book genre")
            .referenced("book or genre")?;

        info!(
            "Book {} associated with genre {}",
            book_genre.book_id, book_genre.genre_id
        );
        Ok(book_genre)
    }

    pub async fn update(
        &self,
        book_genre_id: PrimaryKey,
        updated: UpdatedBookGenre,
    ) -> LibraryResult<BookGenreData> {
        if book_genre_id != updated.id {
            return Err(LibraryError::IdMismatch {
                path: book_genre_id,
                body: updated.id,
            });
        }

        let existing = self
            .db
            .book_genre_by_id(book_genre_id)
            .await
            .log_failure("update book genre", book_genre_id)?;

        self.ensure_references(updated.book_id, updated.genre_id)
            .await?;

        let book_genre = self
            .db
            .update_book_genre(BookGenreData {
                book_id: updated.book_id,
                genre_id: updated.genre_id,
                ..existing
            })
            .await
            .log_failure("update book genre", book_genre_id)
            .referenced("book or genre")?;

        info!("Book genre {} updated", book_genre_id);
        Ok(book_genre)
    }

    pub async fn delete(&self, book_genre_id: PrimaryKey) -> LibraryResult<()> {
        self.db
            .delete_book_genre(book_genre_id)
            .await
            .log_failure("delete book genre", book_genre_id)?;

        info!("Book genre {} deleted", book_genre_id);
        Ok(())
    }

    async fn ensure_references(
        &self,
        book_id: PrimaryKey,
        genre_id: PrimaryKey,
    ) -> LibraryResult<()> {
        self.db.book_by_id(book_id).await.referenced("book")?;
        self.db.genre_by_id(genre_id).await.referenced("genre")?;

        Ok(())
    }
}
