use std::sync::Arc;

use log::info;
use validator::Validate;

use crate::{
    error::LogFailure, Database, GenreData, LibraryError, LibraryResult, NewGenre, PrimaryKey,
    UpdatedGenre,
};

pub struct GenreService<Db> {
    db: Arc<Db>,
}

impl<Db> GenreService<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    pub async fn list(&self) -> LibraryResult<Vec<GenreData>> {
        Ok(self
            .db
            .list_genres()
            .await
            .log_failure("list", "genres")?)
    }

    pub async fn get_by_id(&self, genre_id: PrimaryKey) -> LibraryResult<GenreData> {
        Ok(self
            .db
            .genre_by_id(genre_id)
            .await
            .log_failure("get genre", genre_id)?)
    }

    pub async fn add(&self, new_genre: NewGenre) -> LibraryResult<GenreData> {
        new_genre.validate()?;

        let genre = self
            .db
            .create_genre(new_genre)
            .await
            .log_failure("create", "a new genre")?;

        info!("Genre {} created", genre.id);
        Ok(genre)
    }

    pub async fn update(
        &self,
        genre_id: PrimaryKey,
        updated: UpdatedGenre,
    ) -> LibraryResult<GenreData> {
        if genre_id != updated.id {
            return Err(LibraryError::IdMismatch {
                path: genre_id,
                body: updated.id,
            });
        }

        updated.validate()?;

        let existing = self
            .db
            .genre_by_id(genre_id)
            .await
            .log_failure("update genre", genre_id)?;

        let genre = self
            .db
            .update_genre(GenreData {
                name: updated.name,
                ..existing
            })
            .await
            .log_failure("update genre", genre_id)?;

        info!("Genre {} updated", genre_id);
        Ok(genre)
    }

    /// Deletes a genre along with its book associations
    pub async fn delete(&self, genre_id: PrimaryKey) -> LibraryResult<()> {
        self.db
            .delete_genre(genre_id)
            .await
            .log_failure("delete genre", genre_id)?;

        info!("Genre {} deleted", genre_id);
        Ok(())
    }
}
