mod auth;
mod book_genres;
mod bookmarks;
mod books;
mod db;
mod error;
mod genres;
mod mail;
mod reviews;

use std::sync::Arc;

pub use auth::*;
pub use book_genres::BookGenreService;
pub use bookmarks::BookmarkService;
pub use books::BookService;
pub use db::*;
pub use error::{LibraryError, LibraryResult};
pub use genres::GenreService;
pub use mail::*;
pub use reviews::ReviewService;

/// The book review system, grouping every service around a shared database.
pub struct Library<Db> {
    pub books: BookService<Db>,
    pub genres: GenreService<Db>,
    pub book_genres: BookGenreService<Db>,
    pub reviews: ReviewService<Db>,
    pub bookmarks: BookmarkService<Db>,
    pub auth: Auth<Db>,
}

impl<Db> Library<Db>
where
    Db: Database,
{
    pub fn new(database: Db, mailer: Arc<dyn Mailer>) -> Self {
        let database = Arc::new(database);

        Self {
            books: BookService::new(&database),
            genres: GenreService::new(&database),
            book_genres: BookGenreService::new(&database),
            reviews: ReviewService::new(&database),
            bookmarks: BookmarkService::new(&database),
            auth: Auth::new(&database, &mailer),
        }
    }
}
