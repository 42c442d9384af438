use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{auth, book_genres, bookmarks, books, genres, members, reviews, schemas, serialized};

#[derive(OpenApi)]
#[openapi(
    paths(
        books::list_books,
        books::book,
        books::books_by_genre,
        books::create_book,
        books::update_book,
        books::delete_book,
        genres::list_genres,
        genres::genre,
        genres::create_genre,
        genres::update_genre,
        genres::delete_genre,
        book_genres::list_book_genres,
        book_genres::book_genre,
        book_genres::create_book_genre,
        book_genres::update_book_genre,
        book_genres::delete_book_genre,
        reviews::list_reviews,
        reviews::review,
        reviews::reviews_by_book,
        reviews::create_review,
        reviews::update_review,
        reviews::delete_review,
        bookmarks::list_bookmarks,
        bookmarks::bookmark,
        bookmarks::create_bookmark,
        bookmarks::update_bookmark,
        bookmarks::delete_bookmark,
        members::member,
        auth::register,
        auth::register_admin,
        auth::login,
        auth::logout,
        auth::me,
    ),
    components(schemas(
        schemas::BookSchema,
        schemas::GenreSchema,
        schemas::BookGenreSchema,
        schemas::ReviewSchema,
        schemas::BookmarkSchema,
        schemas::LoginSchema,
        schemas::RegisterSchema,
        serialized::Book,
        serialized::Genre,
        serialized::BookGenre,
        serialized::Review,
        serialized::Bookmark,
        serialized::Member,
        serialized::LoginResult,
    )),
    modifiers(&Security),
    info(
        title = "Book Review API",
        description = "Exposes books, genres, reviews and bookmarks of this book review instance"
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("Bearer <token>")
                .build();

            components.add_security_scheme("BearerAuth", SecurityScheme::Http(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
