use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json,
};

use crate::{
    auth::Session,
    created,
    errors::{ServerError, ServerResult},
    schemas::{BookSchema, JsonBody},
    serialized::{Book, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/Books",
    tag = "books",
    responses(
        (status = 200, body = Vec<Book>)
    )
)]
async fn list_books(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Book>>> {
    let books = context.library.books.list().await?;

    Ok(Json(books.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/Books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Id of the book")),
    responses(
        (status = 200, body = Book),
        (status = 404, description = "The book doesn't exist")
    )
)]
async fn book(
    State(context): State<ServerContext>,
    Path(book_id): Path<i64>,
) -> ServerResult<Json<Book>> {
    let book = context.library.books.get_by_id(book_id).await?;

    Ok(Json(book.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/Books/ByGenre/{genreId}",
    tag = "books",
    params(("genreId" = i64, Path, description = "Id of the genre")),
    responses(
        (status = 200, body = Vec<Book>),
        (status = 404, description = "No books belong to the genre")
    )
)]
async fn books_by_genre(
    State(context): State<ServerContext>,
    Path(genre_id): Path<i64>,
) -> ServerResult<Json<Vec<Book>>> {
    let books = context.library.books.list_by_genre(genre_id).await?;

    if books.is_empty() {
        return Err(ServerError::NotFound {
            resource: "book",
            identifier: "genre",
        });
    }

    Ok(Json(books.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/Books",
    tag = "books",
    request_body = BookSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Book),
        (status = 400, description = "The book is invalid"),
        (status = 403, description = "Only admins can add books")
    )
)]
async fn create_book(
    session: Session,
    State(context): State<ServerContext>,
    JsonBody(body): JsonBody<BookSchema>,
) -> ServerResult<Response> {
    session.require_admin()?;

    let book = context.library.books.add(body.into_new()).await?;
    let serialized: Book = book.to_serialized();

    Ok(created(format!("/api/Books/{}", book.id), serialized))
}

#[utoipa::path(
    put,
    path = "/api/Books/{id}",
    tag = "books",
    request_body = BookSchema,
    params(("id" = i64, Path, description = "Id of the book")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The book was updated"),
        (status = 400, description = "The book is invalid or the ids don't match"),
        (status = 404, description = "The book doesn't exist"),
        (status = 409, description = "The book was modified concurrently")
    )
)]
async fn update_book(
    session: Session,
    State(context): State<ServerContext>,
    Path(book_id): Path<i64>,
    JsonBody(body): JsonBody<BookSchema>,
) -> ServerResult<StatusCode> {
    session.require_admin()?;

    context
        .library
        .books
        .update(book_id, body.into_updated()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/Books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Id of the book")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The book was deleted"),
        (status = 404, description = "The book doesn't exist")
    )
)]
async fn delete_book(
    session: Session,
    State(context): State<ServerContext>,
    Path(book_id): Path<i64>,
) -> ServerResult<StatusCode> {
    session.require_admin()?;
    context.library.books.delete(book_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/ByGenre/:genre_id", get(books_by_genre))
        .route("/:id", get(book).put(update_book).delete(delete_book))
}
