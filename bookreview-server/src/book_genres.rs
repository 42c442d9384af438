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
    errors::ServerResult,
    schemas::{BookGenreSchema, JsonBody},
    serialized::{BookGenre, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/BookGenres",
    tag = "book genres",
    responses(
        (status = 200, body = Vec<BookGenre>)
    )
)]
async fn list_book_genres(
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<BookGenre>>> {
    let book_genres = context.library.book_genres.list().await?;

    Ok(Json(book_genres.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/BookGenres/{id}",
    tag = "book genres",
    params(("id" = i64, Path, description = "Id of the association")),
    responses(
        (status = 200, body = BookGenre),
        (status = 404, description = "The association doesn't exist")
    )
)]
async fn book_genre(
    State(context): State<ServerContext>,
    Path(book_genre_id): Path<i64>,
) -> ServerResult<Json<BookGenre>> {
    let book_genre = context.library.book_genres.get_by_id(book_genre_id).await?;

    Ok(Json(book_genre.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/BookGenres",
    tag = "book genres",
    request_body = BookGenreSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = BookGenre),
        (status = 400, description = "The book or the genre doesn't exist"),
        (status = 403, description = "Only admins can associate books with genres"),
        (status = 409, description = "The book already has the genre")
    )
)]
async fn create_book_genre(
    session: Session,
    State(context): State<ServerContext>,
    JsonBody(body): JsonBody<BookGenreSchema>,
) -> ServerResult<Response> {
    session.require_admin()?;

    let book_genre = context.library.book_genres.add(body.into_new()).await?;
    let serialized: BookGenre = book_genre.to_serialized();

    Ok(created(
        format!("/api/BookGenres/{}", book_genre.id),
        serialized,
    ))
}

#[utoipa::path(
    put,
    path = "/api/BookGenres/{id}",
    tag = "book genres",
    request_body = BookGenreSchema,
    params(("id" = i64, Path, description = "Id of the association")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The association was updated"),
        (status = 400, description = "Invalid references or mismatched ids"),
        (status = 404, description = "The association doesn't exist"),
        (status = 409, description = "The pair already exists, or the association was modified concurrently")
    )
)]
async fn update_book_genre(
    session: Session,
    State(context): State<ServerContext>,
    Path(book_genre_id): Path<i64>,
    JsonBody(body): JsonBody<BookGenreSchema>,
) -> ServerResult<StatusCode> {
    session.require_admin()?;

    context
        .library
        .book_genres
        .update(book_genre_id, body.into_updated()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/BookGenres/{id}",
    tag = "book genres",
    params(("id" = i64, Path, description = "Id of the association")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The association was deleted"),
        (status = 404, description = "The association doesn't exist")
    )
)]
async fn delete_book_genre(
    session: Session,
    State(context): State<ServerContext>,
    Path(book_genre_id): Path<i64>,
) -> ServerResult<StatusCode> {
    session.require_admin()?;
    context.library.book_genres.delete(book_genre_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_book_genres).post(create_book_genre))
        .route(
            "/:id",
            get(book_genre)
                .put(update_book_genre)
                .delete(delete_book_genre),
        )
}
