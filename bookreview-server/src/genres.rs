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
    schemas::{GenreSchema, JsonBody},
    serialized::{Genre, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/Genres",
    tag = "genres",
    responses(
        (status = 200, body = Vec<Genre>)
    )
)]
async fn list_genres(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Genre>>> {
    let genres = context.library.genres.list().await?;

    Ok(Json(genres.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/Genres/{id}",
    tag = "genres",
    params(("id" = i64, Path, description = "Id of the genre")),
    responses(
        (status = 200, body = Genre),
        (status = 404, description = "The genre doesn't exist")
    )
)]
async fn genre(
    State(context): State<ServerContext>,
    Path(genre_id): Path<i64>,
) -> ServerResult<Json<Genre>> {
    let genre = context.library.genres.get_by_id(genre_id).await?;

    Ok(Json(genre.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/Genres",
    tag = "genres",
    request_body = GenreSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Genre),
        (status = 400, description = "The genre is invalid"),
        (status = 403, description = "Only admins can add genres")
    )
)]
async fn create_genre(
    session: Session,
    State(context): State<ServerContext>,
    JsonBody(body): JsonBody<GenreSchema>,
) -> ServerResult<Response> {
    session.require_admin()?;

    let genre = context.library.genres.add(body.into_new()).await?;
    let serialized: Genre = genre.to_serialized();

    Ok(created(format!("/api/Genres/{}", genre.id), serialized))
}

#[utoipa::path(
    put,
    path = "/api/Genres/{id}",
    tag = "genres",
    request_body = GenreSchema,
    params(("id" = i64, Path, description = "Id of the genre")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The genre was renamed"),
        (status = 400, description = "The genre is invalid or the ids don't match"),
        (status = 404, description = "The genre doesn't exist"),
        (status = 409, description = "The genre was modified concurrently")
    )
)]
async fn update_genre(
    session: Session,
    State(context): State<ServerContext>,
    Path(genre_id): Path<i64>,
    JsonBody(body): JsonBody<GenreSchema>,
) -> ServerResult<StatusCode> {
    session.require_admin()?;

    context
        .library
        .genres
        .update(genre_id, body.into_updated()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/Genres/{id}",
    tag = "genres",
    params(("id" = i64, Path, description = "Id of the genre")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The genre was deleted"),
        (status = 404, description = "The genre doesn't exist")
    )
)]
async fn delete_genre(
    session: Session,
    State(context): State<ServerContext>,
    Path(genre_id): Path<i64>,
) -> ServerResult<StatusCode> {
    session.require_admin()?;
    context.library.genres.delete(genre_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_genres).post(create_genre))
        .route("/:id", get(genre).put(update_genre).delete(delete_genre))
}

#[cfg(test)]
mod test {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test::TestApp;

    #[tokio::test]
    async fn crud() {
        let app = TestApp::new().await;
        let admin = app.admin().await;

        let genre_id = app.create_genre(&admin, "Sci-fi").await;
        let uri = format!("/api/Genres/{genre_id}");

        let (status, _, _) = app
            .request(
                Method::PUT,
                &uri,
                Some(&admin),
                Some(json!({ "genreId": genre_id, "genreName": "Science fiction" })),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, genre) = app.request(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            genre,
            json!({ "genreId": genre_id, "genreName": "Science fiction" })
        );

        let (status, _, _) = app.request(Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, genres) = app.request(Method::GET, "/api/Genres", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(genres, json!([]));
    }

    #[tokio::test]
    async fn members_cannot_add_genres() {
        let app = TestApp::new().await;
        let (_, member) = app.member("genly").await;

        let (status, _, _) = app
            .request(
                Method::POST,
                "/api/Genres",
                Some(&member),
                Some(json!({ "genreName": "Horror" })),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn empty_names_are_rejected() {
        let app = TestApp::new().await;
        let admin = app.admin().await;

        let (status, _, _) = app
            .request(
                Method::POST,
                "/api/Genres",
                Some(&admin),
                Some(json!({ "genreName": "" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
