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
    schemas::{BookmarkSchema, JsonBody},
    serialized::{Bookmark, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/Bookmarks",
    tag = "bookmarks",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The bookmarks of the member, or every bookmark for admins", body = Vec<Bookmark>)
    )
)]
async fn list_bookmarks(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Bookmark>>> {
    let identity = session.identity();

    let bookmarks = if identity.is_admin() {
        context.library.bookmarks.list().await?
    } else {
        context
            .library
            .bookmarks
            .list_by_member(&identity.member_id)
            .await?
    };

    Ok(Json(bookmarks.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/Bookmarks/{id}",
    tag = "bookmarks",
    params(("id" = i64, Path, description = "Id of the bookmark")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Bookmark),
        (status = 403, description = "The bookmark belongs to someone else"),
        (status = 404, description = "The bookmark doesn't exist")
    )
)]
async fn bookmark(
    session: Session,
    State(context): State<ServerContext>,
    Path(bookmark_id): Path<i64>,
) -> ServerResult<Json<Bookmark>> {
    let bookmark = context.library.bookmarks.get_by_id(bookmark_id).await?;
    session
        .identity()
        .require_owner_or_admin(&bookmark.member_id)?;

    Ok(Json(bookmark.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/Bookmarks",
    tag = "bookmarks",
    request_body = BookmarkSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Bookmark),
        (status = 400, description = "The book doesn't exist"),
        (status = 403, description = "Members can only bookmark for themselves"),
        (status = 409, description = "The book is already bookmarked")
    )
)]
async fn create_bookmark(
    session: Session,
    State(context): State<ServerContext>,
    JsonBody(body): JsonBody<BookmarkSchema>,
) -> ServerResult<Response> {
    let identity = session.identity();

    let bookmark = context
        .library
        .bookmarks
        .add(&identity, body.into_new(&identity.member_id))
        .await?;
    let serialized: Bookmark = bookmark.to_serialized();

    Ok(created(
        format!("/api/Bookmarks/{}", bookmark.id),
        serialized,
    ))
}

#[utoipa::path(
    put,
    path = "/api/Bookmarks/{id}",
    tag = "bookmarks",
    request_body = BookmarkSchema,
    params(("id" = i64, Path, description = "Id of the bookmark")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The bookmark now points at another book"),
        (status = 400, description = "The book doesn't exist or the ids don't match"),
        (status = 403, description = "The bookmark belongs to someone else"),
        (status = 404, description = "The bookmark doesn't exist"),
        (status = 409, description = "The book is already bookmarked, or the bookmark was modified concurrently")
    )
)]
async fn update_bookmark(
    session: Session,
    State(context): State<ServerContext>,
    Path(bookmark_id): Path<i64>,
    JsonBody(body): JsonBody<BookmarkSchema>,
) -> ServerResult<StatusCode> {
    context
        .library
        .bookmarks
        .update(&session.identity(), bookmark_id, body.into_updated()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/Bookmarks/{id}",
    tag = "bookmarks",
    params(("id" = i64, Path, description = "Id of the bookmark")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The bookmark was deleted"),
        (status = 403, description = "The bookmark belongs to someone else"),
        (status = 404, description = "The bookmark doesn't exist")
    )
)]
async fn delete_bookmark(
    session: Session,
    State(context): State<ServerContext>,
    Path(bookmark_id): Path<i64>,
) -> ServerResult<StatusCode> {
    context
        .library
        .bookmarks
        .delete(&session.identity(), bookmark_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_bookmarks).post(create_bookmark))
        .route(
            "/:id",
            get(bookmark).put(update_bookmark).delete(delete_bookmark),
        )
}

#[cfg(test)]
mod test {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test::TestApp;

    #[tokio::test]
    async fn bookmarks_are_private() {
        let app = TestApp::new().await;
        let admin = app.admin().await;
        let book_id = app.create_book(&admin, "Tehanu").await;
        let (tenar_id, tenar) = app.member("tenar").await;
        let (_, ged) = app.member("ged").await;

        let (status, _, _) = app.request(Method::GET, "/api/Bookmarks", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, headers, created) = app
            .request(
                Method::POST,
                "/api/Bookmarks",
                Some(&tenar),
                Some(json!({ "bookId": book_id })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["memberId"], tenar_id);

        let location = headers["location"].to_str().unwrap().to_string();

        let (status, _, _) = app.request(Method::GET, &location, Some(&ged), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, fetched) = app.request(Method::GET, &location, Some(&tenar), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (_, _, own) = app.request(Method::GET, "/api/Bookmarks", Some(&ged), None).await;
        assert_eq!(own, json!([]));

        let (_, _, all) = app.request(Method::GET, "/api/Bookmarks", Some(&admin), None).await;
        assert_eq!(all, json!([created]));

        let (status, _, _) = app.request(Method::DELETE, &location, Some(&ged), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = app.request(Method::DELETE, &location, Some(&tenar), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn duplicates_conflict_and_moves_work() {
        let app = TestApp::new().await;
        let admin = app.admin().await;
        let tehanu = app.create_book(&admin, "Tehanu").await;
        let tombs = app.create_book(&admin, "The Tombs of Atuan").await;
        let (_, tenar) = app.member("tenar").await;

        let (_, _, created) = app
            .request(
                Method::POST,
                "/api/Bookmarks",
                Some(&tenar),
                Some(json!({ "bookId": tehanu })),
            )
            .await;
        let bookmark_id = created["bookmarkId"].as_i64().unwrap();

        let (status, _, _) = app
            .request(
                Method::POST,
                "/api/Bookmarks",
                Some(&tenar),
                Some(json!({ "bookId": tehanu })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let uri = format!("/api/Bookmarks/{bookmark_id}");
        let (status, _, _) = app
            .request(
                Method::PUT,
                &uri,
                Some(&tenar),
                Some(json!({ "bookmarkId": bookmark_id, "bookId": tombs })),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, _, fetched) = app.request(Method::GET, &uri, Some(&tenar), None).await;
        assert_eq!(fetched["bookId"], tombs);
    }
}
