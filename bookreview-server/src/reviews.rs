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
    schemas::{JsonBody, ReviewSchema},
    serialized::{Review, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/Reviews",
    tag = "reviews",
    responses(
        (status = 200, body = Vec<Review>)
    )
)]
async fn list_reviews(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Review>>> {
    let reviews = context.library.reviews.list().await?;

    Ok(Json(reviews.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/Reviews/{id}",
    tag = "reviews",
    params(("id" = i64, Path, description = "Id of the review")),
    responses(
        (status = 200, body = Review),
        (status = 404, description = "The review doesn't exist")
    )
)]
async fn review(
    State(context): State<ServerContext>,
    Path(review_id): Path<i64>,
) -> ServerResult<Json<Review>> {
    let review = context.library.reviews.get_by_id(review_id).await?;

    Ok(Json(review.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/Reviews/ByBook/{bookId}",
    tag = "reviews",
    params(("bookId" = i64, Path, description = "Id of the book")),
    responses(
        (status = 200, body = Vec<Review>),
        (status = 404, description = "The book has no reviews")
    )
)]
async fn reviews_by_book(
    State(context): State<ServerContext>,
    Path(book_id): Path<i64>,
) -> ServerResult<Json<Vec<Review>>> {
    let reviews = context.library.reviews.list_by_book(book_id).await?;

    if reviews.is_empty() {
        return Err(ServerError::NotFound {
            resource: "review",
            identifier: "book",
        });
    }

    Ok(Json(reviews.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/Reviews",
    tag = "reviews",
    request_body = ReviewSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, description = "The review was created and dated", body = Review),
        (status = 400, description = "The review is invalid"),
        (status = 403, description = "Members can only review as themselves")
    )
)]
async fn create_review(
    session: Session,
    State(context): State<ServerContext>,
    JsonBody(body): JsonBody<ReviewSchema>,
) -> ServerResult<Response> {
    let review = context
        .library
        .reviews
        .add(&session.identity(), body.into_new())
        .await?;
    let serialized: Review = review.to_serialized();

    Ok(created(format!("/api/Reviews/{}", review.id), serialized))
}

#[utoipa::path(
    put,
    path = "/api/Reviews/{id}",
    tag = "reviews",
    request_body = ReviewSchema,
    params(("id" = i64, Path, description = "Id of the review")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The review was updated and re-dated"),
        (status = 400, description = "The review is invalid, the ids don't match, or the member or book differs from the stored review"),
        (status = 403, description = "Only the author or an admin can edit a review"),
        (status = 404, description = "The review doesn't exist"),
        (status = 409, description = "The review was modified concurrently")
    )
)]
async fn update_review(
    session: Session,
    State(context): State<ServerContext>,
    Path(review_id): Path<i64>,
    JsonBody(body): JsonBody<ReviewSchema>,
) -> ServerResult<StatusCode> {
    context
        .library
        .reviews
        .update(&session.identity(), review_id, body.into_updated()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/Reviews/{id}",
    tag = "reviews",
    params(("id" = i64, Path, description = "Id of the review")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The review was deleted"),
        (status = 403, description = "Only the author or an admin can delete a review"),
        (status = 404, description = "The review doesn't exist")
    )
)]
async fn delete_review(
    session: Session,
    State(context): State<ServerContext>,
    Path(review_id): Path<i64>,
) -> ServerResult<StatusCode> {
    context
        .library
        .reviews
        .delete(&session.identity(), review_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route("/ByBook/:book_id", get(reviews_by_book))
        .route(
            "/:id",
            get(review).put(update_review).delete(delete_review),
        )
}
