use axum::{
    extract::{Path, State},
    routing::get,
    Json,
};

use crate::{
    errors::ServerResult,
    serialized::{Member, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/Members/{id}",
    tag = "members",
    params(("id" = String, Path, description = "Id of the member")),
    responses(
        (status = 200, body = Member),
        (status = 404, description = "The member doesn't exist")
    )
)]
async fn member(
    State(context): State<ServerContext>,
    Path(member_id): Path<String>,
) -> ServerResult<Json<Member>> {
    let member = context.library.auth.member(&member_id).await?;

    Ok(Json(member.to_serialized()))
}

pub fn router() -> Router {
    Router::new().route("/:id", get(member))
}
