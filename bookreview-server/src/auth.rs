use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    response::Response,
    routing::{get, post},
    Json,
};
use bookreview_domain::{DatabaseError, Identity, MemberData, SessionData};

use crate::{
    created,
    errors::{ServerError, ServerResult},
    schemas::{LoginSchema, RegisterSchema, ValidatedJson},
    serialized::{LoginResult, Member, ToSerialized},
    Router, ServerContext,
};

/// Wraps [SessionData] so [FromRequestParts] can be implemented for it
pub struct Session(SessionData);

impl Session {
    /// Returns the member of the session
    pub fn member(&self) -> &MemberData {
        &self.0.member
    }

    pub fn identity(&self) -> Identity {
        self.0.identity()
    }

    /// Fails with [ServerError::Forbidden] unless the member is an admin
    pub fn require_admin(&self) -> ServerResult<()> {
        Ok(self.identity().require_admin()?)
    }
}

/// An unknown or expired token is a 401, anything else is a real failure
fn session_error(error: DatabaseError) -> ServerError {
    match error {
        DatabaseError::NotFound { .. } => ServerError::Unauthenticated,
        e => e.into(),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    ServerContext: FromRef<S>,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);

        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|x| x.to_str().ok())
            .ok_or(ServerError::MissingAuthorization)?;

        let parts: Vec<_> = header.split_ascii_whitespace().collect();

        if parts.first() != Some(&"Bearer") {
            return Err(ServerError::InvalidAuthorization);
        }

        let token = parts.get(1).cloned().unwrap_or_default();

        let session = context
            .library
            .auth
            .session(token)
            .await
            .map_err(session_error)?;

        Ok(Self(session))
    }
}

#[utoipa::path(
    post,
    path = "/api/Account/register",
    tag = "account",
    request_body = RegisterSchema,
    responses(
        (status = 201, body = Member),
        (status = 400, description = "The body is invalid"),
        (status = 409, description = "The username is taken")
    )
)]
async fn register(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<RegisterSchema>,
) -> ServerResult<Response> {
    let member = context.library.auth.register(body.into()).await?;
    let serialized: Member = member.to_serialized();

    Ok(created(format!("/api/Members/{}", member.id), serialized))
}

#[utoipa::path(
    post,
    path = "/api/Account/admin",
    tag = "account",
    request_body = RegisterSchema,
    responses(
        (status = 201, description = "The admin was created", body = Member),
        (status = 409, description = "An admin already exists")
    )
)]
async fn register_admin(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<RegisterSchema>,
) -> ServerResult<Response> {
    let member = context.library.auth.register_admin(body.into()).await?;
    let serialized: Member = member.to_serialized();

    Ok(created(format!("/api/Members/{}", member.id), serialized))
}

#[utoipa::path(
    post,
    path = "/api/Account/login",
    tag = "account",
    request_body = LoginSchema,
    responses(
        (status = 200, body = LoginResult),
        (status = 400, description = "Invalid credentials")
    )
)]
async fn login(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<Json<LoginResult>> {
    let session = context.library.auth.login(body.into()).await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/Account/logout",
    tag = "account",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The session was deleted")
    )
)]
async fn logout(session: Session, State(context): State<ServerContext>) -> ServerResult<StatusCode> {
    context.library.auth.logout(&session.0.token).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/Account/me",
    tag = "account",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Member),
        (status = 401, description = "Missing or unknown session")
    )
)]
async fn me(session: Session) -> Json<Member> {
    Json(session.member().to_serialized())
}

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/admin", post(register_admin))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[cfg(test)]
mod test {
    use axum::http::{Method, StatusCode};
    use bookreview_domain::DatabaseError;
    use serde_json::json;

    use crate::{errors::ServerError, test::TestApp};

    use super::session_error;

    #[test]
    fn only_missing_sessions_are_unauthenticated() {
        let missing = session_error(DatabaseError::NotFound {
            resource: "session",
            identifier: "token",
        });
        assert!(matches!(missing, ServerError::Unauthenticated));

        let broken = session_error(DatabaseError::Internal("disk I/O error".into()));
        assert!(matches!(broken, ServerError::Unknown(_)));
    }

    #[tokio::test]
    async fn register_login_and_logout() {
        let app = TestApp::new().await;

        let (status, headers, body) = app
            .request(
                Method::POST,
                "/api/Account/register",
                None,
                Some(json!({
                    "username": "lauren",
                    "password": "earthseed",
                    "name": "Lauren Olamina",
                    "email": "lauren@example.com"
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        let member_id = body["memberId"].as_str().unwrap().to_string();
        assert_eq!(
            headers["location"].to_str().unwrap(),
            format!("/api/Members/{member_id}")
        );
        assert!(body.get("password").is_none());

        let token = app.login("lauren", "earthseed").await;

        let (status, _, me) = app
            .request(Method::GET, "/api/Account/me", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["memberId"], member_id);

        let (status, _, _) = app
            .request(Method::POST, "/api/Account/logout", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, _) = app
            .request(Method::GET, "/api/Account/me", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_is_a_bad_request() {
        let app = TestApp::new().await;
        app.member("lauren").await;

        let (status, _, _) = app
            .request(
                Method::POST,
                "/api/Account/login",
                None,
                Some(json!({ "username": "lauren", "password": "wrong password" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn short_passwords_are_rejected() {
        let app = TestApp::new().await;

        let (status, _, _) = app
            .request(
                Method::POST,
                "/api/Account/register",
                None,
                Some(json!({
                    "username": "lauren",
                    "password": "short",
                    "name": "Lauren Olamina",
                    "email": "lauren@example.com"
                })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn authorization_header_is_checked() {
        let app = TestApp::new().await;

        let (status, _, _) = app
            .request(Method::GET, "/api/Account/me", None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = app
            .request_with_header(Method::GET, "/api/Account/me", "Basic bGF1cmVuOmVhcnRoc2VlZA==")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = app
            .request(Method::GET, "/api/Account/me", Some("not-a-session"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn second_admin_is_a_conflict() {
        let app = TestApp::new().await;
        app.admin().await;

        let (status, _, _) = app
            .request(
                Method::POST,
                "/api/Account/admin",
                None,
                Some(json!({
                    "username": "usurper",
                    "password": "earthseed",
                    "name": "Usurper",
                    "email": "usurper@example.com"
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
    }
}
