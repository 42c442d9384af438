use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use log::{info, warn};
use rand::{
    distributions::{Alphanumeric, DistString},
    rngs::OsRng,
};
use std::sync::Arc;
use thiserror::Error;

use crate::{
    Database, DatabaseError, LibraryError, LibraryResult, Mailer, MemberData, MemberId,
    NewMember, NewSession, SessionData,
};

/// Alphanumeric string used for session tokens and member ids
fn random_token(length: usize) -> String {
    Alphanumeric.sample_string(&mut OsRng, length)
}

pub struct Auth<Db> {
    db: Arc<Db>,
    mailer: Arc<dyn Mailer>,
    argon: Argon2<'static>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("An admin already exists")]
    AdminExists,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
}

/// Who is performing an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub member_id: MemberId,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> LibraryResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(LibraryError::Forbidden)
        }
    }

    /// Passes if this identity is the given owner, or an admin
    pub fn require_owner_or_admin(&self, owner_id: &str) -> LibraryResult<()> {
        if self.is_admin() || self.member_id == owner_id {
            Ok(())
        } else {
            Err(LibraryError::Forbidden)
        }
    }
}

impl MemberData {
    pub fn identity(&self) -> Identity {
        Identity {
            member_id: self.id.clone(),
            role: if self.admin { Role::Admin } else { Role::Member },
        }
    }
}

impl SessionData {
    pub fn identity(&self) -> Identity {
        self.member.identity()
    }
}

impl<Db> Auth<Db>
where
    Db: Database,
{
    const SESSION_DURATION_IN_DAYS: usize = 7;
    const TOKEN_LENGTH: usize = 32;
    const MEMBER_ID_LENGTH: usize = 24;

    pub fn new(db: &Arc<Db>, mailer: &Arc<dyn Mailer>) -> Self {
        Self {
            db: db.clone(),
            mailer: mailer.clone(),
            argon: Argon2::default(),
        }
    }

    /// Logs in a member, returning a new session
    pub async fn login(&self, credentials: Credentials) -> Result<SessionData, AuthError> {
        self.db
            .clear_expired_sessions()
            .await
            .map_err(AuthError::Db)?;

        let member = self
            .db
            .member_by_username(&credentials.username)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        let stored_password =
            PasswordHash::new(&member.password).map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(credentials.password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let expires_at = Utc::now() + Duration::days(Self::SESSION_DURATION_IN_DAYS as i64);

        let new_session = NewSession {
            token: random_token(Self::TOKEN_LENGTH),
            member_id: member.id,
            expires_at,
        };

        self.db
            .create_session(new_session)
            .await
            .map_err(AuthError::Db)
    }

    /// Deletes the associated session, if it exists
    pub async fn logout(&self, token: &str) -> Result<(), DatabaseError> {
        self.db.delete_session_by_token(token).await
    }

    /// Creates a regular member
    pub async fn register(&self, new_member: NewPlainMember) -> Result<MemberData, AuthError> {
        self.create_member(new_member, false).await
    }

    /// Creates an admin, if one doesn't already exist
    pub async fn register_admin(&self, new_member: NewPlainMember) -> Result<MemberData, AuthError> {
        let has_admin = self.db.check_for_admin().await.map_err(AuthError::Db)?;

        if has_admin {
            return Err(AuthError::AdminExists);
        }

        self.create_member(new_member, true).await
    }

    /// Returns a session if it exists and hasn't expired
    pub async fn session(&self, token: &str) -> Result<SessionData, DatabaseError> {
        self.db.session_by_token(token).await
    }

    pub async fn member(&self, member_id: &str) -> Result<MemberData, DatabaseError> {
        self.db.member_by_id(member_id).await
    }

    async fn create_member(
        &self,
        new_member: NewPlainMember,
        admin: bool,
    ) -> Result<MemberData, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(new_member.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let member = self
            .db
            .create_member(NewMember {
                id: random_token(Self::MEMBER_ID_LENGTH),
                username: new_member.username,
                password: hashed_password,
                name: new_member.name,
                email: new_member.email,
                admin,
            })
            .await
            .map_err(AuthError::Db)?;

        info!("Member {} registered as {}", member.id, member.username);
        self.welcome(&member).await;

        Ok(member)
    }

    async fn welcome(&self, member: &MemberData) {
        let body = format!(
            "Hi {},\n\nYour Book Review account \"{}\" is ready. Happy reading!",
            member.name, member.username
        );

        if let Err(e) = self
            .mailer
            .send(&member.email, "Welcome to Book Review", &body)
            .await
        {
            warn!("Could not send welcome mail to member {}: {}", member.id, e);
        }
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug)]
pub struct NewPlainMember {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
impl Identity {
    pub fn mock_admin() -> Self {
        Self {
            member_id: "admin".to_string(),
            role: Role::Admin,
        }
    }

    pub fn mock_member(member_id: &str) -> Self {
        Self {
            member_id: member_id.to_string(),
            role: Role::Member,
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::{
        mail::test::RecordingMailer, Auth, AuthError, Credentials, Database, DatabaseError,
        Mailer, NewPlainMember, Role, SqliteDatabase,
    };

    use super::random_token;

    #[test]
    fn tokens_are_alphanumeric() {
        let token = random_token(32);

        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, random_token(32));
    }

    async fn auth() -> (Auth<SqliteDatabase>, Arc<RecordingMailer>) {
        let db = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        let recorder = Arc::new(RecordingMailer::default());
        let mailer: Arc<dyn Mailer> = recorder.clone();

        (Auth::new(&db, &mailer), recorder)
    }

    fn mary() -> NewPlainMember {
        NewPlainMember {
            username: "mary".to_string(),
            password: "correct horse".to_string(),
            name: "Mary".to_string(),
            email: "mary@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let (auth, mailer) = auth().await;

        let member = auth.register(mary()).await.unwrap();
        assert_ne!(member.password, "correct horse");
        assert_eq!(member.identity().role, Role::Member);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "mary@example.com");

        let session = auth
            .login(Credentials {
                username: "mary".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.token.len(), 32);
        assert_eq!(session.member.id, member.id);
        assert_eq!(auth.session(&session.token).await.unwrap().member, member);

        auth.logout(&session.token).await.unwrap();
        assert!(auth.session(&session.token).await.is_err());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_the_same() {
        let (auth, _) = auth().await;
        auth.register(mary()).await.unwrap();

        let wrong_password = auth
            .login(Credentials {
                username: "mary".to_string(),
                password: "battery staple".to_string(),
            })
            .await;
        let unknown_user = auth
            .login(Credentials {
                username: "john".to_string(),
                password: "correct horse".to_string(),
            })
            .await;

        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let (auth, mailer) = auth().await;
        auth.register(mary()).await.unwrap();

        let result = auth.register(mary()).await;

        assert!(matches!(
            result,
            Err(AuthError::Db(DatabaseError::Conflict { .. }))
        ));
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn only_one_admin_can_bootstrap() {
        let (auth, _) = auth().await;

        let admin = auth.register_admin(mary()).await.unwrap();
        assert!(admin.identity().is_admin());

        let second = auth
            .register_admin(NewPlainMember {
                username: "john".to_string(),
                ..mary()
            })
            .await;

        assert!(matches!(second, Err(AuthError::AdminExists)));
    }

    #[tokio::test]
    async fn failed_mail_does_not_fail_registration() {
        let db = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        let recorder = Arc::new(RecordingMailer::failing());
        let mailer: Arc<dyn Mailer> = recorder.clone();
        let auth = Auth::new(&db, &mailer);

        let member = auth.register(mary()).await.unwrap();

        assert!(db.member_by_id(&member.id).await.is_ok());
    }
}
