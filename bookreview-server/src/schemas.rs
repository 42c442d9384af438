//! Request bodies accepted by the endpoints, along with conversions into domain input

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use bookreview_domain::{
    Credentials, NewBook, NewBookGenre, NewBookmark, NewGenre, NewPlainMember,
    NewReview, PrimaryKey, UpdatedBook, UpdatedBookGenre, UpdatedBookmark, UpdatedGenre,
    UpdatedReview,
};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::{ServerError, ServerResult};

#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSchema {
    /// Required when updating, ignored when creating
    pub book_id: Option<i64>,
    pub title: String,
    pub author: String,
    pub publish_year: i32,
    /// Between 100 and 300 characters
    pub book_description: String,
}

#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreSchema {
    pub genre_id: Option<i64>,
    pub genre_name: String,
}

#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookGenreSchema {
    pub book_genre_id: Option<i64>,
    pub book_id: i64,
    pub genre_id: i64,
}

/// A review as sent by a client. Any `reviewDate` is ignored, the server stamps it.
#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSchema {
    pub review_id: Option<i64>,
    pub member_id: String,
    pub book_id: i64,
    /// From 1 to 5
    pub rating: i32,
    pub review_comment: String,
}

#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkSchema {
    pub bookmark_id: Option<i64>,
    /// Defaults to the member making the request
    pub member_id: Option<String>,
    pub book_id: i64,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(length(max = 128))]
    pub username: String,
    #[validate(length(max = 64))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterSchema {
    #[validate(length(min = 2, max = 128))]
    pub username: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
    #[validate(length(min = 2, max = 128))]
    pub name: String,
    #[validate(email)]
    pub email: String,
}

/// The id carried by the body of an update, which has to be present
fn record_id(id: Option<PrimaryKey>) -> ServerResult<PrimaryKey> {
    id.ok_or(ServerError::IdMismatch)
}

impl BookSchema {
    pub fn into_new(self) -> NewBook {
        NewBook {
            title: self.title,
            author: self.author,
            publish_year: self.publish_year,
            description: self.book_description,
        }
    }

    pub fn into_updated(self) -> ServerResult<UpdatedBook> {
        Ok(UpdatedBook {
            id: record_id(self.book_id)?,
            title: self.title,
            author: self.author,
            publish_year: self.publish_year,
            description: self.book_description,
        })
    }
}

impl GenreSchema {
    pub fn into_new(self) -> NewGenre {
        NewGenre {
            name: self.genre_name,
        }
    }

    pub fn into_updated(self) -> ServerResult<UpdatedGenre> {
        Ok(UpdatedGenre {
            id: record_id(self.genre_id)?,
            name: self.genre_name,
        })
    }
}

impl BookGenreSchema {
    pub fn into_new(self) -> NewBookGenre {
        NewBookGenre {
            book_id: self.book_id,
            genre_id: self.genre_id,
        }
    }

    pub fn into_updated(self) -> ServerResult<UpdatedBookGenre> {
        Ok(UpdatedBookGenre {
            id: record_id(self.book_genre_id)?,
            book_id: self.book_id,
            genre_id: self.genre_id,
        })
    }
}

impl ReviewSchema {
    pub fn into_new(self) -> NewReview {
        NewReview {
            member_id: self.member_id,
            book_id: self.book_id,
            rating: self.rating,
            comment: self.review_comment,
        }
    }

    /// The member and the book of a review can't be changed, so they are dropped here
    pub fn into_updated(self) -> ServerResult<UpdatedReview> {
        Ok(UpdatedReview {
            id: record_id(self.review_id)?,
            member_id: self.member_id,
            book_id: self.book_id,
            rating: self.rating,
            comment: self.review_comment,
        })
    }
}

impl BookmarkSchema {
    pub fn into_new(self, caller: &str) -> NewBookmark {
        NewBookmark {
            member_id: self.member_id.unwrap_or_else(|| caller.to_string()),
            book_id: self.book_id,
        }
    }

    pub fn into_updated(self) -> ServerResult<UpdatedBookmark> {
        Ok(UpdatedBookmark {
            id: record_id(self.bookmark_id)?,
            book_id: self.book_id,
        })
    }
}

impl From<LoginSchema> for Credentials {
    fn from(value: LoginSchema) -> Self {
        Self {
            username: value.username,
            password: value.password,
        }
    }
}

impl From<RegisterSchema> for NewPlainMember {
    fn from(value: RegisterSchema) -> Self {
        Self {
            username: value.username,
            password: value.password,
            name: value.name,
            email: value.email,
        }
    }
}

/// Like [Json], but a body that doesn't parse is a bad request
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ServerError::Invalid(e.body_text()))?;

        Ok(Self(body))
    }
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(body) = JsonBody::<T>::from_request(req, state).await?;
        body.validate()?;

        Ok(Self(body))
    }
}
