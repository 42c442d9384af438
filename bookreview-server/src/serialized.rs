//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use bookreview_domain::{
    BookData, BookGenreData, BookmarkData, GenreData, MemberData, ReviewData, SessionData,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    book_id: i64,
    title: String,
    author: String,
    publish_year: i32,
    book_description: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    genre_id: i64,
    genre_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookGenre {
    book_genre_id: i64,
    book_id: i64,
    genre_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    review_id: i64,
    member_id: String,
    book_id: i64,
    rating: i32,
    review_comment: String,
    review_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    bookmark_id: i64,
    member_id: String,
    book_id: i64,
}

/// The public view of a member
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    member_id: String,
    username: String,
    name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResult {
    token: String,
    member: Member,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<Book> for BookData {
    fn to_serialized(&self) -> Book {
        Book {
            book_id: self.id,
            title: self.title.clone(),
            author: self.author.clone(),
            publish_year: self.publish_year,
            book_description: self.description.clone(),
        }
    }
}

impl ToSerialized<Genre> for GenreData {
    fn to_serialized(&self) -> Genre {
        Genre {
            genre_id: self.id,
            genre_name: self.name.clone(),
        }
    }
}

impl ToSerialized<BookGenre> for BookGenreData {
    fn to_serialized(&self) -> BookGenre {
        BookGenre {
            book_genre_id: self.id,
            book_id: self.book_id,
            genre_id: self.genre_id,
        }
    }
}

impl ToSerialized<Review> for ReviewData {
    fn to_serialized(&self) -> Review {
        Review {
            review_id: self.id,
            member_id: self.member_id.clone(),
            book_id: self.book_id,
            rating: self.rating,
            review_comment: self.comment.clone(),
            review_date: self.reviewed_at,
        }
    }
}

impl ToSerialized<Bookmark> for BookmarkData {
    fn to_serialized(&self) -> Bookmark {
        Bookmark {
            bookmark_id: self.id,
            member_id: self.member_id.clone(),
            book_id: self.book_id,
        }
    }
}

impl ToSerialized<Member> for MemberData {
    fn to_serialized(&self) -> Member {
        Member {
            member_id: self.id.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
        }
    }
}

impl ToSerialized<LoginResult> for SessionData {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            token: self.token.clone(),
            member: self.member.to_serialized(),
        }
    }
}
