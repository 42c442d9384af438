use std::sync::Arc;

use chrono::Utc;
use log::info;
use validator::Validate;

use crate::{
    error::{LogFailure, Reference},
    Database, Identity, LibraryError, LibraryResult, NewReview, PrimaryKey, ReviewData,
    UpdatedReview,
};

/// Reviews are owned by the member who wrote them.
/// Mutations require that member or an admin, and the review date is always stamped here.
pub struct ReviewService<Db> {
    db: Arc<Db>,
}

impl<Db> ReviewService<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    pub async fn list(&self) -> LibraryResult<Vec<ReviewData>> {
        Ok(self
            .db
            .list_reviews()
            .await
            .log_failure("list", "reviews")?)
    }

    pub async fn get_by_id(&self, review_id: PrimaryKey) -> LibraryResult<ReviewData> {
        Ok(self
            .db
            .review_by_id(review_id)
            .await
            .log_failure("get review", review_id)?)
    }

    pub async fn list_by_book(&self, book_id: PrimaryKey) -> LibraryResult<Vec<ReviewData>> {
        Ok(self
            .db
            .reviews_by_book(book_id)
            .await
            .log_failure("list reviews of book", book_id)?)
    }

    pub async fn add(&self, identity: &Identity, new_review: NewReview) -> LibraryResult<ReviewData> {
        new_review.validate()?;
        identity.require_owner_or_admin(&new_review.member_id)?;

        self.db
            .member_by_id(&new_review.member_id)
            .await
            .referenced("member")?;
        self.db
            .book_by_id(new_review.book_id)
            .await
            .referenced("book")?;

        let review = self
            .db
            .create_review(new_review, Utc::now())
            .await
            .log_failure("create", "a new review")
            .referenced("member or book")?;

        info!(
            "Review {} of book {} created by {}",
            review.id, review.book_id, identity.member_id
        );
        Ok(review)
    }

    pub async fn update(
        &self,
        identity: &Identity,
        review_id: PrimaryKey,
        updated: UpdatedReview,
    ) -> LibraryResult<ReviewData> {
        if review_id != updated.id {
            return Err(LibraryError::IdMismatch {
                path: review_id,
                body: updated.id,
            });
        }

        updated.validate()?;

        let existing = self
            .db
            .review_by_id(review_id)
            .await
            .log_failure("update review", review_id)?;

        identity.require_owner_or_admin(&existing.member_id)?;

        if updated.member_id != existing.member_id || updated.book_id != existing.book_id {
            return Err(LibraryError::Invalid(
                "The member and the book of a review cannot change".to_string(),
            ));
        }

        let review = self
            .db
            .update_review(ReviewData {
                rating: updated.rating,
                comment: updated.comment,
                reviewed_at: Utc::now(),
                ..existing
            })
            .await
            .log_failure("update review", review_id)?;

        info!("Review {} updated by {}", review_id, identity.member_id);
        Ok(review)
    }

    pub async fn delete(&self, identity: &Identity, review_id: PrimaryKey) -> LibraryResult<()> {
        let existing = self
            .db
            .review_by_id(review_id)
            .await
            .log_failure("delete review", review_id)?;

        identity.require_owner_or_admin(&existing.member_id)?;

        self.db
            .delete_review(review_id)
            .await
            .log_failure("delete review", review_id)?;

        info!("Review {} deleted by {}", review_id, identity.member_id);
        Ok(())
    }
}
