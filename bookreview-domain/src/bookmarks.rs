use std::sync::Arc;

use log::info;

use crate::{
    error::{LogFailure, Reference},
    BookmarkData, Database, Identity, LibraryError, LibraryResult, NewBookmark, PrimaryKey,
    UpdatedBookmark,
};

pub struct BookmarkService<Db> {
    db: Arc<Db>,
}

impl<Db> BookmarkService<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    pub async fn list(&self) -> LibraryResult<Vec<BookmarkData>> {
        Ok(self
            .db
            .list_bookmarks()
            .await
            .log_failure("list", "bookmarks")?)
    }

    pub async fn get_by_id(&self, bookmark_id: PrimaryKey) -> LibraryResult<BookmarkData> {
        Ok(self
            .db
            .bookmark_by_id(bookmark_id)
            .await
            .log_failure("get bookmark", bookmark_id)?)
    }

    pub async fn list_by_member(&self, member_id: &str) -> LibraryResult<Vec<BookmarkData>> {
        Ok(self
            .db
            .bookmarks_by_member(member_id)
            .await
            .log_failure("list bookmarks of member", member_id)?)
    }

    pub async fn add(
        &self,
        identity: &Identity,
        new_bookmark: NewBookmark,
    ) -> LibraryResult<BookmarkData> {
        identity.require_owner_or_admin(&new_bookmark.member_id)?;

        self.db
            .member_by_id(&new_bookmark.member_id)
            .await
            .referenced("member")?;
        self.db
            .book_by_id(new_bookmark.book_id)
            .await
            .referenced("book")?;

        let bookmark = self
            .db
            .create_bookmark(new_bookmark)
            .await
            .log_failure("create", "a new bookmark")
            .referenced("member or book")?;

        info!(
            "Member {} bookmarked book {}",
            bookmark.member_id, bookmark.book_id
        );
        Ok(bookmark)
    }

    /// Points an existing bookmark at another book
    pub async fn update(
        &self,
        identity: &Identity,
        bookmark_id: PrimaryKey,
        updated: UpdatedBookmark,
    ) -> LibraryResult<BookmarkData> {
        if bookmark_id != updated.id {
            return Err(LibraryError::IdMismatch {
                path: bookmark_id,
                body: updated.id,
            });
        }

        let existing = self
            .db
            .bookmark_by_id(bookmark_id)
            .await
            .log_failure("update bookmark", bookmark_id)?;

        identity.require_owner_or_admin(&existing.member_id)?;

        self.db
            .book_by_id(updated.book_id)
            .await
            .referenced("book")?;

        let bookmark = self
            .db
            .update_bookmark(BookmarkData {
                book_id: updated.book_id,
                ..existing
            })
            .await
            .log_failure("update bookmark", bookmark_id)
            .referenced("book")?;

        info!("Bookmark {} updated", bookmark_id);
        Ok(bookmark)
    }

    pub async fn delete(&self, identity: &Identity, bookmark_id: PrimaryKey) -> LibraryResult<()> {
        let existing = self
            .db
            .bookmark_by_id(bookmark_id)
            .await
            .log_failure("delete bookmark", bookmark_id)?;

        identity.require_owner_or_admin(&existing.member_id)?;

        self.db
            .delete_bookmark(bookmark_id)
            .await
            .log_failure("delete bookmark", bookmark_id)?;

        info!("Bookmark {} deleted", bookmark_id);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{
        books::test::new_book, test::library_with_member, DatabaseError, Identity,
        LibraryError, NewBookmark, UpdatedBookmark,
    };

    #[tokio::test]
    async fn a_book_is_bookmarked_once() {
        let (library, member) = library_with_member("lauren").await;
        let book = library.books.add(new_book("Kindred")).await.unwrap();

        let bookmark = NewBookmark {
            member_id: member.id.clone(),
            book_id: book.id,
        };

        library
            .bookmarks
            .add(&member.identity(), bookmark.clone())
            .await
            .unwrap();

        assert!(matches!(
            library.bookmarks.add(&member.identity(), bookmark).await,
            Err(LibraryError::Db(DatabaseError::Conflict { .. }))
        ));
    }

    #[tokio::test]
    async fn simultaneous_adds_conflict_once() {
        let (library, member) = library_with_member("lauren").await;
        let book = library.books.add(new_book("Kindred")).await.unwrap();
        let identity = member.identity();

        let bookmark = NewBookmark {
            member_id: member.id.clone(),
            book_id: book.id,
        };

        let (first, second) = tokio::join!(
            library.bookmarks.add(&identity, bookmark.clone()),
            library.bookmarks.add(&identity, bookmark.clone())
        );

        let conflicts = [&first, &second]
            .iter()
            .filter(|r| matches!(r, Err(LibraryError::Db(DatabaseError::Conflict { .. }))))
            .count();

        assert!(first.is_ok() || second.is_ok());
        assert_eq!(conflicts, 1);
    }

    #[tokio::test]
    async fn list_by_member_is_scoped() {
        let (library, member) = library_with_member("lauren").await;
        let book = library.books.add(new_book("Kindred")).await.unwrap();

        let bookmark = library
            .bookmarks
            .add(
                &member.identity(),
                NewBookmark {
                    member_id: member.id.clone(),
                    book_id: book.id,
                },
            )
            .await
            .unwrap();

        assert_eq!(
            library.bookmarks.list_by_member(&member.id).await.unwrap(),
            vec![bookmark.clone()]
        );
        assert!(library
            .bookmarks
            .list_by_member("someone-else")
            .await
            .unwrap()
            .is_empty());
        assert_eq!(library.bookmarks.list().await.unwrap(), vec![bookmark]);
    }

    #[tokio::test]
    async fn ownership_is_enforced() {
        let (library, member) = library_with_member("lauren").await;
        let kindred = library.books.add(new_book("Kindred")).await.unwrap();
        let dawn = library.books.add(new_book("Dawn")).await.unwrap();
        let stranger = Identity::mock_member("someone-else");

        assert!(matches!(
            library
                .bookmarks
                .add(
                    &stranger,
                    NewBookmark {
                        member_id: member.id.clone(),
                        book_id: kindred.id,
                    },
                )
                .await,
            Err(LibraryError::Forbidden)
        ));

        let bookmark = library
            .bookmarks
            .add(
                &member.identity(),
                NewBookmark {
                    member_id: member.id.clone(),
                    book_id: kindred.id,
                },
            )
            .await
            .unwrap();

        let move_to_dawn = UpdatedBookmark {
            id: bookmark.id,
            book_id: dawn.id,
        };

        assert!(matches!(
            library
                .bookmarks
                .update(&stranger, bookmark.id, move_to_dawn.clone())
                .await,
            Err(LibraryError::Forbidden)
        ));
        assert!(matches!(
            library.bookmarks.delete(&stranger, bookmark.id).await,
            Err(LibraryError::Forbidden)
        ));

        let moved = library
            .bookmarks
            .update(&member.identity(), bookmark.id, move_to_dawn)
            .await
            .unwrap();
        assert_eq!(moved.book_id, dawn.id);
        assert_eq!(moved.member_id, member.id);

        library
            .bookmarks
            .delete(&member.identity(), bookmark.id)
            .await
            .unwrap();
        assert!(matches!(
            library.bookmarks.get_by_id(bookmark.id).await,
            Err(LibraryError::Db(DatabaseError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn mismatched_ids() {
        let (library, member) = library_with_member("lauren").await;

        let result = library
            .bookmarks
            .update(
                &member.identity(),
                1,
                UpdatedBookmark { id: 2, book_id: 1 },
            )
            .await;

        assert!(matches!(result, Err(LibraryError::IdMismatch { .. })));
    }
}
