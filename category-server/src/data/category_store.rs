use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::category::{BookCategoryLink, Category};

/// Unclassified store failure. The service layer decides what it means for the caller.
#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("no rows matched")]
    NotFound,

    #[error("referenced row is missing: {0}")]
    MissingReference(String),

    #[error("{0}")]
    Statement(String),
}

#[derive(Debug, Clone)]
pub(crate) struct NewCategory {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

/// Update payload. There is no `created_at` here: updates never touch that column.
#[derive(Debug, Clone)]
pub(crate) struct CategoryPatch {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) updated_at: DateTime<Utc>,
}

#[async_trait]
pub(crate) trait UnitOfWork: Send {
    async fn commit(self) -> Result<(), StoreError>;
    async fn rollback(self) -> Result<(), StoreError>;
}

/// Relational operations over categories and book links.
///
/// Every statement runs inside the unit of work handed in by the caller; the
/// store only knows how to open one (`begin`) and never commits on its own.
#[async_trait]
pub(crate) trait CategoryStore: Send + Sync {
    type Tx: UnitOfWork;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    async fn insert_category(
        &self,
        tx: &mut Self::Tx,
        input: NewCategory,
    ) -> Result<Category, StoreError>;

    async fn find_category_by_id(
        &self,
        tx: &mut Self::Tx,
        id: i64,
    ) -> Result<Category, StoreError>;

    async fn update_category(
        &self,
        tx: &mut Self::Tx,
        patch: CategoryPatch,
    ) -> Result<Category, StoreError>;

    async fn delete_category(&self, tx: &mut Self::Tx, id: i64) -> Result<(), StoreError>;

    /// Page of categories, most recently updated first.
    async fn list_categories(
        &self,
        tx: &mut Self::Tx,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, StoreError>;

    async fn count_categories(&self, tx: &mut Self::Tx) -> Result<i64, StoreError>;

    async fn insert_book_category_link(
        &self,
        tx: &mut Self::Tx,
        link: BookCategoryLink,
    ) -> Result<(), StoreError>;

    async fn list_categories_for_book(
        &self,
        tx: &mut Self::Tx,
        book_id: i64,
    ) -> Result<Vec<Category>, StoreError>;
}
