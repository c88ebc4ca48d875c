use chrono::Utc;
use tracing::{error, warn};

use crate::data::category_store::{
    CategoryPatch, CategoryStore, NewCategory, StoreError, UnitOfWork,
};
use crate::domain::category::{BookCategoryLink, Category, CategoryRequest, validate_positive_id};
use crate::domain::error::DomainError;
use crate::domain::pagination::Pagination;

#[derive(Debug, Clone)]
pub(crate) struct CategoryPage {
    pub(crate) categories: Vec<Category>,
    pub(crate) pagination: Pagination,
}

/// Owns the transaction boundaries: every public method opens exactly one unit of
/// work, commits it when all store calls succeeded and rolls it back otherwise.
pub(crate) struct CategoryService<S: CategoryStore> {
    store: S,
}

impl<S: CategoryStore> CategoryService<S> {
    pub(crate) fn new(store: S) -> Self {
        Self { store }
    }

    pub(crate) async fn create_category(
        &self,
        req: CategoryRequest,
    ) -> Result<Category, DomainError> {
        let req = req.validate()?;
        let now = Utc::now();
        let input = NewCategory {
            name: req.name,
            description: req.description,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.begin().await?;
        let result = self.store.insert_category(&mut tx, input).await;
        finish(tx, result)
            .await
            .map_err(|err| persistence("failed to create category", err))
    }

    pub(crate) async fn get_category_detail(&self, id: i64) -> Result<Category, DomainError> {
        validate_positive_id("id", id)?;

        let mut tx = self.begin().await?;
        let result = self.store.find_category_by_id(&mut tx, id).await;
        finish(tx, result).await.map_err(|err| match err {
            StoreError::NotFound => category_not_found(id),
            other => persistence("failed to fetch category", other),
        })
    }

    pub(crate) async fn update_category(
        &self,
        id: i64,
        req: CategoryRequest,
    ) -> Result<Category, DomainError> {
        validate_positive_id("id", id)?;
        let req = req.validate()?;
        let patch = CategoryPatch {
            id,
            name: req.name,
            description: req.description,
            updated_at: Utc::now(),
        };

        let mut tx = self.begin().await?;
        let result = self.store.update_category(&mut tx, patch).await;
        finish(tx, result).await.map_err(|err| match err {
            StoreError::NotFound => category_not_found(id),
            other => persistence("failed to update category", other),
        })
    }

    pub(crate) async fn delete_category(&self, id: i64) -> Result<(), DomainError> {
        validate_positive_id("id", id)?;

        let mut tx = self.begin().await?;
        let result = self.store.delete_category(&mut tx, id).await;
        finish(tx, result).await.map_err(|err| match err {
            StoreError::NotFound => category_not_found(id),
            other => persistence("failed to delete category", other),
        })
    }

    pub(crate) async fn list_categories(
        &self,
        pagination: Pagination,
    ) -> Result<CategoryPage, DomainError> {
        let pagination = pagination.recomputed();

        let mut tx = self.begin().await?;
        let result = async {
            let categories = self
                .store
                .list_categories(&mut tx, pagination.page_size, pagination.offset)
                .await?;
            let total = self.store.count_categories(&mut tx).await?;
            Ok::<_, StoreError>((categories, total))
        }
        .await;

        let (categories, total) = finish(tx, result)
            .await
            .map_err(|err| persistence("failed to fetch categories", err))?;

        Ok(CategoryPage {
            categories,
            pagination: pagination.with_total(total),
        })
    }

    pub(crate) async fn add_book_category_link(
        &self,
        link: BookCategoryLink,
    ) -> Result<BookCategoryLink, DomainError> {
        let link = link.validate()?;

        let mut tx = self.begin().await?;
        let result = self.store.insert_book_category_link(&mut tx, link).await;
        finish(tx, result).await.map_err(|err| match err {
            StoreError::MissingReference(_) => category_not_found(link.category_id),
            other => persistence("failed to link book to category", other),
        })?;

        Ok(link)
    }

    pub(crate) async fn list_categories_for_book(
        &self,
        book_id: i64,
    ) -> Result<Vec<Category>, DomainError> {
        validate_positive_id("book_id", book_id)?;

        let mut tx = self.begin().await?;
        let result = self.store.list_categories_for_book(&mut tx, book_id).await;
        finish(tx, result)
            .await
            .map_err(|err| persistence("failed to fetch categories of book", err))
    }

    async fn begin(&self) -> Result<S::Tx, DomainError> {
        self.store
            .begin()
            .await
            .map_err(|err| persistence("failed to open unit of work", err))
    }
}

/// Closes the unit of work according to the outcome of the store calls made in it.
///
/// A unit of work that is dropped without reaching this point (panic, cancelled
/// request) is rolled back by the store's own drop handling.
async fn finish<Tx, T>(tx: Tx, result: Result<T, StoreError>) -> Result<T, StoreError>
where
    Tx: UnitOfWork,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "store call failed, rolling back unit of work");
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "failed to roll back unit of work");
            }
            Err(err)
        }
    }
}

fn category_not_found(id: i64) -> DomainError {
    DomainError::NotFound(format!("category id: {id}"))
}

fn persistence(action: &str, err: StoreError) -> DomainError {
    DomainError::Persistence(format!("{action}: {err}"))
}
