use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::data::category_store::{
    CategoryPatch, CategoryStore, NewCategory, StoreError, UnitOfWork,
};
use crate::domain::category::{BookCategoryLink, Category};

const INSERT_CATEGORY_SQL: &str = r#"
    INSERT INTO categories (name, description, created_at, updated_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, name, description, created_at, updated_at
"#;

const FIND_CATEGORY_SQL: &str = r#"
    SELECT id, name, description, created_at, updated_at
    FROM categories
    WHERE id = $1
"#;

const UPDATE_CATEGORY_SQL: &str = r#"
    UPDATE categories
    SET name = $2,
        description = $3,
        updated_at = $4
    WHERE id = $1
    RETURNING id, name, description, created_at, updated_at
"#;

const DELETE_CATEGORY_SQL: &str = r#"
    DELETE FROM categories
    WHERE id = $1
"#;

const LIST_CATEGORIES_SQL: &str = r#"
    SELECT id, name, description, created_at, updated_at
    FROM categories
    ORDER BY updated_at DESC, id DESC
    LIMIT $1
    OFFSET $2
"#;

const COUNT_CATEGORIES_SQL: &str = r#"
    SELECT COUNT(*)
    FROM categories
"#;

const INSERT_LINK_SQL: &str = r#"
    INSERT INTO book_categories (book_id, category_id)
    VALUES ($1, $2)
    ON CONFLICT (book_id, category_id) DO NOTHING
"#;

const LIST_CATEGORIES_FOR_BOOK_SQL: &str = r#"
    SELECT c.id, c.name, c.description, c.created_at, c.updated_at
    FROM book_categories bc
    JOIN categories c ON c.id = bc.category_id
    WHERE bc.book_id = $1
    ORDER BY c.updated_at DESC, c.id DESC
"#;

#[derive(Debug, Clone)]
pub(crate) struct PostgresCategoryStore {
    pool: PgPool,
}

impl PostgresCategoryStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_store_error)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(map_store_error)
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl CategoryStore for PostgresCategoryStore {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, StoreError> {
        let tx = self.pool.begin().await.map_err(map_store_error)?;
        Ok(PgUnitOfWork { tx })
    }

    async fn insert_category(
        &self,
        tx: &mut PgUnitOfWork,
        input: NewCategory,
    ) -> Result<Category, StoreError> {
        let row = sqlx::query_as::<_, CategoryRow>(INSERT_CATEGORY_SQL)
            .bind(input.name)
            .bind(input.description)
            .bind(input.created_at)
            .bind(input.updated_at)
            .fetch_one(&mut *tx.tx)
            .await
            .map_err(map_store_error)?;

        map_row_to_category(row)
    }

    async fn find_category_by_id(
        &self,
        tx: &mut PgUnitOfWork,
        id: i64,
    ) -> Result<Category, StoreError> {
        let row = sqlx::query_as::<_, CategoryRow>(FIND_CATEGORY_SQL)
            .bind(id)
            .fetch_optional(&mut *tx.tx)
            .await
            .map_err(map_store_error)?
            .ok_or(StoreError::NotFound)?;

        map_row_to_category(row)
    }

    async fn update_category(
        &self,
        tx: &mut PgUnitOfWork,
        patch: CategoryPatch,
    ) -> Result<Category, StoreError> {
        let row = sqlx::query_as::<_, CategoryRow>(UPDATE_CATEGORY_SQL)
            .bind(patch.id)
            .bind(patch.name)
            .bind(patch.description)
            .bind(patch.updated_at)
            .fetch_optional(&mut *tx.tx)
            .await
            .map_err(map_store_error)?
            .ok_or(StoreError::NotFound)?;

        map_row_to_category(row)
    }

    async fn delete_category(&self, tx: &mut PgUnitOfWork, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query(DELETE_CATEGORY_SQL)
            .bind(id)
            .execute(&mut *tx.tx)
            .await
            .map_err(map_store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_categories(
        &self,
        tx: &mut PgUnitOfWork,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, CategoryRow>(LIST_CATEGORIES_SQL)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx.tx)
            .await
            .map_err(map_store_error)?;

        rows.into_iter().map(map_row_to_category).collect()
    }

    async fn count_categories(&self, tx: &mut PgUnitOfWork) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(COUNT_CATEGORIES_SQL)
            .fetch_one(&mut *tx.tx)
            .await
            .map_err(map_store_error)
    }

    async fn insert_book_category_link(
        &self,
        tx: &mut PgUnitOfWork,
        link: BookCategoryLink,
    ) -> Result<(), StoreError> {
        sqlx::query(INSERT_LINK_SQL)
            .bind(link.book_id)
            .bind(link.category_id)
            .execute(&mut *tx.tx)
            .await
            .map_err(map_store_error)?;

        Ok(())
    }

    async fn list_categories_for_book(
        &self,
        tx: &mut PgUnitOfWork,
        book_id: i64,
    ) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, CategoryRow>(LIST_CATEGORIES_FOR_BOOK_SQL)
            .bind(book_id)
            .fetch_all(&mut *tx.tx)
            .await
            .map_err(map_store_error)?;

        rows.into_iter().map(map_row_to_category).collect()
    }
}

fn map_row_to_category(row: CategoryRow) -> Result<Category, StoreError> {
    Category::new(
        row.id,
        row.name,
        row.description,
        row.created_at,
        row.updated_at,
    )
    .map_err(|err| StoreError::Statement(format!("corrupt category row: {err}")))
}

fn map_store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23503")
    {
        return StoreError::MissingReference(db_err.message().to_string());
    }
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::Statement(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sqlx::PgPool;

    use super::{LIST_CATEGORIES_FOR_BOOK_SQL, PostgresCategoryStore};
    use crate::data::category_store::{
        CategoryPatch, CategoryStore, NewCategory, StoreError, UnitOfWork,
    };
    use crate::domain::category::{BookCategoryLink, Category};

    #[test]
    fn book_listing_joins_on_category_id() {
        let sql = LIST_CATEGORIES_FOR_BOOK_SQL.to_lowercase();
        assert!(sql.contains("join categories c on c.id = bc.category_id"));
        assert!(sql.contains("where bc.book_id = $1"));
        assert!(!sql.contains("c.id = bc.book_id"));
    }

    async fn insert(store: &PostgresCategoryStore, name: &str) -> Category {
        let now = Utc::now();
        let mut tx = store.begin().await.expect("begin must succeed");
        let category = store
            .insert_category(
                &mut tx,
                NewCategory {
                    name: name.to_string(),
                    description: format!("{name} books"),
                    created_at: now,
                    updated_at: now,
                },
            )
            .await
            .expect("insert must succeed");
        tx.commit().await.expect("commit must succeed");
        category
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a Postgres server"]
    async fn book_listing_returns_linked_categories_only(pool: PgPool) {
        let store = PostgresCategoryStore::new(pool);
        let fiction = insert(&store, "Fiction").await;
        let history = insert(&store, "History").await;

        let mut tx = store.begin().await.expect("begin must succeed");
        store
            .insert_book_category_link(
                &mut tx,
                BookCategoryLink {
                    book_id: 42,
                    category_id: history.id,
                },
            )
            .await
            .expect("link must be inserted");
        // a book whose id equals an existing category id must not leak that category
        store
            .insert_book_category_link(
                &mut tx,
                BookCategoryLink {
                    book_id: fiction.id,
                    category_id: history.id,
                },
            )
            .await
            .expect("link must be inserted");
        tx.commit().await.expect("commit must succeed");

        let mut tx = store.begin().await.expect("begin must succeed");
        let linked = store
            .list_categories_for_book(&mut tx, 42)
            .await
            .expect("listing must succeed");
        assert_eq!(linked, vec![history.clone()]);

        let linked = store
            .list_categories_for_book(&mut tx, fiction.id)
            .await
            .expect("listing must succeed");
        assert_eq!(linked, vec![history]);
        tx.rollback().await.expect("rollback must succeed");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a Postgres server"]
    async fn duplicate_links_collapse_into_one_row(pool: PgPool) {
        let store = PostgresCategoryStore::new(pool);
        let history = insert(&store, "History").await;
        let link = BookCategoryLink {
            book_id: 7,
            category_id: history.id,
        };

        let mut tx = store.begin().await.expect("begin must succeed");
        store
            .insert_book_category_link(&mut tx, link)
            .await
            .expect("first insert must succeed");
        store
            .insert_book_category_link(&mut tx, link)
            .await
            .expect("duplicate insert must succeed");

        let linked = store
            .list_categories_for_book(&mut tx, 7)
            .await
            .expect("listing must succeed");
        assert_eq!(linked.len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a Postgres server"]
    async fn link_to_missing_category_is_a_missing_reference(pool: PgPool) {
        let store = PostgresCategoryStore::new(pool);

        let mut tx = store.begin().await.expect("begin must succeed");
        let err = store
            .insert_book_category_link(
                &mut tx,
                BookCategoryLink {
                    book_id: 1,
                    category_id: 404,
                },
            )
            .await
            .expect_err("foreign key must reject the link");
        assert!(matches!(err, StoreError::MissingReference(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a Postgres server"]
    async fn update_keeps_created_at(pool: PgPool) {
        let store = PostgresCategoryStore::new(pool);
        let created = insert(&store, "Poetry").await;

        let mut tx = store.begin().await.expect("begin must succeed");
        let updated = store
            .update_category(
                &mut tx,
                CategoryPatch {
                    id: created.id,
                    name: "Verse".to_string(),
                    description: String::new(),
                    updated_at: created.updated_at + Duration::seconds(5),
                },
            )
            .await
            .expect("update must succeed");
        tx.commit().await.expect("commit must succeed");

        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.name, "Verse");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a Postgres server"]
    async fn missing_rows_report_not_found(pool: PgPool) {
        let store = PostgresCategoryStore::new(pool);

        let mut tx = store.begin().await.expect("begin must succeed");
        let err = store
            .find_category_by_id(&mut tx, 99)
            .await
            .expect_err("row must be missing");
        assert!(matches!(err, StoreError::NotFound));

        let err = store
            .delete_category(&mut tx, 99)
            .await
            .expect_err("row must be missing");
        assert!(matches!(err, StoreError::NotFound));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a Postgres server"]
    async fn listing_pages_by_most_recent_update(pool: PgPool) {
        let store = PostgresCategoryStore::new(pool);
        let first = insert(&store, "First").await;
        let second = insert(&store, "Second").await;
        let third = insert(&store, "Third").await;

        let mut tx = store.begin().await.expect("begin must succeed");
        let page = store
            .list_categories(&mut tx, 2, 0)
            .await
            .expect("listing must succeed");
        assert_eq!(page, vec![third, second]);

        let page = store
            .list_categories(&mut tx, 2, 2)
            .await
            .expect("listing must succeed");
        assert_eq!(page, vec![first]);

        let total = store
            .count_categories(&mut tx)
            .await
            .expect("count must succeed");
        assert_eq!(total, 3);
    }
}
