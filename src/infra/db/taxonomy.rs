use async_trait::async_trait;

use crate::application::repos::{CategoriesRepo, RepoError, TagsRepo};
use crate::domain::entities::{CategoryRecord, CategoryWithCount, TagRecord};

use super::PostgresRepositories;
use super::util::{convert_count, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct NamedRow {
    id: i64,
    name: String,
}

impl From<NamedRow> for CategoryRecord {
    fn from(row: NamedRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

impl From<NamedRow> for TagRecord {
    fn from(row: NamedRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[async_trait]
impl CategoriesRepo for PostgresRepositories {
    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, NamedRow>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(CategoryRecord::from))
    }

    async fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>, RepoError> {
        #[derive(sqlx::FromRow)]
        struct CountRow {
            id: i64,
            name: String,
            post_count: i64,
        }

        let rows = sqlx::query_as::<_, CountRow>(
            "SELECT c.id, c.name, COUNT(p.id) AS post_count \
             FROM categories c \
             LEFT JOIN posts p ON p.category_id = c.id \
             GROUP BY c.id, c.name \
             HAVING COUNT(p.id) > 0 \
             ORDER BY LOWER(c.name), c.id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(CategoryWithCount {
                    id: row.id,
                    name: row.name,
                    post_count: convert_count(row.post_count)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl TagsRepo for PostgresRepositories {
    async fn find_tag(&self, id: i64) -> Result<Option<TagRecord>, RepoError> {
        let row = sqlx::query_as::<_, NamedRow>("SELECT id, name FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(TagRecord::from))
    }

    async fn list_all(&self) -> Result<Vec<TagRecord>, RepoError> {
        let rows = sqlx::query_as::<_, NamedRow>("SELECT id, name FROM tags ORDER BY LOWER(name), id")
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    async fn list_for_posts(&self, post_ids: &[i64]) -> Result<Vec<(i64, TagRecord)>, RepoError> {
        #[derive(sqlx::FromRow)]
        struct PostTagRow {
            post_id: i64,
            id: i64,
            name: String,
        }

        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PostTagRow>(
            "SELECT pt.post_id, t.id, t.name \
             FROM post_tags pt \
             INNER JOIN tags t ON t.id = pt.tag_id \
             WHERE pt.post_id = ANY($1) \
             ORDER BY pt.post_id, LOWER(t.name), t.id",
        )
        .bind(post_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.post_id,
                    TagRecord {
                        id: row.id,
                        name: row.name,
                    },
                )
            })
            .collect())
    }
}
