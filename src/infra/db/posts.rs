use async_trait::async_trait;
use chrono_tz::Tz;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::pagination::PageWindow;
use crate::application::repos::{PostFilter, PostSlice, PostsRepo, RepoError};
use crate::domain::entities::{CategoryRecord, MonthCount, PostRecord};

use super::PostgresRepositories;
use super::util::{convert_count, escape_like, map_sqlx_error, to_i64};

const POST_COLUMNS: &str = "SELECT p.id, p.title, p.body_markdown, p.excerpt, p.created_at, \
     p.modified_at, p.views, c.id AS category_id, c.name AS category_name \
     FROM posts p INNER JOIN categories c ON c.id = p.category_id WHERE 1=1 ";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    body_markdown: String,
    excerpt: String,
    created_at: OffsetDateTime,
    modified_at: OffsetDateTime,
    views: i64,
    category_id: i64,
    category_name: String,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            body_markdown: row.body_markdown,
            excerpt: row.excerpt,
            created_at: row.created_at,
            modified_at: row.modified_at,
            views: row.views,
            category: CategoryRecord {
                id: row.category_id,
                name: row.category_name,
            },
        }
    }
}

impl PostgresRepositories {
    fn apply_post_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
        match filter {
            PostFilter::All => {}
            PostFilter::Archive(range) => {
                qb.push(" AND p.created_at >= ");
                qb.push_bind(range.start);
                if let Some(end) = range.end {
                    qb.push(" AND p.created_at < ");
                    qb.push_bind(end);
                }
            }
            PostFilter::Category(id) => {
                qb.push(" AND p.category_id = ");
                qb.push_bind(*id);
            }
            PostFilter::Tag(id) => {
                qb.push(" AND EXISTS (SELECT 1 FROM post_tags pt WHERE pt.post_id = p.id AND pt.tag_id = ");
                qb.push_bind(*id);
                qb.push(")");
            }
            PostFilter::Search(key) => {
                let pattern = format!("%{}%", escape_like(key));
                qb.push(" AND (p.title ILIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\' OR p.body_markdown ILIKE ");
                qb.push_bind(pattern);
                qb.push(" ESCAPE '\\')");
            }
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        filter: &PostFilter,
        window: Option<PageWindow>,
    ) -> Result<PostSlice, RepoError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1 ");
        Self::apply_post_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut qb = QueryBuilder::new(POST_COLUMNS);
        Self::apply_post_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC");
        if let Some(window) = window {
            qb.push(" LIMIT ");
            qb.push_bind(to_i64(window.limit));
            qb.push(" OFFSET ");
            qb.push_bind(to_i64(window.offset));
        }

        let rows: Vec<PostRow> = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostSlice {
            items: rows.into_iter().map(PostRecord::from).collect(),
            total: convert_count(total)?,
        })
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new(POST_COLUMNS);
        qb.push(" AND p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn increment_views(&self, id: i64) -> Result<i64, RepoError> {
        let views: Option<i64> =
            sqlx::query_scalar("UPDATE posts SET views = views + 1 WHERE id = $1 RETURNING views")
                .bind(id)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        views.ok_or(RepoError::NotFound)
    }

    async fn list_month_counts(&self, tz: Tz) -> Result<Vec<MonthCount>, RepoError> {
        #[derive(sqlx::FromRow)]
        struct MonthRow {
            year: i32,
            month: i32,
            count: i64,
        }

        let rows: Vec<MonthRow> = sqlx::query_as::<_, MonthRow>(
            "SELECT EXTRACT(YEAR FROM created_at AT TIME ZONE $1)::INT4 AS year, \
                    EXTRACT(MONTH FROM created_at AT TIME ZONE $1)::INT4 AS month, \
                    COUNT(*) AS count \
             FROM posts \
             GROUP BY 1, 2 \
             ORDER BY 1 DESC, 2 DESC",
        )
        .bind(tz.name())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(MonthCount {
                    year: row.year,
                    month: u32::try_from(row.month)
                        .map_err(|_| RepoError::from_persistence("month out of range"))?,
                    count: convert_count(row.count)?,
                })
            })
            .collect()
    }
}
