use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::entities::PostRecord;
use crate::util::timezone;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostListQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Page-number envelope: `next`/`previous` are relative links or `null`.
#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<PostSummary>,
}

#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    /// RFC 3339 in the site timezone.
    pub created_time: String,
    pub excerpt: String,
    pub category: CategorySummary,
    pub views: i64,
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
}

impl PostSummary {
    pub fn from_record(record: PostRecord, tz: Tz) -> Self {
        Self {
            id: record.id,
            title: record.title,
            created_time: timezone::localized_datetime(record.created_at, tz).to_rfc3339(),
            excerpt: record.excerpt,
            category: CategorySummary {
                id: record.category.id,
                name: record.category.name,
            },
            views: record.views,
        }
    }
}
