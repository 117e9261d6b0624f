use super::{PageSize, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub id: EntryId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Owner-scoped listing parameters. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct EntryQuery {
    pub page_size: PageSize,
    pub page: u32,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub sort: SortOrder,
}

impl EntryQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size.0)
    }
}

impl Default for EntryQuery {
    fn default() -> Self {
        EntryQuery {
            page_size: PageSize::DEFAULT,
            page: 1,
            year_from: None,
            year_to: None,
            sort: SortOrder::Desc,
        }
    }
}
