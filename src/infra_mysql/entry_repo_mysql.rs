use super::util::repo_error;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};

const ENTRY_COLUMNS: &str = "id, owner_id, title, description, created_at, updated_at";

pub struct MySqlEntryRepo {
    pool: MySqlPool,
}

impl MySqlEntryRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlEntryRepo { pool }
    }

    fn row_to_entry(row: MySqlRow) -> Result<Entry, RepoError> {
        Ok(Entry {
            id: row.try_get("id").map_err(repo_error)?,
            owner_id: row.try_get("owner_id").map_err(repo_error)?,
            title: row.try_get("title").map_err(repo_error)?,
            description: row.try_get("description").map_err(repo_error)?,
            created_at: row.try_get("created_at").map_err(repo_error)?,
            updated_at: row.try_get("updated_at").map_err(repo_error)?,
        })
    }
}

#[async_trait::async_trait]
impl EntryRepo for MySqlEntryRepo {
    async fn insert(&self, entry: NewEntry) -> Result<Entry, RepoError> {
        let result = sqlx::query(
            r#"
INSERT INTO entries (owner_id, title, description)
VALUES (?, ?, ?)
"#,
        )
        .bind(entry.owner_id)
        .bind(&entry.title)
        .bind(&entry.description)
        .execute(&self.pool)
        .await
        .map_err(repo_error)?;

        let entry_id = EntryId(result.last_insert_id());
        self.get(entry_id)
            .await?
            .ok_or_else(|| RepoError::Store(format!("entry {} vanished after insert", entry_id)))
    }

    async fn get(&self, entry_id: EntryId) -> Result<Option<Entry>, RepoError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, owner_id, title, description, created_at, updated_at
FROM entries
WHERE id = ?
"#,
        )
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(repo_error)?;

        row_opt.map(Self::row_to_entry).transpose()
    }

    async fn list_by_owner(
        &self,
        owner_id: UserId,
        query: &EntryQuery,
    ) -> Result<Vec<Entry>, RepoError> {
        let mut qb = QueryBuilder::<MySql>::new(format!(
            "SELECT {} FROM entries WHERE owner_id = ",
            ENTRY_COLUMNS
        ));
        qb.push_bind(owner_id);
        if let Some(year) = query.year_from {
            qb.push(" AND YEAR(created_at) >= ").push_bind(year);
        }
        if let Some(year) = query.year_to {
            qb.push(" AND YEAR(created_at) <= ").push_bind(year);
        }
        qb.push(match query.sort {
            SortOrder::Asc => " ORDER BY created_at ASC, id ASC",
            SortOrder::Desc => " ORDER BY created_at DESC, id DESC",
        });
        qb.push(" LIMIT ")
            .push_bind(u64::from(query.page_size.0))
            .push(" OFFSET ")
            .push_bind(query.offset());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(repo_error)?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }

    async fn update(
        &self,
        entry_id: EntryId,
        title: &str,
        description: &str,
    ) -> Result<Option<Entry>, RepoError> {
        // rows_affected is 0 for a no-op update, so re-read instead.
        sqlx::query(
            r#"
UPDATE entries
SET title = ?, description = ?, updated_at = CURRENT_TIMESTAMP(6)
WHERE id = ?
"#,
        )
        .bind(title)
        .bind(description)
        .bind(entry_id)
        .execute(&self.pool)
        .await
        .map_err(repo_error)?;

        self.get(entry_id).await
    }

    async fn delete(&self, entry_id: EntryId) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM entries WHERE id = ?")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(result.rows_affected())
    }
}
