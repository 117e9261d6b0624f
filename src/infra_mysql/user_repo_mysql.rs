use super::util::repo_error;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_user(row: MySqlRow) -> Result<User, RepoError> {
        Ok(User {
            id: row.try_get("id").map_err(repo_error)?,
            name: row.try_get("name").map_err(repo_error)?,
            email: row.try_get("email").map_err(repo_error)?,
            created_at: row.try_get("created_at").map_err(repo_error)?,
        })
    }

    fn row_to_credentials(row: MySqlRow) -> Result<UserCredentialsRecord, RepoError> {
        Ok(UserCredentialsRecord {
            user_id: row.try_get("id").map_err(repo_error)?,
            email: row.try_get("email").map_err(repo_error)?,
            password_hash: row.try_get("password_hash").map_err(repo_error)?,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let result = sqlx::query(
            r#"
INSERT INTO users (name, email, password_hash)
VALUES (?, ?, ?)
"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(repo_error)?;

        let user_id = UserId(result.last_insert_id());
        self.get_by_id(user_id)
            .await?
            .ok_or_else(|| RepoError::Store(format!("user {} vanished after insert", user_id)))
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>, RepoError> {
        let row_opt: Option<MySqlRow> =
            sqlx::query("SELECT id, name, email, created_at FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(repo_error)?;

        row_opt.map(Self::row_to_user).transpose()
    }

    async fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentialsRecord>, RepoError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, email, password_hash
FROM users
WHERE email = ?
"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(repo_error)?;

        row_opt.map(Self::row_to_credentials).transpose()
    }
}
