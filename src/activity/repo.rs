use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{ActivityEntry, ActivityKind, ActivityUser, NewActivity};
use crate::error::StoreError;

/// Append-only event log.
#[async_trait]
pub trait ActivityRepo: Send + Sync {
    async fn insert(&self, event: NewActivity) -> Result<(), StoreError>;
    /// Most recent first, at most `limit`, joined with the subject user.
    async fn recent(&self, kind: ActivityKind, limit: i64) -> Result<Vec<ActivityEntry>, StoreError>;
}

pub struct PgActivityRepo {
    db: PgPool,
}

impl PgActivityRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: Uuid,
    #[sqlx(try_from = "String")]
    kind: ActivityKind,
    details: Json<serde_json::Value>,
    created_at: OffsetDateTime,
    user_id: Option<Uuid>,
    user_name: Option<String>,
    user_email: Option<String>,
}

impl From<ActivityRow> for ActivityEntry {
    fn from(r: ActivityRow) -> Self {
        let user = match (r.user_id, r.user_name, r.user_email) {
            (Some(id), Some(name), Some(email)) => Some(ActivityUser { id, name, email }),
            _ => None,
        };
        Self {
            id: r.id,
            kind: r.kind,
            details: r.details.0,
            created_at: r.created_at,
            user,
        }
    }
}

#[async_trait]
impl ActivityRepo for PgActivityRepo {
    async fn insert(&self, event: NewActivity) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO activities (id, user_id, kind, details)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.user_id)
        .bind(event.kind.as_str())
        .bind(Json(event.details))
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn recent(&self, kind: ActivityKind, limit: i64) -> Result<Vec<ActivityEntry>, StoreError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT a.id, a.kind, a.details, a.created_at,
                   u.id AS user_id, u.name AS user_name, u.email AS user_email
              FROM activities a
              LEFT JOIN users u ON u.id = a.user_id
             WHERE a.kind = $1
             ORDER BY a.created_at DESC
             LIMIT $2
            "#,
        )
        .bind(kind.as_str())
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(ActivityEntry::from).collect())
    }
}
