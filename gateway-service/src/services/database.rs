//! PostgreSQL-backed stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::{postgres::PgPool, types::Json, FromRow};
use uuid::Uuid;

use super::audit::AuditSink;
use super::directory::UserDirectory;
use super::error::StoreError;
use super::facilities::FacilityStore;
use super::sessions::SessionStore;
use crate::models::{
    Facility, FacilityFilter, FacilityIds, NewFacility, NewUser, SessionRecord, SessionSnapshot,
    SignInRejection, User, UserUpdate,
};

const USER_COLUMNS: &str = "user_id, email, display_name, avatar_url, role_code, title, expertise, \
     department, facility_ids, is_active, created_utc, updated_utc";

#[derive(Debug, FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    role_code: String,
    title: String,
    expertise: String,
    department: String,
    facility_ids: Vec<String>,
    is_active: bool,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role_code
            .parse()
            .map_err(|e: String| StoreError::Unavailable(anyhow::anyhow!(e)))?;
        Ok(User {
            user_id: row.user_id,
            email: row.email,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            role,
            title: row.title,
            expertise: row.expertise,
            department: row.department,
            facility_ids: FacilityIds::from(row.facility_ids),
            is_active: row.is_active,
            created_utc: row.created_utc,
            updated_utc: row.updated_utc,
        })
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    session_id: Uuid,
    token_hash_text: String,
    snapshot: Json<SessionSnapshot>,
    created_utc: DateTime<Utc>,
    expiry_utc: DateTime<Utc>,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        SessionRecord {
            session_id: row.session_id,
            token_hash_text: row.token_hash_text,
            snapshot: row.snapshot.0,
            created_utc: row.created_utc,
            expiry_utc: row.expiry_utc,
        }
    }
}

#[derive(Debug, FromRow)]
struct FacilityRow {
    facility_id: String,
    name: String,
    location: String,
    capacity_mwh: f64,
    status: String,
    client_id: Option<String>,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl From<FacilityRow> for Facility {
    fn from(row: FacilityRow) -> Self {
        Facility {
            id: row.facility_id,
            name: row.name,
            location: row.location,
            capacity: row.capacity_mwh,
            status: row.status,
            client_id: row.client_id,
            created_at: row.created_utc,
            updated_at: row.updated_utc,
        }
    }
}

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for Database {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = User::from_new(new_user);
        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, display_name, avatar_url, role_code, title, expertise,
                               department, facility_ids, is_active, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(user.role.as_str())
        .bind(&user.title)
        .bind(&user.expertise)
        .bind(&user.department)
        .bind(user.facility_ids.to_vec())
        .bind(user.is_active)
        .bind(user.created_utc)
        .bind(user.updated_utc)
        .execute(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update(&self, user_id: Uuid, update: UserUpdate) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET role_code = COALESCE($2, role_code),
                   is_active = COALESCE($3, is_active),
                   facility_ids = COALESCE($4, facility_ids),
                   updated_utc = $5
             WHERE user_id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(update.role.map(|r| r.as_str()))
        .bind(update.is_active)
        .bind(update.facility_ids.map(|ids| ids.to_vec()))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn insert(&self, record: SessionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, token_hash_text, user_id, snapshot, created_utc, expiry_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.session_id)
        .bind(&record.token_hash_text)
        .bind(record.snapshot.user_id)
        .bind(Json(&record.snapshot))
        .bind(record.created_utc)
        .bind(record.expiry_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, token_hash: &str) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT session_id, token_hash_text, snapshot, created_utc, expiry_utc \
             FROM sessions WHERE token_hash_text = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SessionRecord::from))
    }

    async fn delete(&self, token_hash: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash_text = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FacilityStore for Database {
    async fn list(&self, filter: &FacilityFilter) -> Result<Vec<Facility>, StoreError> {
        const SELECT: &str = "SELECT facility_id, name, location, capacity_mwh, status, client_id, \
             created_utc, updated_utc FROM facilities";

        let query = match filter {
            FacilityFilter::All => {
                sqlx::query_as::<_, FacilityRow>(&format!("{SELECT} ORDER BY created_utc DESC"))
                    .fetch_all(&self.pool)
                    .await
            }
            FacilityFilter::Status(status) => {
                sqlx::query_as::<_, FacilityRow>(&format!(
                    "{SELECT} WHERE status = $1 ORDER BY created_utc DESC"
                ))
                .bind(status)
                .fetch_all(&self.pool)
                .await
            }
            FacilityFilter::Ids(ids) => {
                sqlx::query_as::<_, FacilityRow>(&format!(
                    "{SELECT} WHERE facility_id = ANY($1) ORDER BY created_utc DESC"
                ))
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await
            }
        };

        Ok(query?.into_iter().map(Facility::from).collect())
    }

    async fn create(&self, new_facility: NewFacility) -> Result<Facility, StoreError> {
        let facility = Facility::from_new(new_facility);
        sqlx::query(
            r#"
            INSERT INTO facilities (facility_id, name, location, capacity_mwh, status, client_id, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&facility.id)
        .bind(&facility.name)
        .bind(&facility.location)
        .bind(facility.capacity)
        .bind(&facility.status)
        .bind(&facility.client_id)
        .bind(facility.created_at)
        .bind(facility.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(facility)
    }
}

#[async_trait]
impl AuditSink for Database {
    async fn record_rejection(&self, rejection: &SignInRejection) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sign_in_rejections (rejection_id, email, provider, reason_code, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(rejection.rejection_id)
        .bind(&rejection.email)
        .bind(&rejection.provider)
        .bind(rejection.reason.as_str())
        .bind(rejection.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
