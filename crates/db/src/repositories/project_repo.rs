//! Repository for the `projects` table.

use sqlx::PgPool;
use vendorlink_core::types::DbId;

use crate::models::project::Project;

const COLUMNS: &str = "id, user_id, name, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project for `user_id`, returning the created row.
    ///
    /// A case-insensitive duplicate name violates `uq_projects_user_name`.
    pub async fn create(pool: &PgPool, user_id: DbId, name: &str) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (user_id, name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .bind(name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user's project by name, ignoring case.
    pub async fn find_by_name(
        pool: &PgPool,
        user_id: DbId,
        name: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE user_id = $1 AND LOWER(name) = LOWER($2)"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .bind(name.trim())
            .fetch_optional(pool)
            .await
    }

    /// List a user's projects, oldest first.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE user_id = $1 ORDER BY id");
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
