//! Repository for the `projects` and `items` catalog tables (read-only).

use sqlx::PgPool;

use concord_core::types::DbId;

use crate::models::project::{Item, ItemRaterCount, Project};

/// Column list for projects queries.
const PROJECT_COLUMNS: &str = "id, name, created_at";

/// Column list for items queries.
const ITEM_COLUMNS: &str = "id, project_id, page_number, content, created_at";

/// Read operations for the item/project catalog.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Find a project by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all projects, ordered by ID ascending.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id ASC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// List a project's items, ordered by page number then ID.
    pub async fn list_items(pool: &PgPool, project_id: DbId) -> Result<Vec<Item>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE project_id = $1
             ORDER BY page_number ASC, id ASC"
        );
        sqlx::query_as::<_, Item>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Find an item by its ID.
    pub async fn find_item(pool: &PgPool, item_id: DbId) -> Result<Option<Item>, sqlx::Error> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");
        sqlx::query_as::<_, Item>(&query)
            .bind(item_id)
            .fetch_optional(pool)
            .await
    }

    /// Count, per item of the project, the distinct annotators holding a
    /// completed round-0 version. Feeds the initial-round eligibility check:
    /// every item needs at least two.
    pub async fn qualified_rater_counts(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ItemRaterCount>, sqlx::Error> {
        sqlx::query_as::<_, ItemRaterCount>(
            "SELECT i.id AS item_id,
                    COUNT(DISTINCT av.annotator_id)
                        FILTER (WHERE av.round = 0 AND av.status = 'completed')
                        AS qualified_raters
             FROM items i
             LEFT JOIN annotation_versions av ON av.item_id = i.id
             WHERE i.project_id = $1
             GROUP BY i.id
             ORDER BY i.id",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
