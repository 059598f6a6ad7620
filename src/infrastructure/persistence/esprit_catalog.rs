use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{column, decode_element, map_sqlx_error};
use crate::application::ports::outbound::{EspritCatalogPort, RepositoryError};
use crate::domain::entities::EspritBase;
use crate::domain::value_objects::EspritBaseId;

const BASE_COLUMNS: &str = "id, name, element, base_tier, base_atk, base_def, base_hp, description";

/// Species reference data in the `esprit_bases` table
pub struct SqliteEspritCatalog {
    pool: SqlitePool,
}

impl SqliteEspritCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EspritCatalogPort for SqliteEspritCatalog {
    async fn find_by_name(&self, name: &str) -> Result<Option<EspritBase>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM esprit_bases WHERE name = ? COLLATE NOCASE",
            BASE_COLUMNS
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(base_from_row).transpose()
    }

    async fn get(&self, id: EspritBaseId) -> Result<Option<EspritBase>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM esprit_bases WHERE id = ?", BASE_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(base_from_row).transpose()
    }

    async fn list_by_tiers(&self, tiers: &[u32]) -> Result<Vec<EspritBase>, RepositoryError> {
        if tiers.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM esprit_bases WHERE base_tier IN (",
            BASE_COLUMNS
        ));
        let mut separated = query.separated(", ");
        for tier in tiers {
            separated.push_bind(*tier);
        }
        separated.push_unseparated(") ORDER BY name");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(base_from_row).collect()
    }

    async fn insert(&self, base: &EspritBase) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO esprit_bases (id, name, element, base_tier, base_atk, base_def, base_hp, description)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(base.id.to_string())
        .bind(&base.name)
        .bind(base.element.as_str())
        .bind(base.base_tier)
        .bind(base.base_atk)
        .bind(base.base_def)
        .bind(base.base_hp)
        .bind(&base.description)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

fn base_from_row(row: &SqliteRow) -> Result<EspritBase, RepositoryError> {
    let id: String = column(row, "id")?;
    let element: String = column(row, "element")?;

    Ok(EspritBase {
        id: EspritBaseId::parse(&id)
            .map_err(|e| RepositoryError::Database(format!("Invalid id '{}': {}", id, e)))?,
        name: column(row, "name")?,
        element: decode_element(&element)?,
        base_tier: column(row, "base_tier")?,
        base_atk: column(row, "base_atk")?,
        base_def: column(row, "base_def")?,
        base_hp: column(row, "base_hp")?,
        description: column(row, "description")?,
    })
}
