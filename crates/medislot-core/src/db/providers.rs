//! Provider availability database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Provider, WeeklyAvailability};

impl Database {
    /// Insert or replace a provider and their weekly hours.
    pub fn upsert_provider(&self, provider: &Provider) -> DbResult<()> {
        let availability_json = provider.availability.to_json()?;

        self.conn.execute(
            r#"
            INSERT INTO providers (provider_id, name, availability)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(provider_id) DO UPDATE SET
                name = excluded.name,
                availability = excluded.availability,
                updated_at = datetime('now')
            "#,
            params![provider.provider_id, provider.name, availability_json],
        )?;
        Ok(())
    }

    /// Replace only the weekly hours of an existing provider.
    pub fn update_provider_availability(
        &self,
        provider_id: &str,
        availability: &WeeklyAvailability,
    ) -> DbResult<bool> {
        let availability_json = availability.to_json()?;
        let rows_affected = self.conn.execute(
            "UPDATE providers SET availability = ?2, updated_at = datetime('now') WHERE provider_id = ?1",
            params![provider_id, availability_json],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a provider by ID.
    pub fn get_provider(&self, provider_id: &str) -> DbResult<Option<Provider>> {
        self.conn
            .query_row(
                "SELECT provider_id, name, availability FROM providers WHERE provider_id = ?",
                [provider_id],
                |row| {
                    Ok(ProviderRow {
                        provider_id: row.get(0)?,
                        name: row.get(1)?,
                        availability: row.get(2)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get a provider's weekly hours.
    pub fn get_provider_availability(&self, provider_id: &str) -> DbResult<Option<WeeklyAvailability>> {
        Ok(self.get_provider(provider_id)?.map(|p| p.availability))
    }

    /// Get a provider or fail with `NotFound`.
    pub fn require_provider(&self, provider_id: &str) -> DbResult<Provider> {
        self.get_provider(provider_id)?
            .ok_or_else(|| DbError::NotFound(format!("provider {}", provider_id)))
    }

    /// List all providers, ordered by name.
    pub fn list_providers(&self) -> DbResult<Vec<Provider>> {
        let mut stmt = self
            .conn
            .prepare("SELECT provider_id, name, availability FROM providers ORDER BY name")?;

        let rows = stmt.query_map([], |row| {
            Ok(ProviderRow {
                provider_id: row.get(0)?,
                name: row.get(1)?,
                availability: row.get(2)?,
            })
        })?;

        rows.map(|r| r.map_err(DbError::from).and_then(Provider::try_from))
            .collect()
    }
}

/// Intermediate row struct for database mapping.
struct ProviderRow {
    provider_id: String,
    name: String,
    availability: String,
}

impl TryFrom<ProviderRow> for Provider {
    type Error = DbError;

    fn try_from(row: ProviderRow) -> Result<Self, Self::Error> {
        Ok(Provider {
            provider_id: row.provider_id,
            name: row.name,
            availability: WeeklyAvailability::from_json(&row.availability)?,
        })
    }
}
