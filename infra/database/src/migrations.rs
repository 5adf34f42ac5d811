use crate::error::{DatabaseError, DatabaseErrorExt};
use fxhash::FxHashMap;
use sha2::{Digest, Sha256};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::types::SurrealValue;

/// A versioned `SurrealQL` script owned by a feature slice.
///
/// Scripts are applied once, in registration order, inside a transaction. The checksum of an
/// applied script is recorded so later edits to a shipped script are caught at startup.
#[derive(Debug, Clone)]
pub struct Migration {
    pub slice: &'static str,
    pub version: &'static str,
    pub script: &'static str,
    pub checksum: String,
}

impl Migration {
    #[must_use]
    pub fn new(slice: &'static str, version: &'static str, script: &'static str) -> Self {
        let checksum = hex::encode(Sha256::digest(script.as_bytes()));
        Self { slice, version, script, checksum }
    }

    fn key(&self) -> String {
        format!("{}:{}", self.slice, self.version)
    }
}

/// Outcome of a migration run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, SurrealValue)]
struct AppliedMigration {
    slice: String,
    version: String,
    checksum: String,
}

#[derive(Debug)]
pub(crate) struct MigrationRunner<'a> {
    db: &'a Surreal<Any>,
}

impl<'a> MigrationRunner<'a> {
    pub(crate) const fn new(db: &'a Surreal<Any>) -> Self {
        Self { db }
    }

    pub(crate) async fn run(&self, migrations: &[Migration]) -> Result<MigrationReport, DatabaseError> {
        ensure_unique_keys(migrations)?;

        let mut report = MigrationReport::default();
        let applied = self.applied_migrations().await?;

        for migration in migrations {
            if let Some(existing) = applied.get(&migration.key()) {
                ensure_checksum_match(migration, &existing.checksum)?;
                report.skipped.push(migration.key());
                continue;
            }

            self.apply(migration).await?;
            report.applied.push(migration.key());
        }

        Ok(report)
    }

    async fn applied_migrations(&self) -> Result<FxHashMap<String, AppliedMigration>, DatabaseError> {
        self.db
            .query("DEFINE TABLE IF NOT EXISTS migration SCHEMALESS;")
            .await
            .context("Bootstrapping migration table")?
            .check()
            .map_err(surrealdb::Error::from)?;

        let entries = self
            .db
            .query("SELECT slice, version, checksum FROM migration")
            .await
            .context("Loading applied migrations")?
            .take::<Vec<AppliedMigration>>(0)
            .context("Parsing applied migrations")?;

        Ok(entries
            .into_iter()
            .map(|entry| (format!("{}:{}", entry.slice, entry.version), entry))
            .collect())
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DatabaseError> {
        let query = format!(
            "BEGIN TRANSACTION;
            {}
            CREATE migration SET slice = $slice, version = $version, checksum = $checksum, applied_at = $applied_at;
            COMMIT TRANSACTION;",
            migration.script,
        );

        self.db
            .query(query)
            .bind(("slice", migration.slice.to_owned()))
            .bind(("version", migration.version.to_owned()))
            .bind(("checksum", migration.checksum.clone()))
            .bind(("applied_at", chrono::Utc::now().timestamp_millis()))
            .await
            .context(format!("SQL execution failed at {}", migration.key()))?
            .check()
            .map_err(surrealdb::Error::from)
            .context(format!("Migration {} rejected", migration.key()))?;

        Ok(())
    }
}

fn ensure_unique_keys(migrations: &[Migration]) -> Result<(), DatabaseError> {
    let mut seen = FxHashMap::default();
    for migration in migrations {
        if seen.insert(migration.key(), ()).is_some() {
            return Err(DatabaseError::Migration {
                message: format!("Duplicate migration {}", migration.key()).into(),
                context: Some("Validating migration set".into()),
            });
        }
    }
    Ok(())
}

fn ensure_checksum_match(migration: &Migration, existing: &str) -> Result<(), DatabaseError> {
    if existing != migration.checksum {
        return Err(DatabaseError::Migration {
            message: format!(
                "Checksum mismatch for {} (recorded {}, shipped {})",
                migration.key(),
                existing,
                migration.checksum
            )
            .into(),
            context: Some("Migration already applied with different checksum".into()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_stable_and_content_sensitive() {
        let a = Migration::new("courses", "0001", "DEFINE TABLE course SCHEMAFULL;");
        let b = Migration::new("courses", "0001", "DEFINE TABLE course SCHEMAFULL;");
        let c = Migration::new("courses", "0001", "DEFINE TABLE course SCHEMALESS;");
        assert_eq!(a.checksum, b.checksum);
        assert_ne!(a.checksum, c.checksum);
        assert_eq!(a.checksum.len(), 64);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let set = [
            Migration::new("courses", "0001", "a"),
            Migration::new("courses", "0001", "b"),
        ];
        assert!(matches!(ensure_unique_keys(&set), Err(DatabaseError::Migration { .. })));
    }

    #[test]
    fn checksum_mismatch_is_reported() {
        let migration = Migration::new("identity", "0001", "DEFINE TABLE account;");
        assert!(ensure_checksum_match(&migration, &migration.checksum).is_ok());
        assert!(ensure_checksum_match(&migration, "deadbeef").is_err());
    }
}
