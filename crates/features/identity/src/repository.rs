use crate::error::IdentityError;
use crate::model::Profile;
use rollcall_database::{Database, DatabaseErrorExt};
use rollcall_domain::roles::{Role, RoleSet};
use surrealdb::types::SurrealValue;
use tracing::warn;

const PROFILE_FIELDS: &str = "user_id, email, full_name, created_at, updated_at";

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct AccountRow {
    pub user_id: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug)]
pub(crate) struct NewAccount {
    pub user_id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub now: i64,
}

/// `SurrealDB` access for `account`, `profile` and `user_role`.
#[derive(Debug, Clone)]
pub(crate) struct IdentityRepository {
    db: Database,
}

impl IdentityRepository {
    pub(crate) const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates account, profile and first role in one transaction.
    pub(crate) async fn create_account(&self, account: NewAccount) -> Result<Profile, IdentityError> {
        let db = &self.db;
        let new = &account;
        let result = db
            .retry_conflicts(move || async move {
                db.query(
                    "BEGIN TRANSACTION;
                    CREATE account SET user_id = $user_id, email = $email, password_hash = $password_hash, created_at = $now;
                    CREATE profile SET user_id = $user_id, email = $email, full_name = $full_name, created_at = $now, updated_at = $now;
                    CREATE user_role SET user_id = $user_id, role = $role, granted_at = $now;
                    COMMIT TRANSACTION;",
                )
                .bind(("user_id", new.user_id.clone()))
                .bind(("email", new.email.clone()))
                .bind(("password_hash", new.password_hash.clone()))
                .bind(("full_name", new.full_name.clone()))
                .bind(("role", new.role.as_str().to_owned()))
                .bind(("now", new.now))
                .await
                .context("Creating account")?
                .check()
                .map_err(surrealdb::Error::from)
                .context("Creating account")
                .map(|_| ())
            })
            .await;

        match result {
            Ok(()) => Ok(Profile {
                user_id: account.user_id,
                email: account.email,
                full_name: account.full_name,
                created_at: account.now,
                updated_at: account.now,
            }),
            Err(err) if err.is_unique_violation() => Err(IdentityError::Conflict {
                message: "an account with this email already exists".into(),
                context: None,
            }),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn email_exists(&self, email: &str) -> Result<bool, IdentityError> {
        let ids = self
            .db
            .query("SELECT VALUE user_id FROM account WHERE email = $email LIMIT 1")
            .bind(("email", email.to_owned()))
            .await
            .context("Checking email")?
            .take::<Vec<String>>(0)
            .context("Parsing email check")?;
        Ok(!ids.is_empty())
    }

    pub(crate) async fn find_account(&self, email: &str) -> Result<Option<AccountRow>, IdentityError> {
        let rows = self
            .db
            .query("SELECT user_id, email, password_hash FROM account WHERE email = $email LIMIT 1")
            .bind(("email", email.to_owned()))
            .await
            .context("Loading account")?
            .take::<Vec<AccountRow>>(0)
            .context("Parsing account")?;
        Ok(rows.into_iter().next())
    }

    pub(crate) async fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, IdentityError> {
        let rows = self
            .db
            .query(format!("SELECT {PROFILE_FIELDS} FROM profile WHERE user_id = $user_id LIMIT 1"))
            .bind(("user_id", user_id.to_owned()))
            .await
            .context("Loading profile")?
            .take::<Vec<Profile>>(0)
            .context("Parsing profile")?;
        Ok(rows.into_iter().next())
    }

    pub(crate) async fn update_full_name(
        &self,
        user_id: &str,
        full_name: &str,
        now: i64,
    ) -> Result<Option<Profile>, IdentityError> {
        let rows = self
            .db
            .query(format!(
                "UPDATE profile SET full_name = $full_name, updated_at = $now WHERE user_id = $user_id RETURN NONE;
                SELECT {PROFILE_FIELDS} FROM profile WHERE user_id = $user_id LIMIT 1;"
            ))
            .bind(("user_id", user_id.to_owned()))
            .bind(("full_name", full_name.to_owned()))
            .bind(("now", now))
            .await
            .context("Updating profile")?
            .take::<Vec<Profile>>(1)
            .context("Parsing updated profile")?;
        Ok(rows.into_iter().next())
    }

    pub(crate) async fn roles(&self, user_id: &str) -> Result<RoleSet, IdentityError> {
        let raw = self
            .db
            .query("SELECT VALUE role FROM user_role WHERE user_id = $user_id")
            .bind(("user_id", user_id.to_owned()))
            .await
            .context("Loading roles")?
            .take::<Vec<String>>(0)
            .context("Parsing roles")?;

        Ok(raw
            .iter()
            .filter_map(|slug| {
                slug.parse::<Role>()
                    .inspect_err(|e| warn!(user_id, error = %e, "Ignoring unknown stored role"))
                    .ok()
            })
            .collect())
    }

    /// Returns `false` when the role was already held.
    pub(crate) async fn grant_role(
        &self,
        user_id: &str,
        role: Role,
        now: i64,
    ) -> Result<bool, IdentityError> {
        let result = self
            .db
            .query("CREATE user_role SET user_id = $user_id, role = $role, granted_at = $now RETURN NONE")
            .bind(("user_id", user_id.to_owned()))
            .bind(("role", role.as_str().to_owned()))
            .bind(("now", now))
            .await
            .context("Granting role")?
            .check()
            .map_err(surrealdb::Error::from)
            .context("Granting role");

        match result {
            Ok(_) => Ok(true),
            Err(err) if err.is_unique_violation() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn revoke_role(&self, user_id: &str, role: Role) -> Result<(), IdentityError> {
        self.db
            .query("DELETE user_role WHERE user_id = $user_id AND role = $role")
            .bind(("user_id", user_id.to_owned()))
            .bind(("role", role.as_str().to_owned()))
            .await
            .context("Revoking role")?
            .check()
            .map_err(surrealdb::Error::from)
            .context("Revoking role")?;
        Ok(())
    }
}

