use crate::error::{IdentityError, IdentityErrorExt};
use crate::model::{
    MeResponse, Profile, SessionResponse, SignInRequest, SignUpRequest, UpdateProfileRequest,
    UserRolesResponse, normalize_email, normalize_full_name, validate_password,
};
use crate::password;
use crate::repository::{IdentityRepository, NewAccount};
use rollcall_database::Database;
use rollcall_domain::config::{BootstrapAdminConfig, JwtConfig};
use rollcall_domain::constants::{PROFILE, USER_ROLE};
use rollcall_domain::roles::{Role, RoleSet};
use rollcall_kernel::security::policy;
use rollcall_kernel::security::resource::ResourceGuard;
use rollcall_kernel::security::{Actor, SessionTokens};
use rollcall_kernel::{now_millis, safe_nanoid};
use tracing::{info, instrument};

/// Account lifecycle, sessions and role administration.
#[derive(Debug, Clone)]
pub struct IdentityService {
    repo: IdentityRepository,
    sessions: SessionTokens,
}

impl IdentityService {
    pub fn new(db: Database, jwt: &JwtConfig) -> Result<Self, IdentityError> {
        let sessions = SessionTokens::new(jwt).context("security.jwt")?;
        Ok(Self { repo: IdentityRepository::new(db), sessions })
    }

    /// Registers a student or professor and signs them in.
    #[instrument(skip_all, fields(role = %request.role))]
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<SessionResponse, IdentityError> {
        if !request.role.is_self_assignable() {
            return Err(IdentityError::forbidden(format!(
                "role '{}' cannot be chosen at sign-up",
                request.role
            )));
        }
        let email = normalize_email(&request.email)?;
        validate_password(&request.password)?;
        let full_name = normalize_full_name(&request.full_name)?;

        let profile = self.register(email, request.password, full_name, request.role).await?;
        info!(user_id = %profile.user_id, "Account created");

        self.session_for(profile, RoleSet::from(request.role))
    }

    /// Verifies credentials. Unknown email and wrong password produce the same error.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, request: SignInRequest) -> Result<SessionResponse, IdentityError> {
        let email = request.email.trim().to_lowercase();

        let Some(account) = self.repo.find_account(&email).await? else {
            password::burn(request.password).await?;
            return Err(IdentityError::invalid_credentials());
        };
        if !password::verify(request.password, account.password_hash).await? {
            return Err(IdentityError::invalid_credentials());
        }

        let profile = self
            .repo
            .find_profile(&account.user_id)
            .await?
            .ok_or_else(|| IdentityError::Internal {
                message: "account has no profile".into(),
                context: Some(account.user_id.clone().into()),
            })?;
        let roles = self.repo.roles(&account.user_id).await?;
        info!(user_id = %account.user_id, "Signed in");

        self.session_for(profile, roles)
    }

    /// The caller's profile with their current roles (which may differ from the token snapshot).
    pub async fn me(&self, actor: &Actor) -> Result<MeResponse, IdentityError> {
        let profile = self
            .repo
            .find_profile(&actor.user_id)
            .await?
            .ok_or_else(|| IdentityError::not_found("profile"))?;
        let roles = self.repo.roles(&actor.user_id).await?;
        Ok(MeResponse { profile, roles: roles.roles() })
    }

    pub async fn update_profile(
        &self,
        actor: &Actor,
        request: UpdateProfileRequest,
    ) -> Result<Profile, IdentityError> {
        if !policy::profile::can_update(actor, &actor.user_id) {
            return Err(IdentityError::forbidden("profile update"));
        }
        let full_name = normalize_full_name(&request.full_name)?;
        self.repo
            .update_full_name(&actor.user_id, &full_name, now_millis())
            .await?
            .ok_or_else(|| IdentityError::not_found("profile"))
    }

    pub async fn get_profile(&self, actor: &Actor, user_id: &str) -> Result<Profile, IdentityError> {
        let user_id = ResourceGuard::verify(user_id, PROFILE)?;
        if !policy::profile::can_select(actor, &user_id) {
            return Err(IdentityError::forbidden("profile is not visible to the caller"));
        }
        self.repo.find_profile(&user_id).await?.ok_or_else(|| IdentityError::not_found("profile"))
    }

    pub async fn roles_of(&self, actor: &Actor, user_id: &str) -> Result<UserRolesResponse, IdentityError> {
        let user_id = ResourceGuard::verify(user_id, USER_ROLE)?;
        if !policy::user_role::can_select(actor, &user_id) {
            return Err(IdentityError::forbidden("roles are not visible to the caller"));
        }
        let roles = self.repo.roles(&user_id).await?;
        Ok(UserRolesResponse::new(user_id, roles))
    }

    /// Grants a role. Granting a role the user already holds is a no-op.
    #[instrument(skip(self, actor), fields(admin = %actor.user_id))]
    pub async fn grant_role(
        &self,
        actor: &Actor,
        user_id: &str,
        role: Role,
    ) -> Result<UserRolesResponse, IdentityError> {
        if !policy::user_role::can_grant(actor) {
            return Err(IdentityError::forbidden("only admins grant roles"));
        }
        let user_id = self.existing_user(user_id).await?;

        if self.repo.grant_role(&user_id, role, now_millis()).await? {
            info!(%user_id, %role, "Role granted");
        }
        let roles = self.repo.roles(&user_id).await?;
        Ok(UserRolesResponse::new(user_id, roles))
    }

    /// Revokes a role. A user keeps at least one role.
    #[instrument(skip(self, actor), fields(admin = %actor.user_id))]
    pub async fn revoke_role(
        &self,
        actor: &Actor,
        user_id: &str,
        role: Role,
    ) -> Result<UserRolesResponse, IdentityError> {
        if !policy::user_role::can_revoke(actor) {
            return Err(IdentityError::forbidden("only admins revoke roles"));
        }
        let user_id = self.existing_user(user_id).await?;

        let current = self.repo.roles(&user_id).await?;
        if !current.has(role) {
            return Err(IdentityError::not_found(format!("user does not hold role '{role}'")));
        }
        let remaining = current.difference(RoleSet::from(role));
        if remaining.is_empty() {
            return Err(IdentityError::validation("cannot revoke the last role of a user"));
        }

        self.repo.revoke_role(&user_id, role).await?;
        info!(%user_id, %role, "Role revoked");
        Ok(UserRolesResponse::new(user_id, remaining))
    }

    /// Creates the configured administrator unless the email is already registered.
    ///
    /// Returns `true` when an account was created.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdminConfig) -> Result<bool, IdentityError> {
        let email = normalize_email(&admin.email).context("security.bootstrap_admin.email")?;
        if self.repo.email_exists(&email).await? {
            return Ok(false);
        }
        validate_password(&admin.password).context("security.bootstrap_admin.password")?;
        let full_name =
            normalize_full_name(&admin.full_name).context("security.bootstrap_admin.full_name")?;

        let profile = self.register(email, admin.password.clone(), full_name, Role::Admin).await?;
        info!(user_id = %profile.user_id, email = %profile.email, "Bootstrap administrator created");
        Ok(true)
    }

    async fn register(
        &self,
        email: String,
        password: String,
        full_name: String,
        role: Role,
    ) -> Result<Profile, IdentityError> {
        if self.repo.email_exists(&email).await? {
            return Err(IdentityError::Conflict {
                message: "an account with this email already exists".into(),
                context: None,
            });
        }
        let password_hash = password::hash(password).await?;

        self.repo
            .create_account(NewAccount {
                user_id: safe_nanoid!(),
                email,
                password_hash,
                full_name,
                role,
                now: now_millis(),
            })
            .await
    }

    async fn existing_user(&self, user_id: &str) -> Result<String, IdentityError> {
        let user_id = ResourceGuard::verify(user_id, PROFILE)?;
        if self.repo.find_profile(&user_id).await?.is_none() {
            return Err(IdentityError::not_found("user"));
        }
        Ok(user_id)
    }

    fn session_for(&self, profile: Profile, roles: RoleSet) -> Result<SessionResponse, IdentityError> {
        let issued = self.sessions.issue(&profile.user_id, &profile.email, roles)?;
        Ok(SessionResponse {
            token: issued.token,
            token_type: "Bearer".to_owned(),
            expires_at: issued.expires_at,
            profile,
            roles: roles.roles(),
        })
    }
}
