use crate::error::IdentityError;
use rollcall_derive::api_model;
use rollcall_domain::roles::{Role, RoleSet};
use surrealdb::types::SurrealValue;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;
pub(crate) const MAX_FULL_NAME_LEN: usize = 120;

/// New account registration. Admin is never self-assignable.
#[api_model]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[schema(value_type = String, example = "student")]
    pub role: Role,
}

#[api_model]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[api_model]
pub struct UpdateProfileRequest {
    pub full_name: String,
}

#[api_model]
#[derive(Clone, PartialEq, Eq, SurrealValue)]
pub struct Profile {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Bearer session returned by sign-up and sign-in.
#[api_model]
pub struct SessionResponse {
    pub token: String,
    pub token_type: String,
    /// Unix seconds
    pub expires_at: i64,
    pub profile: Profile,
    #[schema(value_type = Vec<String>)]
    pub roles: Vec<Role>,
}

#[api_model]
pub struct MeResponse {
    pub profile: Profile,
    #[schema(value_type = Vec<String>)]
    pub roles: Vec<Role>,
}

#[api_model]
pub struct UserRolesResponse {
    pub user_id: String,
    #[schema(value_type = Vec<String>)]
    pub roles: Vec<Role>,
}

impl UserRolesResponse {
    pub(crate) fn new(user_id: String, roles: RoleSet) -> Self {
        Self { user_id, roles: roles.roles() }
    }
}

/// Trims and lower-cases an address and checks it has a local part and a domain.
pub(crate) fn normalize_email(raw: &str) -> Result<String, IdentityError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        },
        _ => Err(IdentityError::validation("email must look like name@domain")),
    }
}

pub(crate) fn validate_password(password: &str) -> Result<(), IdentityError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(IdentityError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub(crate) fn normalize_full_name(raw: &str) -> Result<String, IdentityError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(IdentityError::validation("full name cannot be empty"));
    }
    if name.chars().count() > MAX_FULL_NAME_LEN {
        return Err(IdentityError::validation(format!(
            "full name cannot exceed {MAX_FULL_NAME_LEN} characters"
        )));
    }
    Ok(name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada@Uni.EDU ").unwrap(), "ada@uni.edu");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@uni.edu").is_err());
        assert!(normalize_email("ada@").is_err());
        assert!(normalize_email("a@b@c").is_err());
    }

    #[test]
    fn passwords_need_eight_characters() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn full_names_are_bounded() {
        assert_eq!(normalize_full_name("  Ada Lovelace ").unwrap(), "Ada Lovelace");
        assert!(normalize_full_name("   ").is_err());
        assert!(normalize_full_name(&"x".repeat(121)).is_err());
        assert!(normalize_full_name(&"x".repeat(120)).is_ok());
    }

    #[test]
    fn sign_up_rejects_unknown_fields_and_roles() {
        let extra = r#"{"email":"a@b.c","password":"12345678","fullName":"A","role":"student","admin":true}"#;
        assert!(serde_json::from_str::<SignUpRequest>(extra).is_err());

        let bad_role = r#"{"email":"a@b.c","password":"12345678","fullName":"A","role":"dean"}"#;
        assert!(serde_json::from_str::<SignUpRequest>(bad_role).is_err());

        let ok = r#"{"email":"a@b.c","password":"12345678","fullName":"A","role":"Professor"}"#;
        assert_eq!(serde_json::from_str::<SignUpRequest>(ok).unwrap().role, Role::Professor);
    }
}
