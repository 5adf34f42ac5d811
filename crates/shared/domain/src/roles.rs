use crate::constants::{ADMIN, PROFESSOR, STUDENT};
use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single role a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Student,
    Professor,
    Admin,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Student, Self::Professor, Self::Admin];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => STUDENT,
            Self::Professor => PROFESSOR,
            Self::Admin => ADMIN,
        }
    }

    /// Roles a user may pick for themselves at sign-up.
    #[must_use]
    pub const fn is_self_assignable(self) -> bool {
        matches!(self, Self::Student | Self::Professor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            STUDENT => Ok(Self::Student),
            PROFESSOR => Ok(Self::Professor),
            ADMIN => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

bitflags! {
    /// The set of roles held by a user; carried in session tokens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct RoleSet: u8 {
        const STUDENT = 1 << 0;
        const PROFESSOR = 1 << 1;
        const ADMIN = 1 << 2;
    }
}

impl RoleSet {
    #[must_use]
    pub const fn has(self, role: Role) -> bool {
        self.contains(Self::from_role(role))
    }

    #[must_use]
    pub const fn from_role(role: Role) -> Self {
        match role {
            Role::Student => Self::STUDENT,
            Role::Professor => Self::PROFESSOR,
            Role::Admin => Self::ADMIN,
        }
    }

    /// Roles in the set, in declaration order.
    #[must_use]
    pub fn roles(self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|role| self.has(*role)).collect()
    }
}

impl From<Role> for RoleSet {
    fn from(role: Role) -> Self {
        Self::from_role(role)
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, role| set | Self::from_role(role))
    }
}

impl Serialize for RoleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}
