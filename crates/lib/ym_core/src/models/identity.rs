//! Identity records ("admin users") used for authorization decisions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of an identity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::Superadmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Local, role-bearing record of a subject that signed in through OAuth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub id: i32,
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_signed_in: DateTime<Utc>,
}

/// Partial write of an identity record, keyed by `open_id`.
///
/// The outer `Option` of each profile field tells whether the field was
/// supplied at all; only supplied fields are written on conflict. An inner
/// `None` stores `NULL`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityUpsert {
    pub open_id: String,
    pub name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub login_method: Option<Option<String>>,
    pub role: Option<Role>,
    pub last_signed_in: Option<DateTime<Utc>>,
}

impl IdentityUpsert {
    /// An upsert that only refreshes `last_signed_in`.
    pub fn touch(open_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            open_id: open_id.into(),
            last_signed_in: Some(at),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::User, Role::Admin, Role::Superadmin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn identity_serializes_camel_case() {
        let now = Utc::now();
        let record = IdentityRecord {
            id: 1,
            open_id: "sub-1".into(),
            name: Some("Ana".into()),
            email: None,
            login_method: Some("google".into()),
            role: Role::Admin,
            created_at: now,
            updated_at: now,
            last_signed_in: now,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["openId"], "sub-1");
        assert_eq!(json["loginMethod"], "google");
        assert_eq!(json["role"], "admin");
        assert!(json.get("lastSignedIn").is_some());
    }

    #[test]
    fn touch_only_sets_last_signed_in() {
        let now = Utc::now();
        let upsert = IdentityUpsert::touch("sub-1", now);
        assert_eq!(upsert.last_signed_in, Some(now));
        assert!(upsert.name.is_none());
        assert!(upsert.role.is_none());
    }
}
