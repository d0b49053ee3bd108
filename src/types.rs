use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UserdeckError;

/// Number of records shown per local page, independent of the remote page size.
pub const PAGE_SIZE: usize = 6;

/// Directory holding the optional `config.yaml`.
pub const CONFIG_DIR: &str = ".userdeck";

/// Fallback avatar generator used when a record ends up without an avatar.
pub const DEFAULT_AVATAR_URL: &str = "https://ui-avatars.com/api/?name=";

/// Stable, server-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub const fn new(id: u64) -> Self {
        UserId(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = UserdeckError;

    /// Parse a route segment such as `"7"`. Zero, signs and whitespace are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(UserdeckError::InvalidId(s.to_string()));
        }
        match s.parse::<u64>() {
            Ok(0) | Err(_) => Err(UserdeckError::InvalidId(s.to_string())),
            Ok(id) => Ok(UserId(id)),
        }
    }
}

/// A user as returned by the directory API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Avatar image URI. May be empty or point at a broken image.
    #[serde(default)]
    pub avatar: String,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Fields sent with an update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.avatar.is_none()
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }
}

/// One page of `GET /users?page=N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersPage {
    pub data: Vec<UserRecord>,
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_parse() {
        assert_eq!("7".parse::<UserId>().unwrap(), UserId::new(7));
        assert!("0".parse::<UserId>().is_err());
        assert!("-1".parse::<UserId>().is_err());
        assert!("+1".parse::<UserId>().is_err());
        assert!(" 7".parse::<UserId>().is_err());
        assert!("abc".parse::<UserId>().is_err());
        assert!("".parse::<UserId>().is_err());
    }

    #[test]
    fn test_users_page_ignores_extra_fields() {
        let json = r#"{
            "page": 2,
            "per_page": 6,
            "total": 12,
            "total_pages": 2,
            "data": [
                {"id": 7, "email": "michael.lawson@reqres.in", "first_name": "Michael",
                 "last_name": "Lawson", "avatar": "https://reqres.in/img/faces/7-image.jpg"}
            ],
            "support": {"url": "https://reqres.in"}
        }"#;
        let page: UsersPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, UserId::new(7));
        assert_eq!(page.data[0].full_name(), "Michael Lawson");
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = UserPatch::default().first_name("X");
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"first_name": "X"}));
        assert!(!patch.is_empty());
        assert!(UserPatch::default().is_empty());
    }
}
