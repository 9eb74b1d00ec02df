//! User account models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User account row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// LeetCode handle shown on the dashboard.
    pub leetcode: Option<String>,
    /// GeeksforGeeks handle shown on the dashboard.
    pub gfg: Option<String>,
    /// Exchanged as camelCase; the column stays snake_case.
    #[serde(rename = "profilePicture")]
    pub profile_picture: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Dashboard profile fields a user may update. Absent fields clear the
/// stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub leetcode: Option<String>,
    #[serde(default)]
    pub gfg: Option<String>,
    #[serde(default, rename = "profilePicture")]
    pub profile_picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            password_hash: "$2b$someday".to_string(),
            leetcode: None,
            gfg: None,
            profile_picture: None,
            created_at: "2026-01-01 00:00:00".to_string(),
            updated_at: "2026-01-01 00:00:00".to_string(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_profile_picture_exchanged_as_camel_case() {
        let user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            password_hash: "$2b$someday".to_string(),
            leetcode: None,
            gfg: None,
            profile_picture: Some("https://example.com/a.png".to_string()),
            created_at: "2026-01-01 00:00:00".to_string(),
            updated_at: "2026-01-01 00:00:00".to_string(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["profilePicture"], "https://example.com/a.png");
        assert!(json.get("profile_picture").is_none());

        let update: ProfileUpdate = serde_json::from_value(serde_json::json!({
            "profilePicture": "https://example.com/b.png",
        }))
        .unwrap();
        assert_eq!(
            update.profile_picture.as_deref(),
            Some("https://example.com/b.png")
        );
    }
}
