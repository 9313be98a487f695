use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::calculator::repo::UserStats;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Request body for login; `login` is a username or an email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Public part of the user returned to the client; never carries the hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            is_active: u.is_active,
            last_login: u.last_login,
            created_at: u.created_at,
        }
    }
}

/// Response returned after register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: AuthData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub user: PublicUser,
    pub token: String,
    pub expires_in: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: ProfileData,
}

#[derive(Debug, Serialize)]
pub struct ProfileData {
    pub user: PublicUser,
    pub stats: UserStats,
}

#[derive(Debug, Serialize)]
pub struct UpdatedProfileResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: UpdatedProfileData,
}

#[derive(Debug, Serialize)]
pub struct UpdatedProfileData {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serializes_camel_case() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            first_name: Some("Alice".into()),
            last_name: None,
            is_active: true,
            last_login: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("firstName"));
        assert!(json.contains("isActive"));
        assert!(json.contains("createdAt"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn register_request_accepts_missing_names() {
        let payload: RegisterRequest = serde_json::from_str(
            r#"{"username":"alice","email":"alice@x.com","password":"Passw0rd"}"#,
        )
        .unwrap();
        assert_eq!(payload.username, "alice");
        assert!(payload.first_name.is_none());
        assert!(payload.last_name.is_none());
    }
}
