use chrono::{DateTime, Utc};
use crypto::bcrypt::bcrypt;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::role::Role;

pub mod db;

pub static USER_COLLECTION_NAME: &str = "users";

/// bcrypt over a SHA-256 digest of the password, keyed with the process-wide
/// salt. The digest step keeps long passwords inside bcrypt's 72-byte input
/// limit.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PasswordHash([u8; 24]);

impl PasswordHash {
    pub fn new(password: impl AsRef<str>) -> PasswordHash {
        let mut pw_hash: [u8; 24] = [0; 24];

        let mut sha = Sha256::new();
        sha2::Digest::update(&mut sha, password.as_ref().as_bytes());

        bcrypt(
            10,
            &crate::CRYPTO.salt,
            sha.finalize().as_slice(),
            &mut pw_hash,
        );

        PasswordHash(pw_hash)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub pw_hash: PasswordHash,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl ToString,
        email: impl ToString,
        password: impl ToString,
        role: Role,
    ) -> User {
        let pw_hash = PasswordHash::new(password.to_string());

        let id = Uuid::new_v4();
        tracing::info!("Creating a new user with UUID: {}", id.to_string());

        User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            pw_hash,
            role,
            created_at: Utc::now(),
        }
    }
}

/// What the API exposes about a user. The password hash never leaves the
/// users collection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_password_hashes_equal() {
        assert_eq!(
            PasswordHash::new("correct horse battery"),
            PasswordHash::new("correct horse battery")
        );
    }

    #[test]
    fn different_passwords_hash_differently() {
        assert_ne!(
            PasswordHash::new("correct horse battery"),
            PasswordHash::new("correct horse staple")
        );
    }

    #[test]
    fn response_omits_password_hash() {
        let user = User::new("Ada", "ada@example.com", "hunter22hunter22", Role::Student);
        let response = UserResponse::from(user);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("pw_hash").is_none());
        assert_eq!(json.get("role").unwrap(), "student");
    }
}
