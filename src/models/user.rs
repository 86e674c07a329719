//! User model, JWT claims and permission checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Librarian permission: may renew, lend, return and edit the catalog
    pub is_librarian: bool,
    pub created_at: DateTime<Utc>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password1: String,
    /// Must repeat `password1`
    pub password2: String,
}

impl RegisterRequest {
    /// Strip surrounding whitespace from username and email
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self
        }
    }
}

/// Data needed to insert a user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_librarian: bool,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub can_mark_return: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_librarian(&self) -> bool {
        self.can_mark_return
    }

    /// Require the librarian permission
    pub fn require_librarian(&self) -> Result<(), AppError> {
        if self.is_librarian() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Librarian permission required".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(can_mark_return: bool) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "marian".to_string(),
            user_id: 12,
            can_mark_return,
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let token = claims(true).create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, 12);
        assert!(parsed.is_librarian());
    }

    #[test]
    fn test_token_wrong_secret() {
        let token = claims(false).create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut expired = claims(true);
        expired.exp = Utc::now().timestamp() - 3600;
        let token = expired.create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn test_require_librarian() {
        assert!(claims(true).require_librarian().is_ok());
        assert!(matches!(
            claims(false).require_librarian(),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn test_register_validation() {
        let request = RegisterRequest {
            username: "ab".to_string(),
            email: "not-an-email".to_string(),
            password1: "correct horse".to_string(),
            password2: "correct horse".to_string(),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(!fields.contains_key("password1"));
    }

    #[test]
    fn test_padded_username_is_checked_after_trimming() {
        let request = RegisterRequest {
            username: "  ab  ".to_string(),
            email: " reader@example.org ".to_string(),
            password1: "correct horse".to_string(),
            password2: "correct horse".to_string(),
        }
        .normalized();
        assert_eq!(request.username, "ab");
        assert_eq!(request.email, "reader@example.org");
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));

        let blank = RegisterRequest {
            username: "      ".to_string(),
            email: "reader@example.org".to_string(),
            password1: "correct horse".to_string(),
            password2: "correct horse".to_string(),
        }
        .normalized();
        assert!(blank.validate().is_err());
    }
}
