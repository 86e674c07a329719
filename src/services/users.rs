//! Account service: registration, authentication and profiles

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::rngs::OsRng;
use validator::Validate;

use crate::{
    config::{AuthConfig, BootstrapLibrarian},
    error::{AppError, AppResult},
    models::user::{NewUser, RegisterRequest, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by username and password, returning a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user.password_hash, password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!(user_id = user.id, "User logged in");

        Ok((token, user))
    }

    /// Token lifetime in seconds
    pub fn token_lifetime(&self) -> i64 {
        self.config.jwt_expiration_hours as i64 * 3600
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            can_mark_return: user.is_librarian,
            exp: now + self.token_lifetime(),
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Register a reader account
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        let request = request.normalized();
        request.validate()?;
        check_passwords_match(&request.password1, &request.password2)?;

        let username = request.username;
        if self.repository.users.username_exists(&username).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let user = self
            .repository
            .users
            .create(&NewUser {
                username,
                email: request.email,
                password_hash: hash_password(&request.password1)?,
                is_librarian: false,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create the configured librarian account if it is missing
    pub async fn ensure_librarian(&self, librarian: &BootstrapLibrarian) -> AppResult<()> {
        if self.repository.users.username_exists(&librarian.username).await? {
            return Ok(());
        }

        self.repository
            .users
            .create(&NewUser {
                username: librarian.username.clone(),
                email: librarian.email.clone(),
                password_hash: hash_password(&librarian.password)?,
                is_librarian: true,
            })
            .await?;

        tracing::info!(username = %librarian.username, "Bootstrap librarian created");
        Ok(())
    }
}

pub(crate) fn check_passwords_match(password1: &str, password2: &str) -> AppResult<()> {
    if password1 != password2 {
        return Err(AppError::Validation(
            "password2: The two password fields didn't match".to_string(),
        ));
    }
    Ok(())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse battery").unwrap());
        assert!(!verify_password(&hash, "wrong").unwrap());
    }

    #[test]
    fn test_invalid_hash() {
        assert!(matches!(
            verify_password("not-a-hash", "x"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_passwords_must_match() {
        assert!(check_passwords_match("abcdefgh", "abcdefgh").is_ok());
        assert!(matches!(
            check_passwords_match("abcdefgh", "abcdefgi"),
            Err(AppError::Validation(_))
        ));
    }
}
