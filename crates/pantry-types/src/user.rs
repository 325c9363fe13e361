//! User account types.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for a user.
pub type UserId = u64;

/// A user account in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique username (lowercase, alphanumeric with hyphens).
    pub username: String,
    /// Display name (can contain any characters).
    pub display_name: Option<String>,
    /// Email address (optional).
    pub email: Option<String>,
    /// Unix timestamp when created.
    pub created_at: u64,
    /// Unix timestamp when last updated.
    pub updated_at: u64,
}

impl User {
    /// Create a new user.
    pub fn new(id: UserId, username: String) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self {
            id,
            username,
            display_name: None,
            email: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate a username format.
    ///
    /// Usernames must:
    /// - Be 1-39 characters long
    /// - Start with an alphanumeric character
    /// - Contain only lowercase alphanumeric characters and hyphens
    /// - Not contain consecutive hyphens
    /// - Not end with a hyphen
    pub fn validate_username(username: &str) -> Result<(), String> {
        if username.is_empty() {
            return Err("username cannot be empty".to_string());
        }

        if username.len() > 39 {
            return Err("username must be 39 characters or less".to_string());
        }

        let chars: Vec<char> = username.chars().collect();

        // Must start with alphanumeric
        if !chars[0].is_ascii_alphanumeric() {
            return Err("username must start with a letter or number".to_string());
        }

        // Must end with alphanumeric
        if !chars.last().unwrap().is_ascii_alphanumeric() {
            return Err("username must end with a letter or number".to_string());
        }

        // Check each character
        for (i, c) in chars.iter().enumerate() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-' {
                if c.is_ascii_uppercase() {
                    return Err("username must be lowercase".to_string());
                }
                return Err(format!("invalid character in username: {}", c));
            }

            // No consecutive hyphens
            if *c == '-' && i > 0 && chars[i - 1] == '-' {
                return Err("username cannot contain consecutive hyphens".to_string());
            }
        }

        // Reserved usernames
        let reserved = [
            "admin",
            "api",
            "collaborators",
            "cookbooks",
            "dashboard",
            "groups",
            "health",
            "help",
            "login",
            "logout",
            "new",
            "pantry",
            "settings",
            "signup",
            "tools",
            "user",
            "users",
        ];
        if reserved.contains(&username) {
            return Err(format!("username '{}' is reserved", username));
        }

        Ok(())
    }

    /// Update the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_valid() {
        assert!(User::validate_username("alice").is_ok());
        assert!(User::validate_username("bob123").is_ok());
        assert!(User::validate_username("sous-chef").is_ok());
        assert!(User::validate_username("a").is_ok());
        assert!(User::validate_username("a1").is_ok());
    }

    #[test]
    fn test_validate_username_invalid() {
        assert!(User::validate_username("").is_err());
        assert!(User::validate_username("-alice").is_err());
        assert!(User::validate_username("alice-").is_err());
        assert!(User::validate_username("alice--bob").is_err());
        assert!(User::validate_username("Alice").is_err());
        assert!(User::validate_username("alice_bob").is_err());
        assert!(User::validate_username("admin").is_err());
        assert!(User::validate_username("cookbooks").is_err());

        // Too long
        let long_name = "a".repeat(40);
        assert!(User::validate_username(&long_name).is_err());
    }

    #[test]
    fn test_create_user() {
        let user = User::new(1, "alice".to_string());
        assert_eq!(user.id, 1);
        assert_eq!(user.username, "alice");
        assert!(user.display_name.is_none());
        assert!(user.email.is_none());
        assert_eq!(user.created_at, user.updated_at);
    }
}
