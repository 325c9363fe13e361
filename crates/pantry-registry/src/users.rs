//! User directory storage.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pantry_types::{User, UserId};

use crate::error::{RegistryError, Result};

/// User directory.
#[derive(Debug, Clone)]
pub struct UserStore {
    /// Users by ID.
    users: Arc<RwLock<HashMap<UserId, User>>>,
    /// Username to ID index.
    username_index: Arc<RwLock<HashMap<String, UserId>>>,
    /// Next user ID.
    next_id: Arc<AtomicU64>,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    /// Create a new user store.
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            username_index: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Create a new user.
    pub fn create(&self, username: String) -> Result<User> {
        // Validate username
        User::validate_username(&username).map_err(RegistryError::InvalidUsername)?;

        let mut users = self.users.write();
        let mut username_index = self.username_index.write();

        // Check for duplicate username
        if username_index.contains_key(&username) {
            return Err(RegistryError::UsernameTaken(username));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = User::new(id, username.clone());

        username_index.insert(username, id);
        users.insert(id, user.clone());

        Ok(user)
    }

    /// Get a user by ID.
    pub fn get(&self, id: UserId) -> Option<User> {
        self.users.read().get(&id).cloned()
    }

    /// Get a user by username.
    pub fn get_by_username(&self, username: &str) -> Option<User> {
        let username_index = self.username_index.read();
        let id = username_index.get(username)?;
        self.users.read().get(id).cloned()
    }

    /// Update a user.
    pub fn update(&self, mut user: User) -> Result<User> {
        let mut users = self.users.write();
        if !users.contains_key(&user.id) {
            return Err(RegistryError::UserNotFound(user.id.to_string()));
        }
        user.touch();
        users.insert(user.id, user.clone());
        Ok(user)
    }

    /// List all users, sorted by username.
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    /// Count users.
    pub fn count(&self) -> usize {
        self.users.read().len()
    }

    /// Search users by username substring, case-insensitive.
    ///
    /// Results are ranked exact match first, then prefix matches, then
    /// other substring matches, each bucket ordered by username. Users
    /// in `exclude` never appear. At most `limit` users are returned.
    /// An empty query matches every non-excluded user.
    pub fn search(&self, query: &str, exclude: &[UserId], limit: usize) -> Vec<User> {
        let query = query.to_lowercase();
        let users = self.users.read();

        let mut matches: Vec<&User> = users
            .values()
            .filter(|u| !exclude.contains(&u.id) && u.username.contains(&query))
            .collect();

        matches.sort_by(|a, b| {
            match_rank(&a.username, &query)
                .cmp(&match_rank(&b.username, &query))
                .then_with(|| a.username.cmp(&b.username))
        });

        matches.into_iter().take(limit).cloned().collect()
    }
}

/// Rank for search ordering: exact < prefix < substring.
fn match_rank(username: &str, query: &str) -> u8 {
    if username == query {
        0
    } else if username.starts_with(query) {
        1
    } else {
        2
    }
}
