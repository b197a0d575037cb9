use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::{
    Result,
    gating::permission_granted,
    plugin::{ChatUser, UserDirectory},
};

/// A player with a fixed permission list.
#[derive(Debug, Clone)]
pub struct StaticUser {
    username: String,
    permissions: Vec<String>,
}

impl StaticUser {
    pub fn new(username: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            username: username.into(),
            permissions,
        }
    }
}

impl ChatUser for StaticUser {
    fn username(&self) -> &str {
        &self.username
    }

    fn has_permission(&self, permission: &str) -> bool {
        permission_granted(permission, &self.permissions)
    }
}

/// Directory backed by a fixed table, looked up case-insensitively.
///
/// When `default_permissions` is non-empty, unknown usernames resolve to a
/// user holding those permissions instead of being reported missing.
#[derive(Debug, Default)]
pub struct StaticUserDirectory {
    users: HashMap<String, Arc<StaticUser>>,
    default_permissions: Vec<String>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, username: &str, permissions: &[&str]) -> Self {
        self.insert(
            username,
            permissions.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    #[must_use]
    pub fn with_default_permissions(mut self, permissions: Vec<String>) -> Self {
        self.default_permissions = permissions;
        self
    }

    pub fn insert(&mut self, username: &str, permissions: Vec<String>) {
        self.users.insert(
            username.to_lowercase(),
            Arc::new(StaticUser::new(username, permissions)),
        );
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn get_user(&self, username: &str) -> Result<Option<Arc<dyn ChatUser>>> {
        if let Some(user) = self.users.get(&username.to_lowercase()) {
            return Ok(Some(user.clone() as Arc<dyn ChatUser>));
        }
        if self.default_permissions.is_empty() {
            return Ok(None);
        }
        Ok(Some(Arc::new(StaticUser::new(
            username,
            self.default_permissions.clone(),
        ))))
    }
}
