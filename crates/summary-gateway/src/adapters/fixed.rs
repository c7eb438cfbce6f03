//! In-process stand-ins for backends that have no URL configured.
//!
//! They answer immediately and never fail, which is enough to run the
//! gateway locally end to end.

use crate::domain::deadline::Deadline;
use crate::domain::error::DependencyError;
use crate::domain::types::{AccessPayload, ContextPayload, IdentityPayload};
use crate::ports::{AccessClient, ContextClient, IdentityClient};
use async_trait::async_trait;

/// Permissions granted by [`FixedAccessClient`].
pub const FIXED_PERMISSIONS: [&str; 3] = ["chat:read", "chat:write", "chat:summary:view"];

/// Echoes the user id back as the username.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedIdentityClient;

#[async_trait]
impl IdentityClient for FixedIdentityClient {
    async fn get_user(
        &self,
        _deadline: &Deadline,
        user_id: &str,
    ) -> Result<IdentityPayload, DependencyError> {
        Ok(IdentityPayload {
            user_id: user_id.to_string(),
            username: user_id.to_string(),
            email: String::new(),
            role: String::new(),
        })
    }
}

/// Grants full access to every chat.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAccessClient;

#[async_trait]
impl AccessClient for FixedAccessClient {
    async fn check_access(
        &self,
        _deadline: &Deadline,
        _user_id: &str,
        _chat_id: &str,
    ) -> Result<AccessPayload, DependencyError> {
        Ok(AccessPayload {
            allowed: true,
            permissions: FIXED_PERMISSIONS.iter().map(|p| p.to_string()).collect(),
            reason: "User has full access to the chat".to_string(),
        })
    }
}

/// Returns an empty context.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedContextClient;

#[async_trait]
impl ContextClient for FixedContextClient {
    async fn get_context(
        &self,
        _deadline: &Deadline,
        _chat_id: &str,
    ) -> Result<ContextPayload, DependencyError> {
        Ok(ContextPayload::default())
    }
}
