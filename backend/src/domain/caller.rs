//! Authenticated caller identity carried by the session cookie.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role granted to back-office administrators.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
/// Role granted to client accounts created through registration.
pub const ROLE_CLIENT: &str = "ROLE_CLIENT";
/// Role granted to field agents.
pub const ROLE_AGENT: &str = "ROLE_AGENT";

/// Identity of the user performing a request.
///
/// `matricule` is present when the account is linked to an agent record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Caller {
    pub user_id: i32,
    #[schema(example = "chef@example.com")]
    pub email: String,
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matricule: Option<String>,
}

impl Caller {
    /// Build a caller from its parts.
    pub fn new(user_id: i32, email: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            roles,
            matricule: None,
        }
    }

    /// Attach the agent matricule linked to this account.
    #[must_use]
    pub fn with_matricule(mut self, matricule: impl Into<String>) -> Self {
        self.matricule = Some(matricule.into());
        self
    }

    /// Whether the caller holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|held| held == role)
    }

    /// Whether the caller is an administrator.
    ///
    /// # Examples
    /// ```
    /// use fieldops::domain::{Caller, ROLE_ADMIN};
    ///
    /// let caller = Caller::new(1, "a@example.com", vec![ROLE_ADMIN.to_owned()]);
    /// assert!(caller.is_admin());
    /// ```
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// The e-mail address, if it holds anything other than whitespace.
    pub fn email(&self) -> Option<&str> {
        let trimmed = self.email.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
