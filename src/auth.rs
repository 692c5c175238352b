use crate::dto::{Admin, AdminRole};
use crate::error::ConsoleError;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Supplies the bearer token for each request.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;

    /// Called when the server rejects the token (HTTP 401).
    fn invalidate(&self);
}

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub admin: Admin,
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn is_super_admin(&self) -> bool {
        self.admin.role == AdminRole::SuperAdmin
    }

    /// Agent every list must be restricted to, for agent-level admins.
    pub fn agent_scope(&self) -> Option<&str> {
        match self.admin.role {
            AdminRole::SuperAdmin => None,
            AdminRole::Agent => self.admin.agent_id.as_deref(),
        }
    }
}

/// Shared holder of the current session. Login, refresh and logout are the
/// only writers; the API client reads it on every request.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn admin(&self) -> Option<Admin> {
        self.current().map(|session| session.admin)
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn set(&self, session: Session) {
        info!("Session established for {}", session.admin.username);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Swaps in new tokens after a refresh. No-op without a session.
    pub fn update_tokens(&self, access_token: String, refresh_token: Option<String>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = guard.as_mut() {
            session.access_token = access_token;
            if let Some(refresh) = refresh_token {
                session.refresh_token = refresh;
            }
        }
    }

    pub fn clear(&self) {
        let previous = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = previous {
            info!("Session cleared for {}", session.admin.username);
        }
    }
}

impl CredentialProvider for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    fn invalidate(&self) {
        self.clear();
    }
}

/// Screens of the console, used for role checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dashboard,
    Users,
    Bets,
    AgentReport,
    PlayerSummary,
    AgentManagement,
    Config,
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Users => "users",
            Section::Bets => "bets",
            Section::AgentReport => "agent report",
            Section::PlayerSummary => "player summary",
            Section::AgentManagement => "agent management",
            Section::Config => "game config",
        }
    }

    pub fn allowed_roles(&self) -> &'static [AdminRole] {
        match self {
            Section::Dashboard | Section::Users | Section::Bets | Section::AgentReport => {
                &[AdminRole::SuperAdmin, AdminRole::Agent]
            }
            Section::PlayerSummary | Section::AgentManagement | Section::Config => {
                &[AdminRole::SuperAdmin]
            }
        }
    }
}

/// Checks that `session` may open `section`.
pub fn require_role(session: Option<&Session>, section: Section) -> Result<(), ConsoleError> {
    let session = session.ok_or(ConsoleError::Unauthorized)?;
    if section.allowed_roles().contains(&session.admin.role) {
        Ok(())
    } else {
        Err(ConsoleError::Forbidden(section.name().to_string()))
    }
}
