use std::{error, fmt};

use model::profile::Profile;
use serde::{Deserialize, Serialize};
use utility::id::Id;

/// Route unauthenticated actors are redirected to before any mutating action.
pub const SIGN_IN_ROUTE: &str = "/auth";

/// The current session's user, as reported by the hosted identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Id<Profile>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Id::new(user_id.into()),
        }
    }
}

/// Raised when a mutating action is attempted without a session. Callers
/// resolve this by redirecting to [`SIGN_IN_ROUTE`], never by failing loudly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequired;

impl error::Error for AuthRequired {}

impl fmt::Display for AuthRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sign-in required.")
    }
}

/// Holds the current session state for the browsing surface.
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    current: Option<Identity>,
}

impl AuthGate {
    pub fn signed_out() -> Self {
        Self { current: None }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            current: Some(identity),
        }
    }

    pub fn current_user(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    /// Gate for mutating actions.
    pub fn require(&self) -> Result<&Identity, AuthRequired> {
        self.current.as_ref().ok_or(AuthRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_out_gate_requires_sign_in() {
        let gate = AuthGate::signed_out();
        assert!(gate.current_user().is_none());
        assert_eq!(gate.require(), Err(AuthRequired));
    }

    #[test]
    fn test_signed_in_gate_passes() {
        let gate = AuthGate::signed_in(Identity::new("user-1"));
        assert_eq!(gate.require().unwrap().user_id.raw(), "user-1");
    }
}
