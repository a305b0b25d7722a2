//! Per-route authorization policy.
//!
//! Routes are tagged with an explicit [`Capability`] rather than sharing one
//! uniform policy: most clinical endpoints only require a valid token, while
//! user management is restricted to admin/manager. The asymmetry is
//! deliberate and mirrored from the deployed system.
use crate::auth::{Identity, Role};

/// What a route demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// No credential required (health checks, login, registration).
    Public,
    /// Any syntactically valid, unexpired token.
    ValidToken,
    /// A valid token whose role is admin or manager.
    AdminOrManager,
}

impl Capability {
    /// Whether the verified identity satisfies this capability. Token
    /// presence and validity are checked upstream; this only decides the
    /// role question.
    pub fn permits(&self, identity: &Identity) -> bool {
        match self {
            Capability::Public | Capability::ValidToken => true,
            Capability::AdminOrManager => identity.role.is_administrative(),
        }
    }
}

/// Convenience used in tests and route guards.
pub fn authorize(identity: &Identity, required: Capability) -> Result<(), Role> {
    if required.permits(identity) {
        Ok(())
    } else {
        Err(identity.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            id: 1,
            username: "someone".to_string(),
            role,
        }
    }

    #[test]
    fn test_admin_or_manager_gate() {
        assert!(Capability::AdminOrManager.permits(&identity(Role::Admin)));
        assert!(Capability::AdminOrManager.permits(&identity(Role::Manager)));
        for role in [
            Role::Doctor,
            Role::Nurse,
            Role::Receptionist,
            Role::Pharmacist,
        ] {
            assert!(!Capability::AdminOrManager.permits(&identity(role)));
        }
    }

    #[test]
    fn test_valid_token_permits_every_role() {
        for role in [Role::Admin, Role::Receptionist, Role::Pharmacist] {
            assert!(Capability::ValidToken.permits(&identity(role)));
        }
    }

    #[test]
    fn test_authorize_reports_offending_role() {
        assert_eq!(
            authorize(&identity(Role::Nurse), Capability::AdminOrManager),
            Err(Role::Nurse)
        );
        assert!(authorize(&identity(Role::Manager), Capability::AdminOrManager).is_ok());
    }
}
