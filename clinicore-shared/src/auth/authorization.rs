/// Authorization: the role capability table
///
/// Every permission decision in the clinic is a lookup in one table:
/// [`Role::allows`] maps (role, capability) to yes/no. Routes call
/// [`require`] with the capability they need; there are no inline role
/// comparisons anywhere else.
///
/// # Capability Matrix
///
/// | Capability          | admin | doctor | nurse | receptionist | patient |
/// |---------------------|-------|--------|-------|--------------|---------|
/// | ManageUsers         |   ✓   |        |       |              |         |
/// | ManageDoctors       |   ✓   |        |       |              |         |
/// | ManageServices      |   ✓   |        |       |      ✓       |         |
/// | BookAppointments    |   ✓   |        |       |      ✓       |    ✓    |
/// | ManageAppointments  |   ✓   |        |       |      ✓       |         |
/// | WriteMedicalRecords |       |   ✓    |       |              |         |
/// | ManageInvoices      |   ✓   |        |       |      ✓       |         |
/// | ManageInventory     |   ✓   |        |   ✓   |              |         |
/// | RecordAttendance    |   ✓   |        |       |              |         |
/// | ViewDashboard       |   ✓   |        |       |      ✓       |         |
///
/// Patients additionally see their own appointments, records, invoices and
/// notifications through scoped queries (see
/// [`visibility`](crate::visibility)), which is not a capability but a
/// filter.
///
/// # Example
///
/// ```
/// use clinicore_shared::auth::authorization::{require, Capability};
/// use clinicore_shared::auth::middleware::AuthContext;
/// use clinicore_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let auth = AuthContext::new(Uuid::new_v4(), Role::Receptionist);
/// assert!(require(&auth, Capability::BookAppointments).is_ok());
/// assert!(require(&auth, Capability::ManageUsers).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::Role;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The caller's role lacks the required capability
    #[error("Role {role} is not allowed to {capability}")]
    MissingCapability {
        role: &'static str,
        capability: &'static str,
    },

    /// The caller does not own the resource
    #[error("Not authorized to access this resource")]
    NotOwner,
}

/// Actions a role may be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create, update and deactivate user accounts
    ManageUsers,

    /// Create and update doctor profiles and availability
    ManageDoctors,

    /// Maintain the service catalog
    ManageServices,

    /// Book appointments (patients book for themselves)
    BookAppointments,

    /// Reschedule, cancel and transition any appointment
    ManageAppointments,

    /// Author and amend medical records
    WriteMedicalRecords,

    /// Create, issue, settle and void invoices
    ManageInvoices,

    /// Maintain inventory items and adjust stock
    ManageInventory,

    /// Record attendance for other staff members
    RecordAttendance,

    /// View clinic-wide dashboard aggregates
    ViewDashboard,
}

impl Capability {
    /// Capability name for error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ManageUsers => "manage users",
            Capability::ManageDoctors => "manage doctors",
            Capability::ManageServices => "manage services",
            Capability::BookAppointments => "book appointments",
            Capability::ManageAppointments => "manage appointments",
            Capability::WriteMedicalRecords => "write medical records",
            Capability::ManageInvoices => "manage invoices",
            Capability::ManageInventory => "manage inventory",
            Capability::RecordAttendance => "record attendance",
            Capability::ViewDashboard => "view dashboard",
        }
    }
}

impl Role {
    /// The capability table: one place answers every permission question
    pub fn allows(&self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Role::Admin => !matches!(capability, WriteMedicalRecords),
            Role::Doctor => matches!(capability, WriteMedicalRecords),
            Role::Nurse => matches!(capability, ManageInventory),
            Role::Receptionist => matches!(
                capability,
                ManageServices | BookAppointments | ManageAppointments | ManageInvoices | ViewDashboard
            ),
            Role::Patient => matches!(capability, BookAppointments),
        }
    }
}

/// Checks the caller's role grants a capability
///
/// # Errors
///
/// Returns `AuthzError::MissingCapability` when the lookup denies
pub fn require(auth: &AuthContext, capability: Capability) -> Result<(), AuthzError> {
    if !auth.role.allows(capability) {
        return Err(AuthzError::MissingCapability {
            role: auth.role.as_str(),
            capability: capability.as_str(),
        });
    }

    Ok(())
}

/// Checks the caller owns a resource
///
/// # Errors
///
/// Returns `AuthzError::NotOwner` when the IDs differ
pub fn require_self(auth: &AuthContext, resource_owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != resource_owner_id {
        return Err(AuthzError::NotOwner);
    }

    Ok(())
}

/// Checks a capability OR ownership
///
/// Grants access when the caller owns the resource, otherwise falls back to
/// the capability lookup. Used for "manage anyone's, or touch your own"
/// routes like profile updates and appointment rescheduling.
pub fn require_self_or(
    auth: &AuthContext,
    resource_owner_id: Uuid,
    capability: Capability,
) -> Result<(), AuthzError> {
    if auth.user_id == resource_owner_id {
        return Ok(());
    }

    require(auth, capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_table_admin() {
        for cap in [
            Capability::ManageUsers,
            Capability::ManageDoctors,
            Capability::ManageServices,
            Capability::BookAppointments,
            Capability::ManageAppointments,
            Capability::ManageInvoices,
            Capability::ManageInventory,
            Capability::RecordAttendance,
            Capability::ViewDashboard,
        ] {
            assert!(Role::Admin.allows(cap), "admin should allow {:?}", cap);
        }

        // Clinical authorship stays with doctors
        assert!(!Role::Admin.allows(Capability::WriteMedicalRecords));
    }

    #[test]
    fn test_capability_table_doctor() {
        assert!(Role::Doctor.allows(Capability::WriteMedicalRecords));
        assert!(!Role::Doctor.allows(Capability::ManageUsers));
        assert!(!Role::Doctor.allows(Capability::ManageInvoices));
        assert!(!Role::Doctor.allows(Capability::BookAppointments));
    }

    #[test]
    fn test_capability_table_nurse() {
        assert!(Role::Nurse.allows(Capability::ManageInventory));
        assert!(!Role::Nurse.allows(Capability::WriteMedicalRecords));
        assert!(!Role::Nurse.allows(Capability::ManageAppointments));
    }

    #[test]
    fn test_capability_table_receptionist() {
        assert!(Role::Receptionist.allows(Capability::BookAppointments));
        assert!(Role::Receptionist.allows(Capability::ManageAppointments));
        assert!(Role::Receptionist.allows(Capability::ManageInvoices));
        assert!(Role::Receptionist.allows(Capability::ViewDashboard));
        assert!(!Role::Receptionist.allows(Capability::ManageUsers));
        assert!(!Role::Receptionist.allows(Capability::ManageInventory));
    }

    #[test]
    fn test_capability_table_patient() {
        assert!(Role::Patient.allows(Capability::BookAppointments));
        assert!(!Role::Patient.allows(Capability::ManageAppointments));
        assert!(!Role::Patient.allows(Capability::ViewDashboard));
        assert!(!Role::Patient.allows(Capability::ManageInventory));
    }

    #[test]
    fn test_require() {
        let auth = AuthContext::new(Uuid::new_v4(), Role::Patient);

        assert!(require(&auth, Capability::BookAppointments).is_ok());
        assert!(require(&auth, Capability::ManageUsers).is_err());
    }

    #[test]
    fn test_require_self() {
        let user_id = Uuid::new_v4();
        let auth = AuthContext::new(user_id, Role::Patient);

        assert!(require_self(&auth, user_id).is_ok());
        assert!(require_self(&auth, Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_require_self_or() {
        let user_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();

        // Owner passes without the capability
        let patient = AuthContext::new(user_id, Role::Patient);
        assert!(require_self_or(&patient, user_id, Capability::ManageUsers).is_ok());
        assert!(require_self_or(&patient, other_id, Capability::ManageUsers).is_err());

        // Admin passes via the capability
        let admin = AuthContext::new(Uuid::new_v4(), Role::Admin);
        assert!(require_self_or(&admin, other_id, Capability::ManageUsers).is_ok());
    }
}
