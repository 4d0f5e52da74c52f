//! Policy rules about which records may be touched.
//!
//! System-managed records are recognized by their flag, here and nowhere else.

use orgadmin_core::{DomainError, DomainResult, UserId};

use crate::{Role, User};

/// Editing, deleting or re-permissioning a role.
pub fn ensure_role_mutable(role: &Role) -> DomainResult<()> {
    if role.is_system_managed {
        return Err(DomainError::forbidden(format!(
            "role '{}' is system-managed",
            role.name
        )));
    }
    Ok(())
}

/// Deleting a user: never the system-managed user, never yourself.
pub fn ensure_user_deletable(actor: UserId, target: &User) -> DomainResult<()> {
    if target.is_system_managed {
        return Err(DomainError::forbidden("user is system-managed"));
    }
    if target.id == actor {
        return Err(DomainError::forbidden("cannot delete your own account"));
    }
    Ok(())
}

/// Enabling/disabling a user: same rule as deletion.
pub fn ensure_user_toggleable(actor: UserId, target: &User) -> DomainResult<()> {
    if target.is_system_managed {
        return Err(DomainError::forbidden("user is system-managed"));
    }
    if target.id == actor {
        return Err(DomainError::forbidden("cannot change your own active flag"));
    }
    Ok(())
}

/// Editing a user's profile, roles, entities or verification state. The
/// system-managed user stays exactly as it was seeded.
pub fn ensure_user_mutable(target: &User) -> DomainResult<()> {
    if target.is_system_managed {
        return Err(DomainError::forbidden("user is system-managed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orgadmin_core::RoleId;

    fn user(system: bool) -> User {
        User {
            id: UserId::new(),
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            email_verified: false,
            active: true,
            is_system_managed: system,
            role_ids: vec![],
            entity_ids: vec![],
            selected_entity_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn system_managed_role_is_immutable() {
        let role = Role {
            id: RoleId::new(),
            name: "Super Admin".to_string(),
            description: String::new(),
            is_system_managed: true,
            permissions: vec![],
        };
        assert!(matches!(ensure_role_mutable(&role), Err(DomainError::Forbidden(_))));

        let plain = Role { is_system_managed: false, ..role };
        assert!(ensure_role_mutable(&plain).is_ok());
    }

    #[test]
    fn cannot_delete_self_or_system_user() {
        let target = user(false);
        assert!(ensure_user_deletable(target.id, &target).is_err());
        assert!(ensure_user_deletable(UserId::new(), &target).is_ok());
        assert!(ensure_user_deletable(UserId::new(), &user(true)).is_err());
    }

    #[test]
    fn cannot_toggle_self_or_system_user() {
        let target = user(false);
        assert!(ensure_user_toggleable(target.id, &target).is_err());
        assert!(ensure_user_toggleable(UserId::new(), &user(true)).is_err());
    }

    #[test]
    fn system_user_is_immutable() {
        assert!(matches!(ensure_user_mutable(&user(true)), Err(DomainError::Forbidden(_))));
        assert!(ensure_user_mutable(&user(false)).is_ok());
    }
}
