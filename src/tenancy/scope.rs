//! Tenant scope enforcement over the `organization -> project -> task -> comment`
//! ownership chain.
//!
//! Every scoped type declares its [`Ownership`] once, in its [`Scoped`] impl.
//! `authorize` is permissive when no tenant was resolved; `filter` fails
//! closed for types that have no ownership chain at all.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Comment, Organization, Project, Task};

/// How an entity type reaches its organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Carries `organization_id` itself.
    DirectOwner,
    /// One hop through `project_id`.
    ProjectOwner,
    /// Two hops through `task_id`, then the task's project.
    TaskOwner,
}

impl Ownership {
    /// SQL condition restricting rows to the organization bound as `$1`.
    /// Expects the scoped table aliased as `p` (projects), `t` (tasks) or `c` (comments).
    pub fn tenant_predicate(self) -> &'static str {
        match self {
            Ownership::DirectOwner => "p.organization_id = $1",
            Ownership::ProjectOwner => {
                "t.project_id IN (SELECT sp.id FROM projects sp WHERE sp.organization_id = $1)"
            }
            Ownership::TaskOwner => {
                "c.task_id IN (SELECT st.id FROM tasks st \
                 JOIN projects sp ON sp.id = st.project_id WHERE sp.organization_id = $1)"
            }
        }
    }
}

pub trait Scoped {
    /// Name used in denial messages.
    const KIND: &'static str;
    /// `None` for types with no path to an organization.
    const OWNERSHIP: Option<Ownership>;

    /// Root of this entity's ownership chain.
    fn owning_organization(&self) -> Option<Uuid>;
}

impl Scoped for Project {
    const KIND: &'static str = "project";
    const OWNERSHIP: Option<Ownership> = Some(Ownership::DirectOwner);

    fn owning_organization(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }
}

impl Scoped for Task {
    const KIND: &'static str = "task";
    const OWNERSHIP: Option<Ownership> = Some(Ownership::ProjectOwner);

    // `organization_id` is the project's, joined in by the store.
    fn owning_organization(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }
}

impl Scoped for Comment {
    const KIND: &'static str = "comment";
    const OWNERSHIP: Option<Ownership> = Some(Ownership::TaskOwner);

    fn owning_organization(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }
}

/// Predicate the store applies to narrow a list query of `T` to one tenant.
pub fn store_predicate<T: Scoped>() -> Option<&'static str> {
    T::OWNERSHIP.map(Ownership::tenant_predicate)
}

/// An absent tenant permits everything.
// TODO: switch to fail-closed once product signs off on rejecting unscoped reads.
pub fn is_permitted<T: Scoped>(entity: &T, tenant: Option<&Organization>) -> bool {
    match tenant {
        None => true,
        Some(org) => T::OWNERSHIP.is_some() && entity.owning_organization() == Some(org.id),
    }
}

pub fn authorize<T: Scoped>(entity: &T, tenant: Option<&Organization>) -> Result<(), AppError> {
    if is_permitted(entity, tenant) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Access denied to this {}", T::KIND)))
    }
}

/// Check a caller-named organization against the request's tenant.
pub fn authorize_organization(
    organization_id: Uuid,
    tenant: Option<&Organization>,
) -> Result<(), AppError> {
    match tenant {
        Some(org) if org.id != organization_id => Err(AppError::Forbidden(
            "Access denied to this organization".to_string(),
        )),
        _ => Ok(()),
    }
}

pub fn filter<T: Scoped>(items: Vec<T>, tenant: Option<&Organization>) -> Vec<T> {
    if T::OWNERSHIP.is_none() {
        return Vec::new();
    }
    match tenant {
        None => items,
        Some(org) => items
            .into_iter()
            .filter(|item| item.owning_organization() == Some(org.id))
            .collect(),
    }
}

/// Mutations that depend on a tenant need it to exist and be active.
pub fn require_active(organization: Option<&Organization>) -> Result<&Organization, AppError> {
    match organization {
        None => Err(AppError::Forbidden("Organization not found".to_string())),
        Some(org) if !org.is_active => {
            Err(AppError::Forbidden("Organization is not active".to_string()))
        }
        Some(org) => Ok(org),
    }
}
