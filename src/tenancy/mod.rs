//! Per-request tenant scoping.
//!
//! A request flows through [`resolver::resolve_tenant`], which attaches a
//! [`TenantContext`] to the request, then through [`gate::require_tenant`],
//! which rejects protected paths that resolved no tenant. Handlers read the
//! context through the extractor below and call into [`scope`] to authorize
//! single entities and filter collections.

pub mod gate;
pub mod resolver;
pub mod scope;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Organization;

pub const TENANT_SLUG_HEADER: &str = "x-tenant-slug";
pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const TENANT_SLUG_PARAM: &str = "tenant_slug";
pub const TENANT_ID_PARAM: &str = "tenant_id";

/// The tenant a request is scoped to, resolved once before any handler runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantContext(Option<Organization>);

impl TenantContext {
    pub fn new(organization: Option<Organization>) -> Self {
        Self(organization)
    }

    pub fn organization(&self) -> Option<&Organization> {
        self.0.as_ref()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|org| org.id)
    }

    pub fn is_resolved(&self) -> bool {
        self.0.is_some()
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Tenant resolver is not installed".to_string()))
    }
}
