use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::TenantContext;
use crate::config::TenancyConfig;
use crate::error::AppError;
use crate::state::SharedState;

pub const TENANT_REQUIRED_ERROR: &str = "Organization context required";
pub const TENANT_REQUIRED_MESSAGE: &str =
    "Please provide organization via X-Tenant-Slug header or tenant_slug parameter";

/// Whether `path` is `prefix` itself or lies beneath it, segment-wise.
pub fn path_under(path: &str, prefix: &str) -> bool {
    let root = prefix.trim_end_matches('/');
    if root.is_empty() {
        return true;
    }
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Exempt paths and non-API traffic never need a tenant.
pub fn requires_tenant(path: &str, config: &TenancyConfig) -> bool {
    if config
        .exempt_prefixes
        .iter()
        .any(|prefix| path_under(path, prefix))
    {
        return false;
    }
    path_under(path, &config.api_prefix)
}

pub fn check(path: &str, tenant: &TenantContext, config: &TenancyConfig) -> Result<(), AppError> {
    if requires_tenant(path, config) && !tenant.is_resolved() {
        return Err(AppError::TenantRequired);
    }
    Ok(())
}

/// Runs after [`super::resolver::resolve_tenant`]; short-circuits before the
/// handler when a protected path has no tenant.
pub async fn require_tenant(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let tenant = req
        .extensions()
        .get::<TenantContext>()
        .cloned()
        .unwrap_or_default();

    if let Err(e) = check(req.uri().path(), &tenant, &state.config.tenancy) {
        tracing::debug!(path = %req.uri().path(), "Rejected request without tenant context");
        return e.into_response();
    }

    next.run(req).await
}
