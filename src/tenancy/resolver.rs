use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sqlx::PgPool;
use uuid::Uuid;

use super::{TENANT_ID_HEADER, TENANT_ID_PARAM, TENANT_SLUG_HEADER, TENANT_SLUG_PARAM, TenantContext};
use crate::db;
use crate::error::AppError;
use crate::models::Organization;
use crate::state::SharedState;

/// What the caller told us about its tenant, before any lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantHint {
    Slug(String),
    Id(String),
}

impl TenantHint {
    /// First match wins: slug header, id header, slug param, id param.
    /// Empty values count as absent.
    pub fn from_request(headers: &HeaderMap, query: Option<&str>) -> Option<Self> {
        if let Some(slug) = header_value(headers, TENANT_SLUG_HEADER) {
            return Some(TenantHint::Slug(slug));
        }
        if let Some(id) = header_value(headers, TENANT_ID_HEADER) {
            return Some(TenantHint::Id(id));
        }

        let query = query.unwrap_or_default();
        if let Some(slug) = query_value(query, TENANT_SLUG_PARAM) {
            return Some(TenantHint::Slug(slug));
        }
        query_value(query, TENANT_ID_PARAM).map(TenantHint::Id)
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn query_value(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Look up the active organization a hint names. Unknown, inactive and
/// malformed ids all resolve to `None`; only store failures are errors.
pub async fn resolve(pool: &PgPool, hint: &TenantHint) -> Result<Option<Organization>, sqlx::Error> {
    let organization = match hint {
        TenantHint::Slug(slug) => db::organizations::find_active_by_slug(pool, slug).await?,
        TenantHint::Id(raw) => match Uuid::parse_str(raw) {
            Ok(id) => db::organizations::find_active_by_id(pool, id).await?,
            Err(_) => None,
        },
    };

    if organization.is_none() {
        tracing::debug!(?hint, "No active organization for tenant hint");
    }

    Ok(organization)
}

/// Middleware that attaches a [`TenantContext`] to every request and echoes
/// the resolved tenant back in the response headers.
pub async fn resolve_tenant(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Response {
    let organization = match TenantHint::from_request(req.headers(), req.uri().query()) {
        Some(hint) => match resolve(&state.pool, &hint).await {
            Ok(organization) => organization,
            Err(e) => return AppError::Database(e).into_response(),
        },
        None => None,
    };

    let echo = organization
        .as_ref()
        .map(|org| (org.id.to_string(), org.slug.clone()));
    req.extensions_mut().insert(TenantContext::new(organization));

    let mut response = next.run(req).await;

    if let Some((id, slug)) = echo {
        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&id) {
            headers.insert(HeaderName::from_static(TENANT_ID_HEADER), value);
        }
        if let Ok(value) = HeaderValue::from_str(&slug) {
            headers.insert(HeaderName::from_static(TENANT_SLUG_HEADER), value);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn slug_header_wins_over_everything() {
        let h = headers(&[("x-tenant-slug", "acme"), ("x-tenant-id", "123")]);
        let hint = TenantHint::from_request(&h, Some("tenant_slug=other&tenant_id=456"));
        assert_eq!(hint, Some(TenantHint::Slug("acme".to_string())));
    }

    #[test]
    fn id_header_wins_over_query_params() {
        let h = headers(&[("x-tenant-id", "123")]);
        let hint = TenantHint::from_request(&h, Some("tenant_slug=other"));
        assert_eq!(hint, Some(TenantHint::Id("123".to_string())));
    }

    #[test]
    fn query_slug_before_query_id() {
        let hint = TenantHint::from_request(&HeaderMap::new(), Some("tenant_id=9&tenant_slug=acme"));
        assert_eq!(hint, Some(TenantHint::Slug("acme".to_string())));

        let hint = TenantHint::from_request(&HeaderMap::new(), Some("tenant_id=9"));
        assert_eq!(hint, Some(TenantHint::Id("9".to_string())));
    }

    #[test]
    fn empty_values_are_absent() {
        let h = headers(&[("x-tenant-slug", "")]);
        let hint = TenantHint::from_request(&h, Some("tenant_slug=&tenant_id=7"));
        assert_eq!(hint, Some(TenantHint::Id("7".to_string())));
        assert_eq!(TenantHint::from_request(&HeaderMap::new(), None), None);
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let hint = TenantHint::from_request(&HeaderMap::new(), Some("tenant_slug=acme%2Dcorp"));
        assert_eq!(hint, Some(TenantHint::Slug("acme-corp".to_string())));
    }
}
