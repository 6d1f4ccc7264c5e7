use uuid::Uuid;

/// Record a tenant-scoped mutation. Called explicitly in handlers after the
/// store has committed the change.
pub fn log_event(organization_id: Uuid, action: &str, resource_type: &str, resource_id: Uuid) {
    tracing::info!(
        target: "worktrack::audit",
        %organization_id,
        action,
        resource_type,
        %resource_id,
        "audit event"
    );
}
