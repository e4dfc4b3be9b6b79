//! Tenant scoping.

use ghostflow_protocols::StoreError;

/// The tenant predicate carried by every store call.
///
/// The service-layer equivalent of row security: a scope is either bound to
/// one org or explicitly asserted as a service role. There is no way to
/// construct an unscoped, non-service value, so a query without a tenant
/// predicate cannot reach the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgScope {
    org_id: Option<String>,
}

impl OrgScope {
    /// Scope to a single tenant. Fails closed on an empty org id.
    pub fn tenant(org_id: impl Into<String>) -> Result<Self, StoreError> {
        let org_id = org_id.into();
        if org_id.trim().is_empty() {
            return Err(StoreError::MissingOrgScope);
        }
        Ok(Self { org_id: Some(org_id) })
    }

    /// Explicitly asserted service role; sees every tenant. Only the
    /// ingestion path uses this, to persist batches spanning orgs.
    pub fn service() -> Self {
        Self { org_id: None }
    }

    pub fn org_id(&self) -> Option<&str> {
        self.org_id.as_deref()
    }

    pub fn is_service(&self) -> bool {
        self.org_id.is_none()
    }

    /// Whether this scope may touch a row owned by `row_org`.
    pub fn authorizes(&self, row_org: &str) -> bool {
        match &self.org_id {
            Some(org) => org == row_org,
            None => true,
        }
    }

    /// Audit point: error unless the row is visible to this scope.
    pub fn require(&self, row_org: &str) -> Result<(), StoreError> {
        if self.authorizes(row_org) {
            Ok(())
        } else {
            Err(StoreError::MissingOrgScope)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_scope_requires_org() {
        assert!(OrgScope::tenant("o1").is_ok());
        assert!(matches!(OrgScope::tenant(""), Err(StoreError::MissingOrgScope)));
        assert!(matches!(OrgScope::tenant("   "), Err(StoreError::MissingOrgScope)));
    }

    #[test]
    fn test_tenant_scope_authorizes_only_its_org() {
        let scope = OrgScope::tenant("o1").unwrap();
        assert!(scope.authorizes("o1"));
        assert!(!scope.authorizes("o2"));
        assert!(scope.require("o2").is_err());
    }

    #[test]
    fn test_service_scope_sees_everything() {
        let scope = OrgScope::service();
        assert!(scope.is_service());
        assert!(scope.authorizes("o1"));
        assert!(scope.authorizes("o2"));
    }
}
