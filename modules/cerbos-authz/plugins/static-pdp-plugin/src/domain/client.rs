//! `PdpClient` implementation for the static PDP plugin.

use async_trait::async_trait;
use cerbos_authz_sdk::{CheckResourcesResult, PdpClient, PdpError, Principal, ResourceAction};

use super::service::Service;

#[async_trait]
impl PdpClient for Service {
    async fn check_resources(
        &self,
        principal: Principal,
        resources: Vec<ResourceAction>,
    ) -> Result<CheckResourcesResult, PdpError> {
        tracing::debug!(
            principal_id = %principal.id,
            mode = ?self.mode(),
            resources = resources.len(),
            "static PDP evaluating"
        );
        Ok(self.evaluate(&principal, &resources))
    }
}
