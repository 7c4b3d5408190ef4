use crate::{cluster::Cluster, labels::Selector};
use anyhow::Result;
use tracing::debug;

const EXTERNAL_NAME: &str = "ExternalName";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// The service is backed by the pods matching its selector.
    Keep(Selector),
    Skip(SkipReason),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The service no longer exists.
    NotFound,
    /// The service is an `ExternalName` alias and has no pods.
    ExternalName,
}

/// Determines whether the named service can be audited.
///
/// A missing service is a stale reference and is skipped; any other API
/// error is returned.
pub async fn classify<C>(cluster: &C, namespace: &str, service: &str) -> Result<Classification>
where
    C: Cluster + ?Sized,
{
    let Some(svc) = cluster.get_service(namespace, service).await? else {
        debug!(%namespace, %service, "Service not found");
        return Ok(Classification::Skip(SkipReason::NotFound));
    };

    let spec = svc.spec.unwrap_or_default();
    if spec.type_.as_deref() == Some(EXTERNAL_NAME) {
        debug!(%namespace, %service, "Skipping ExternalName service");
        return Ok(Classification::Skip(SkipReason::ExternalName));
    }

    Ok(Classification::Keep(spec.selector.into()))
}
