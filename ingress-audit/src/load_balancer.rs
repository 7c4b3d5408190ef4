use crate::{
    backend::{BackendRef, Backends, Source},
    labels::Selector,
};
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tracing::{debug, warn};

const LOAD_BALANCER: &str = "LoadBalancer";

/// Records every `LoadBalancer` service as its own backend.
///
/// Unless `dedup` is set, load-balancer backends are recorded even when an
/// ingress already references the same service.
pub fn collect(services: &[Service], backends: &mut Backends, dedup: bool) {
    for svc in services {
        let Some(spec) = svc.spec.as_ref() else {
            continue;
        };
        if spec.type_.as_deref() != Some(LOAD_BALANCER) {
            continue;
        }

        let namespace = svc.namespace().unwrap_or_default();
        let name = svc.name_any();
        let selector = Selector::from(spec.selector.clone());
        if selector.is_empty() {
            warn!(%namespace, service = %name, "Load balancer has no selector; all pods in the namespace match");
        }

        let backend = BackendRef {
            source: Source::LoadBalancer { selector },
            namespace,
            service: name,
        };
        debug!(namespace = %backend.namespace, service = %backend.service, "Load balancer");
        if dedup {
            backends.insert_unique(backend);
        } else {
            backends.push(backend);
        }
    }
}
