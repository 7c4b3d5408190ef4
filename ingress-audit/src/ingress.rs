use crate::backend::{BackendRef, Backends, Source};
use k8s_openapi::api::networking::v1::{Ingress, IngressBackend};
use kube::ResourceExt;
use tracing::{debug, warn};

/// Records every service referenced by `ingresses`, either as a default
/// backend or as the backend of an HTTP path rule on any host.
///
/// A service is recorded at most once per namespace; the first ingress to
/// reference it is kept as its source.
pub fn collect(ingresses: &[Ingress], backends: &mut Backends) {
    for ingress in ingresses {
        let namespace = ingress.namespace().unwrap_or_default();
        let name = ingress.name_any();
        let Some(spec) = ingress.spec.as_ref() else {
            continue;
        };

        if let Some(default) = spec.default_backend.as_ref() {
            debug!(%namespace, ingress = %name, ?default, "Default backend defined");
            if let Some(service) = service_name(default) {
                insert(backends, &namespace, &name, None, service);
            }
        }

        for rule in spec.rules.iter().flatten() {
            let Some(http) = rule.http.as_ref() else {
                debug!(%namespace, ingress = %name, host = ?rule.host, "Rule has no HTTP paths");
                continue;
            };
            for path in &http.paths {
                if let Some(service) = service_name(&path.backend) {
                    insert(backends, &namespace, &name, rule.host.clone(), service);
                }
            }
        }
    }
}

fn service_name(backend: &IngressBackend) -> Option<&str> {
    match backend.service.as_ref() {
        Some(svc) => Some(svc.name.as_str()),
        None => {
            warn!(resource = ?backend.resource, "Ignoring non-service backend");
            None
        }
    }
}

fn insert(
    backends: &mut Backends,
    namespace: &str,
    ingress: &str,
    host: Option<String>,
    service: &str,
) {
    let inserted = backends.insert_unique(BackendRef {
        source: Source::Ingress {
            name: ingress.to_string(),
            host,
        },
        namespace: namespace.to_string(),
        service: service.to_string(),
    });
    if !inserted {
        debug!(%namespace, %ingress, %service, "Backend already recorded");
    }
}
