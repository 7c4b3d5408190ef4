use crate::labels::Selector;
use std::{
    collections::{btree_map, BTreeMap},
    iter,
};

/// Where an internet-facing backend was discovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Referenced by an `Ingress`' default backend or one of its path rules.
    Ingress {
        name: String,
        /// The rule's host; `None` for default backends and host-less rules.
        host: Option<String>,
    },

    /// A `Service` of type `LoadBalancer`. Its selector is known at discovery
    /// time, so it is not re-classified.
    LoadBalancer { selector: Selector },
}

/// A candidate ingress point: a service that receives external traffic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendRef {
    pub source: Source,
    pub namespace: String,
    pub service: String,
}

/// Discovered backends, keyed by namespace.
///
/// Within a namespace, backends are held in discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Backends(BTreeMap<String, Vec<BackendRef>>);

// === impl BackendRef ===

impl BackendRef {
    /// The name of the originating ingress or load-balancer service.
    pub fn source_name(&self) -> &str {
        match &self.source {
            Source::Ingress { name, .. } => name,
            Source::LoadBalancer { .. } => &self.service,
        }
    }
}

// === impl Backends ===

impl Backends {
    /// Returns true if a backend for `service` has already been recorded in
    /// `namespace`.
    pub fn contains(&self, namespace: &str, service: &str) -> bool {
        self.0
            .get(namespace)
            .map(|refs| refs.iter().any(|r| r.service == service))
            .unwrap_or(false)
    }

    /// Records `backend` unless its service is already present in its
    /// namespace. Returns whether it was inserted.
    pub fn insert_unique(&mut self, backend: BackendRef) -> bool {
        if self.contains(&backend.namespace, &backend.service) {
            return false;
        }
        self.push(backend);
        true
    }

    /// Records `backend` without a duplicate check.
    pub fn push(&mut self, backend: BackendRef) {
        self.0
            .entry(backend.namespace.clone())
            .or_default()
            .push(backend);
    }

    /// The total number of backends across all namespaces.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn namespace(&self, namespace: &str) -> &[BackendRef] {
        self.0.get(namespace).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterates over backends, namespace by namespace in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &BackendRef> + '_ {
        self.0.values().flatten()
    }
}

impl IntoIterator for Backends {
    type Item = BackendRef;
    type IntoIter = iter::Flatten<btree_map::IntoValues<String, Vec<BackendRef>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingress_ref(ns: &str, ingress: &str, svc: &str) -> BackendRef {
        BackendRef {
            source: Source::Ingress {
                name: ingress.to_string(),
                host: None,
            },
            namespace: ns.to_string(),
            service: svc.to_string(),
        }
    }

    #[test]
    fn insert_unique_per_namespace() {
        let mut backends = Backends::default();
        assert!(backends.insert_unique(ingress_ref("shop", "web", "api")));
        assert!(!backends.insert_unique(ingress_ref("shop", "admin", "api")));
        assert!(backends.insert_unique(ingress_ref("blog", "web", "api")));

        assert_eq!(backends.len(), 2);
        assert!(backends.contains("shop", "api"));
        assert!(backends.contains("blog", "api"));
        assert!(!backends.contains("shop", "cart"));
        assert_eq!(backends.namespace("shop")[0].source_name(), "web");
    }

    #[test]
    fn push_does_not_dedup() {
        let mut backends = Backends::default();
        backends.push(ingress_ref("shop", "web", "api"));
        backends.push(ingress_ref("shop", "web", "api"));
        assert_eq!(backends.len(), 2);
    }

    #[test]
    fn iterates_namespaces_in_order() {
        let mut backends = Backends::default();
        backends.push(ingress_ref("shop", "web", "b"));
        backends.push(ingress_ref("blog", "web", "a"));
        backends.push(ingress_ref("shop", "web", "c"));

        let order = backends
            .iter()
            .map(|r| format!("{}/{}", r.namespace, r.service))
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["blog/a", "shop/b", "shop/c"]);
        assert_eq!(backends.into_iter().count(), 3);
    }

    #[test]
    fn empty() {
        let backends = Backends::default();
        assert!(backends.is_empty());
        assert!(backends.namespace("shop").is_empty());
    }
}
