use crate::{backend::BackendRef, cluster::Cluster, labels::Selector, report::Report};
use anyhow::Result;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::fmt;
use tracing::debug;

/// A hardening property expected of internet-facing workloads.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    /// The pod must set `runAsNonRoot: true`.
    RunAsNonRoot,
    /// Each container must set `allowPrivilegeEscalation: false`.
    AllowPrivilegeEscalation,
    /// Each container must set `readOnlyRootFilesystem: true`.
    ReadOnlyRootFilesystem,
}

/// A missing hardening property on a pod or one of its containers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub property: Property,
    pub pod: String,
    /// Set for container-level properties.
    pub container: Option<String>,
}

/// Which of a service's pods are inspected.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Sampling {
    /// Only the first pod returned stands in for the workload.
    #[default]
    FirstPod,
    /// Every matching pod is inspected.
    AllPods,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No pods matched; the service could not be audited.
    NoPods,
    Inspected { pods: usize, findings: usize },
}

// === impl Property ===

impl Property {
    fn problem(&self) -> &'static str {
        match self {
            Self::RunAsNonRoot => "is not set to true",
            Self::AllowPrivilegeEscalation => "is not set to false",
            Self::ReadOnlyRootFilesystem => "is not enabled",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RunAsNonRoot => "RunAsNonRoot",
            Self::AllowPrivilegeEscalation => "AllowPrivilegeEscalation",
            Self::ReadOnlyRootFilesystem => "ReadOnlyRootFilesystem",
        };
        write!(f, "{name} {}", self.problem())
    }
}

// === impl Finding ===

impl Finding {
    fn pod(property: Property, pod: &str) -> Self {
        Self {
            property,
            pod: pod.to_string(),
            container: None,
        }
    }

    fn container(property: Property, pod: &str, container: &str) -> Self {
        Self {
            property,
            pod: pod.to_string(),
            container: Some(container.to_string()),
        }
    }
}

/// Checks a pod's security contexts.
///
/// An absent security context, or an absent flag within one, counts as the
/// property being missing.
pub fn check_pod(pod: &Pod) -> Vec<Finding> {
    let name = pod.name_any();
    let mut findings = Vec::new();
    let Some(spec) = pod.spec.as_ref() else {
        findings.push(Finding::pod(Property::RunAsNonRoot, &name));
        return findings;
    };

    let run_as_non_root = spec
        .security_context
        .as_ref()
        .and_then(|sc| sc.run_as_non_root);
    if run_as_non_root != Some(true) {
        findings.push(Finding::pod(Property::RunAsNonRoot, &name));
    }

    for container in &spec.containers {
        let sc = container.security_context.as_ref();
        if sc.and_then(|sc| sc.allow_privilege_escalation) != Some(false) {
            findings.push(Finding::container(
                Property::AllowPrivilegeEscalation,
                &name,
                &container.name,
            ));
        }
        if sc.and_then(|sc| sc.read_only_root_filesystem) != Some(true) {
            findings.push(Finding::container(
                Property::ReadOnlyRootFilesystem,
                &name,
                &container.name,
            ));
        }
    }

    findings
}

/// Audits the pods backing `backend`, reporting each finding as it is found.
pub async fn audit<C, R>(
    cluster: &C,
    backend: &BackendRef,
    selector: &Selector,
    sampling: Sampling,
    report: &mut R,
) -> Result<Outcome>
where
    C: Cluster + ?Sized,
    R: Report + ?Sized,
{
    let pods = cluster.list_pods(&backend.namespace, selector).await?;
    debug!(
        namespace = %backend.namespace,
        service = %backend.service,
        %selector,
        pods = pods.len(),
        "Listed pods"
    );
    if pods.is_empty() {
        report.no_pods(backend)?;
        return Ok(Outcome::NoPods);
    }

    let take = match sampling {
        Sampling::FirstPod => 1,
        Sampling::AllPods => pods.len(),
    };
    let mut findings = 0;
    for pod in pods.iter().take(take) {
        for finding in check_pod(pod) {
            report.finding(backend, &finding)?;
            findings += 1;
        }
    }
    report.audited(backend)?;

    Ok(Outcome::Inspected {
        pods: take,
        findings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, PodSecurityContext, PodSpec, SecurityContext};
    use kube::api::ObjectMeta;

    fn mk_pod(
        name: &str,
        pod_sc: Option<PodSecurityContext>,
        containers: Vec<(&str, Option<SecurityContext>)>,
    ) -> Pod {
        Pod {
            metadata: ObjectMeta {
                namespace: Some("shop".to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                security_context: pod_sc,
                containers: containers
                    .into_iter()
                    .map(|(name, security_context)| Container {
                        name: name.to_string(),
                        security_context,
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn hardened() -> SecurityContext {
        SecurityContext {
            allow_privilege_escalation: Some(false),
            read_only_root_filesystem: Some(true),
            ..Default::default()
        }
    }

    fn non_root() -> Option<PodSecurityContext> {
        Some(PodSecurityContext {
            run_as_non_root: Some(true),
            ..Default::default()
        })
    }

    #[test]
    fn no_security_context() {
        let pod = mk_pod("api-0", None, vec![("api", None), ("proxy", None)]);
        assert_eq!(
            check_pod(&pod),
            vec![
                Finding::pod(Property::RunAsNonRoot, "api-0"),
                Finding::container(Property::AllowPrivilegeEscalation, "api-0", "api"),
                Finding::container(Property::ReadOnlyRootFilesystem, "api-0", "api"),
                Finding::container(Property::AllowPrivilegeEscalation, "api-0", "proxy"),
                Finding::container(Property::ReadOnlyRootFilesystem, "api-0", "proxy"),
            ]
        );
    }

    #[test]
    fn fully_hardened() {
        let pod = mk_pod(
            "edge-0",
            non_root(),
            vec![("edge", Some(hardened())), ("proxy", Some(hardened()))],
        );
        assert!(check_pod(&pod).is_empty());
    }

    #[test]
    fn explicit_insecure_values() {
        let pod = mk_pod(
            "api-0",
            Some(PodSecurityContext {
                run_as_non_root: Some(false),
                ..Default::default()
            }),
            vec![(
                "api",
                Some(SecurityContext {
                    allow_privilege_escalation: Some(true),
                    read_only_root_filesystem: Some(false),
                    ..Default::default()
                }),
            )],
        );
        let properties = check_pod(&pod)
            .into_iter()
            .map(|f| f.property)
            .collect::<Vec<_>>();
        assert_eq!(
            properties,
            vec![
                Property::RunAsNonRoot,
                Property::AllowPrivilegeEscalation,
                Property::ReadOnlyRootFilesystem,
            ]
        );
    }

    #[test]
    fn absent_flags_are_missing() {
        let pod = mk_pod(
            "api-0",
            Some(PodSecurityContext::default()),
            vec![(
                "api",
                Some(SecurityContext {
                    read_only_root_filesystem: Some(true),
                    ..Default::default()
                }),
            )],
        );
        assert_eq!(
            check_pod(&pod),
            vec![
                Finding::pod(Property::RunAsNonRoot, "api-0"),
                Finding::container(Property::AllowPrivilegeEscalation, "api-0", "api"),
            ]
        );
    }

    #[test]
    fn property_display() {
        assert_eq!(
            Property::RunAsNonRoot.to_string(),
            "RunAsNonRoot is not set to true"
        );
        assert_eq!(
            Property::AllowPrivilegeEscalation.to_string(),
            "AllowPrivilegeEscalation is not set to false"
        );
        assert_eq!(
            Property::ReadOnlyRootFilesystem.to_string(),
            "ReadOnlyRootFilesystem is not enabled"
        );
    }
}
