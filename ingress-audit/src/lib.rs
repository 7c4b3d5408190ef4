#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
pub mod audit;
pub mod backend;
pub mod classify;
pub mod cluster;
pub mod ingress;
pub mod labels;
pub mod load_balancer;
pub mod report;


pub use self::{
    args::Args,
    audit::{Finding, Outcome, Property, Sampling},
    backend::{BackendRef, Backends, Source},
    classify::{Classification, SkipReason},
    cluster::{Cluster, KubeCluster},
    labels::Selector,
    report::{Report, TextReport},
};
use anyhow::Result;
use tracing::{debug, info};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub sampling: Sampling,

    /// Deduplicate load-balancer services against ingress backends.
    pub dedup_load_balancers: bool,
}

/// Totals for a completed run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub ingresses: usize,
    pub candidates: usize,
    pub audited: usize,
    /// Pods inspected across all audited backends.
    pub pods: usize,
    pub skipped: usize,
    pub findings: usize,
}

/// Discovers internet-facing services and audits the pods backing them.
///
/// Any API or report error aborts the run.
pub async fn run<C, R>(cluster: &C, opts: Options, report: &mut R) -> Result<Summary>
where
    C: Cluster + ?Sized,
    R: Report + ?Sized,
{
    let ingresses = cluster.list_ingresses().await?;
    report.ingresses(ingresses.len())?;

    let mut backends = Backends::default();
    ingress::collect(&ingresses, &mut backends);
    debug!(backends = backends.len(), "Resolved ingress backends");

    let services = cluster.list_services().await?;
    load_balancer::collect(&services, &mut backends, opts.dedup_load_balancers);

    let mut summary = Summary {
        ingresses: ingresses.len(),
        candidates: backends.len(),
        ..Default::default()
    };
    report.candidates(summary.candidates)?;

    for backend in backends {
        let selector = match &backend.source {
            Source::LoadBalancer { selector } => selector.clone(),
            Source::Ingress { .. } => {
                match classify::classify(cluster, &backend.namespace, &backend.service).await? {
                    Classification::Keep(selector) => selector,
                    Classification::Skip(SkipReason::NotFound) => {
                        report.not_found(&backend)?;
                        summary.skipped += 1;
                        continue;
                    }
                    Classification::Skip(SkipReason::ExternalName) => {
                        report.external_name(&backend)?;
                        summary.skipped += 1;
                        continue;
                    }
                }
            }
        };

        match audit::audit(cluster, &backend, &selector, opts.sampling, &mut *report).await? {
            Outcome::NoPods => summary.skipped += 1,
            Outcome::Inspected { pods, findings } => {
                summary.audited += 1;
                summary.pods += pods;
                summary.findings += findings;
            }
        }
    }

    info!(
        ingresses = summary.ingresses,
        candidates = summary.candidates,
        audited = summary.audited,
        pods = summary.pods,
        skipped = summary.skipped,
        findings = summary.findings,
        "Audit complete"
    );
    Ok(summary)
}
