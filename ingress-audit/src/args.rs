use crate::{cluster, Options, Sampling, TextReport};
use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;
use tracing::{debug, warn};

/// Audit internet-facing services for pod security hardening
///
/// Services are internet-facing when they are referenced by an Ingress or are
/// of type LoadBalancer. Each is reported if its pods do not run as non-root,
/// allow privilege escalation, or have a writable root filesystem.
#[derive(Debug, Parser)]
#[clap(name = "ingress-audit", version, about)]
pub struct Args {
    /// Log filter. Logs are written to stdout alongside the report, so raising
    /// the level interleaves diagnostics with report lines
    #[clap(
        long,
        env = "INGRESS_AUDIT_LOG",
        default_value = "ingress_audit=warn,warn"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    /// Kubeconfig files, as a path list like KUBECONFIG (defaults to
    /// ~/.kube/config)
    #[clap(long, env = "KUBECONFIG")]
    kubeconfig: Option<OsString>,

    /// Kubeconfig context to use instead of the current context
    #[clap(long)]
    context: Option<String>,

    /// Inspect every pod backing a service rather than only the first
    #[clap(long)]
    all_pods: bool,

    /// Do not audit a LoadBalancer service again when an Ingress already
    /// references it
    #[clap(long)]
    dedup_load_balancers: bool,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            kubeconfig,
            context,
            all_pods,
            dedup_load_balancers,
        } = self;

        log_format.try_init(log_level)?;

        let kubeconfig = match kubeconfig {
            Some(path) => Some(path),
            None => match cluster::default_kubeconfig() {
                Ok(path) => Some(path.into_os_string()),
                Err(error) => {
                    warn!(%error, "Falling back to inferred client configuration");
                    None
                }
            },
        };
        let cluster = match kubeconfig {
            Some(paths) => cluster::KubeCluster::from_kubeconfig(&paths, context).await?,
            None => cluster::KubeCluster::infer().await?,
        };

        let opts = Options {
            sampling: if all_pods {
                Sampling::AllPods
            } else {
                Sampling::FirstPod
            },
            dedup_load_balancers,
        };
        debug!(?opts, "Starting audit");

        let mut report = TextReport::stdout();
        crate::run(&cluster, opts, &mut report).await?;
        Ok(())
    }
}
