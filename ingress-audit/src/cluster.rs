use crate::labels::Selector;
use anyhow::{Context, Result};
use k8s_openapi::api::{
    core::v1::{Pod, Service},
    networking::v1::Ingress,
};
use kube::{
    api::{Api, ListParams},
    config::{KubeConfigOptions, Kubeconfig, KubeconfigError},
    Client, Config,
};
use std::{env, ffi::OsStr, path::PathBuf};
use thiserror::Error;
use tracing::debug;

/// The read-only view of the Kubernetes API used by an audit.
#[async_trait::async_trait]
pub trait Cluster {
    /// Lists ingress resources in all namespaces.
    async fn list_ingresses(&self) -> Result<Vec<Ingress>>;

    /// Lists services in all namespaces.
    async fn list_services(&self) -> Result<Vec<Service>>;

    /// Gets a service, returning `None` if it does not exist.
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>>;

    /// Lists the pods in `namespace` matching `selector`.
    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>>;
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not determine home directory for the default kubeconfig")]
    NoKubeconfig,

    #[error("no kubeconfig paths given")]
    EmptyKubeconfig,

    #[error("failed to read kubeconfig {}: {source}", .path.display())]
    ReadKubeconfig {
        path: PathBuf,
        #[source]
        source: KubeconfigError,
    },

    #[error("failed to load client configuration: {0}")]
    LoadKubeconfig(#[from] KubeconfigError),

    #[error("failed to build client: {0}")]
    Client(#[from] kube::Error),
}

/// A [`Cluster`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

/// Returns the kubeconfig in the invoking user's home directory.
pub fn default_kubeconfig() -> Result<PathBuf, Error> {
    let home = dirs::home_dir().ok_or(Error::NoKubeconfig)?;
    Ok(home.join(".kube").join("config"))
}

/// Reads and merges the kubeconfig files in `paths`, a list separated like
/// `KUBECONFIG`. Earlier files take precedence.
pub fn read_kubeconfig(paths: &OsStr) -> Result<Kubeconfig, Error> {
    let mut merged: Option<Kubeconfig> = None;
    for path in env::split_paths(paths).filter(|p| !p.as_os_str().is_empty()) {
        debug!(path = %path.display(), "Loading kubeconfig");
        let next = Kubeconfig::read_from(&path)
            .map_err(|source| Error::ReadKubeconfig { path, source })?;
        merged = Some(match merged {
            Some(kubeconfig) => kubeconfig.merge(next)?,
            None => next,
        });
    }
    merged.ok_or(Error::EmptyKubeconfig)
}

// === impl KubeCluster ===

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the kubeconfig files in `paths`, using `context`
    /// or the merged kubeconfig's current context.
    pub async fn from_kubeconfig(paths: &OsStr, context: Option<String>) -> Result<Self, Error> {
        let kubeconfig = read_kubeconfig(paths)?;
        let opts = KubeConfigOptions {
            context,
            ..Default::default()
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &opts).await?;
        Ok(Self::new(Client::try_from(config)?))
    }

    /// Builds a client from the environment (e.g. in-cluster configuration).
    pub async fn infer() -> Result<Self, Error> {
        Ok(Self::new(Client::try_default().await?))
    }
}

#[async_trait::async_trait]
impl Cluster for KubeCluster {
    async fn list_ingresses(&self) -> Result<Vec<Ingress>> {
        let api = Api::<Ingress>::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .context("failed to list ingresses")?;
        Ok(list.items)
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        let api = Api::<Service>::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .context("failed to list services")?;
        Ok(list.items)
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        let api = Api::<Service>::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .with_context(|| format!("failed to get service {namespace}/{name}"))
    }

    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>> {
        let api = Api::<Pod>::namespaced(self.client.clone(), namespace);
        let mut params = ListParams::default();
        if let Some(query) = selector.to_query() {
            params = params.labels(&query);
        }
        let list = api
            .list(&params)
            .await
            .with_context(|| format!("failed to list pods in {namespace} matching {selector}"))?;
        Ok(list.items)
    }
}
