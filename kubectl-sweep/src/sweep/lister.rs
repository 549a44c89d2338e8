//! Chunked pod listing and the API seam the sweep runs against.

use k8s_openapi::{Resource as _, api::core::v1::Pod};
use kube::{
    Api,
    api::{ApiResource, DeleteParams, DynamicObject, ListParams},
    core::TypeMeta,
};
use snafu::ResultExt;

use crate::{
    ext::{PodExt, PodRef},
    sweep::error::{self, Error},
};

/// Where pods are listed from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ListScope {
    /// A single namespace, `/api/v1/namespaces/{namespace}/pods`.
    Namespace(String),
    /// Every namespace, `/api/v1/pods`.
    AllNamespaces,
}

impl ListScope {
    pub fn describe(&self) -> String {
        match self {
            Self::Namespace(namespace) => format!("namespace {namespace}"),
            Self::AllNamespaces => "all namespaces".to_string(),
        }
    }
}

/// One page of a chunked list response.
///
/// Items stay untyped so that a single malformed object does not fail the
/// whole page.
#[derive(Clone, Debug, Default)]
pub struct PodPage {
    /// Objects in the order the API server returned them.
    pub items: Vec<DynamicObject>,
    /// Token for the next page, `None` once the list is exhausted.
    pub continue_token: Option<String>,
}

/// Pod operations `run` depends on.
pub trait PodApi {
    async fn list_page(&self, scope: &ListScope, params: &ListParams)
    -> Result<PodPage, kube::Error>;

    async fn delete(
        &self,
        namespace: &str,
        pod_name: &str,
        params: &DeleteParams,
    ) -> Result<(), kube::Error>;
}

/// [`PodApi`] backed by a live Kubernetes client.
#[derive(Clone)]
pub struct KubePodApi {
    kube_client: kube::Client,
    resource: ApiResource,
}

impl From<kube::Client> for KubePodApi {
    fn from(kube_client: kube::Client) -> Self {
        Self { kube_client, resource: ApiResource::erase::<Pod>(&()) }
    }
}

impl PodApi for KubePodApi {
    async fn list_page(
        &self,
        scope: &ListScope,
        params: &ListParams,
    ) -> Result<PodPage, kube::Error> {
        let api = match scope {
            ListScope::Namespace(namespace) => Api::<DynamicObject>::namespaced_with(
                self.kube_client.clone(),
                namespace,
                &self.resource,
            ),
            ListScope::AllNamespaces => {
                Api::<DynamicObject>::all_with(self.kube_client.clone(), &self.resource)
            }
        };
        let list = api.list(params).await?;
        Ok(PodPage {
            continue_token: list.metadata.continue_.filter(|token| !token.is_empty()),
            items: list.items,
        })
    }

    async fn delete(
        &self,
        namespace: &str,
        pod_name: &str,
        params: &DeleteParams,
    ) -> Result<(), kube::Error> {
        let api = Api::<Pod>::namespaced(self.kube_client.clone(), namespace);
        let _resource = api.delete(pod_name, params).await?;
        Ok(())
    }
}

/// Fetches every pod in `scope`, `chunk_size` items per request.
///
/// A `chunk_size` of zero requests everything at once. Objects that cannot be
/// parsed as pods are logged and skipped. Any failed request aborts the
/// listing.
#[allow(clippy::future_not_send)]
pub async fn list_pods<A>(
    api: &A,
    scope: &ListScope,
    base_params: &ListParams,
    chunk_size: u32,
) -> Result<Vec<(PodRef, Pod)>, Error>
where
    A: PodApi,
{
    let mut pods = Vec::new();
    let mut continue_token: Option<String> = None;
    let mut page_count = 0_usize;

    loop {
        let mut params = base_params.clone();
        if chunk_size > 0 {
            params = params.limit(chunk_size);
        }
        if let Some(token) = continue_token.as_deref() {
            params = params.continue_token(token);
        }

        let page = api
            .list_page(scope, &params)
            .await
            .with_context(|_| error::ListPodsSnafu { scope: scope.describe() })?;
        page_count += 1;

        for mut object in page.items {
            // Items of a list response usually omit their own apiVersion and kind.
            if object.types.is_none() {
                object.types = Some(TypeMeta {
                    api_version: Pod::API_VERSION.to_string(),
                    kind: Pod::KIND.to_string(),
                });
            }
            let object_name = object.metadata.name.clone().unwrap_or_default();
            match object.try_parse::<Pod>() {
                Ok(pod) => pods.push((pod.to_pod_ref(), pod)),
                Err(err) => {
                    tracing::warn!("Skipping object {object_name} which is not a valid pod: {err}");
                }
            }
        }

        match page.continue_token {
            Some(token) if chunk_size > 0 => continue_token = Some(token),
            _ => break,
        }
    }

    tracing::debug!("Listed {} pods in {} in {page_count} page(s)", pods.len(), scope.describe());
    Ok(pods)
}
