//! Cluster access backed by a shared `kube::Client`.
//!
//! The client is created once at startup and shared read-only by every
//! decision. Counting lists object metadata only, so large namespaces are
//! not pulled into memory in full.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::ListParams;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::guard::{NamespaceLookup, ResourceCounter, ResourceKindQuery};

/// Namespace lookup through the API server
#[derive(Clone)]
pub struct KubeNamespaceLookup {
    client: Client,
}

impl KubeNamespaceLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NamespaceLookup for KubeNamespaceLookup {
    async fn get_namespace(&self, name: &str) -> Result<Namespace> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        Ok(api.get(name).await?)
    }
}

/// Counts objects of kind `K` in a namespace
pub struct KubeResourceCounter<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeResourceCounter<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }
}

#[async_trait]
impl<K> ResourceCounter for KubeResourceCounter<K>
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
    <K as Resource>::DynamicType: Default,
{
    async fn count(&self, namespace: &str) -> Result<usize> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list_metadata(&ListParams::default()).await?;
        Ok(list.items.len())
    }
}

fn query<K>(kind: &'static str, client: &Client) -> ResourceKindQuery
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
    <K as Resource>::DynamicType: Default,
{
    ResourceKindQuery::new(kind, Arc::new(KubeResourceCounter::<K>::new(client.clone())))
}

/// The monitored workload kinds, in reporting order
pub fn monitored_kinds(client: &Client) -> Vec<ResourceKindQuery> {
    vec![
        query::<Pod>("pods", client),
        query::<Service>("services", client),
        query::<ReplicaSet>("replicasets", client),
        query::<Deployment>("deployments", client),
        query::<StatefulSet>("statefulsets", client),
        query::<DaemonSet>("daemonsets", client),
        query::<Ingress>("ingresses", client),
        query::<HorizontalPodAutoscaler>("horizontalpodautoscalers", client),
    ]
}
