// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resources owned by other operators; only the fields we read are modelled.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// A cluster registered with the hub
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "cluster.open-cluster-management.io", version = "v1", kind = "ManagedCluster")]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub_accepts_client: Option<bool>,
}

/// Disaster recovery policy spanning two clusters
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "ramendr.openshift.io", version = "v1alpha1", kind = "DRPolicy")]
#[serde(rename_all = "camelCase")]
pub struct DRPolicySpec {
    #[serde(default)]
    pub dr_clusters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling_interval: Option<String>,
}

/// OpenShift route exposing the object storage gateway
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "route.openshift.io", version = "v1", kind = "Route")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    #[serde(default)]
    pub host: String,
}
