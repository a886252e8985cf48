// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{Result, SyncError};
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A pairing of two managed clusters whose storage deployments replicate
/// to each other.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "multicluster.odf.openshift.io", version = "v1alpha1", kind = "MirrorPeer")]
#[serde(rename_all = "camelCase")]
pub struct MirrorPeerSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub peer_type: Option<String>,
    #[serde(default)]
    pub items: Vec<PeerRef>,
}

/// One member cluster of a pairing and the storage deployment on it
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeerRef {
    pub cluster_name: String,
    pub storage_cluster_ref: StorageClusterRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_client_ref: Option<StorageClientRef>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageClusterRef {
    pub name: String,
    pub namespace: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageClientRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl MirrorPeer {
    /// Deleting pairings no longer justify any mirrored secret
    pub fn is_live(&self) -> bool {
        self.metadata.deletion_timestamp.is_none()
    }

    /// Storage client pairings need no secret mirroring
    pub fn is_storage_client_type(&self) -> bool {
        self.spec
            .items
            .iter()
            .any(|p| p.storage_client_ref.is_some())
    }

    pub fn peer_for_cluster(&self, cluster_name: &str) -> Option<&PeerRef> {
        self.spec.items.iter().find(|p| p.cluster_name == cluster_name)
    }

    /// The cluster names of both members, sorted so the pair is unordered
    pub fn cluster_set(&self) -> Option<(String, String)> {
        match self.spec.items.as_slice() {
            [a, b] => Some(unordered_pair(&a.cluster_name, &b.cluster_name)),
            _ => None,
        }
    }

    /// Checks the structural invariants of a single pairing
    pub fn validate_spec(&self) -> Result<()> {
        let name = self.name_any();

        if self.spec.items.is_empty() {
            return Err(SyncError::Validation(format!(
                "MirrorPeer {} has an undefined spec",
                name
            )));
        }

        if self.spec.items.len() != 2 {
            return Err(SyncError::Validation(format!(
                "MirrorPeer {} must have exactly 2 items, found {}",
                name,
                self.spec.items.len()
            )));
        }

        let mut clusters = HashSet::new();
        for item in &self.spec.items {
            if !clusters.insert(item.cluster_name.as_str()) {
                return Err(SyncError::Validation(format!(
                    "MirrorPeer {} lists cluster {} more than once",
                    name, item.cluster_name
                )));
            }
        }

        for item in &self.spec.items {
            item.validate().map_err(|e| match e {
                SyncError::Validation(msg) => {
                    SyncError::Validation(format!("MirrorPeer {}: {}", name, msg))
                }
                other => other,
            })?;
        }

        Ok(())
    }
}

impl PeerRef {
    pub fn validate(&self) -> Result<()> {
        if self.cluster_name.is_empty() {
            return Err(SyncError::Validation("clusterName is empty".to_string()));
        }
        if self.storage_cluster_ref.name.is_empty() {
            return Err(SyncError::Validation(format!(
                "storageClusterRef.name is empty for cluster {}",
                self.cluster_name
            )));
        }
        if self.storage_cluster_ref.namespace.is_empty() {
            return Err(SyncError::Validation(format!(
                "storageClusterRef.namespace is empty for cluster {}",
                self.cluster_name
            )));
        }
        if let Some(client_ref) = &self.storage_client_ref {
            if client_ref.name.is_empty() {
                return Err(SyncError::Validation(format!(
                    "storageClientRef.name is empty for cluster {}",
                    self.cluster_name
                )));
            }
        }
        Ok(())
    }
}

pub fn unordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
