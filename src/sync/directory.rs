// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Indexed view of the live MirrorPeers on the hub.
//!
//! Pairings are kept sorted by name. Whenever several pairings could answer
//! a lookup, the one with the smallest name wins.

use crate::error::{Result, SyncError};
use crate::types::mirror_peer::unordered_pair;
use crate::types::{ManagedCluster, MirrorPeer, StorageClusterRef};
use kube::{api::ListParams, Api, Client, ResourceExt};
use std::collections::HashMap;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default)]
pub struct PairingDirectory {
    pairings: Vec<MirrorPeer>,
    by_cluster: HashMap<String, Vec<usize>>,
    by_cluster_set: HashMap<(String, String), Vec<usize>>,
}

impl PairingDirectory {
    /// Build the index; pairings that are being deleted are left out
    pub fn from_pairings(pairings: Vec<MirrorPeer>) -> Self {
        let mut pairings: Vec<MirrorPeer> = pairings.into_iter().filter(|p| p.is_live()).collect();
        pairings.sort_by_key(|p| p.name_any());

        let mut by_cluster: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_cluster_set: HashMap<(String, String), Vec<usize>> = HashMap::new();

        for (idx, pairing) in pairings.iter().enumerate() {
            for item in &pairing.spec.items {
                let entry = by_cluster.entry(item.cluster_name.clone()).or_default();
                if !entry.contains(&idx) {
                    entry.push(idx);
                }
            }
            if let Some(set) = pairing.cluster_set() {
                by_cluster_set.entry(set).or_default().push(idx);
            }
        }

        Self {
            pairings,
            by_cluster,
            by_cluster_set,
        }
    }

    /// List all MirrorPeers on the hub and index them
    #[instrument(skip(client))]
    pub async fn load(client: &Client) -> Result<Self> {
        let api: Api<MirrorPeer> = Api::all(client.clone());
        let list = api.list(&ListParams::default()).await?;
        debug!("Loaded {} MirrorPeers", list.items.len());
        Ok(Self::from_pairings(list.items))
    }

    pub fn pairings(&self) -> &[MirrorPeer] {
        &self.pairings
    }

    pub fn is_empty(&self) -> bool {
        self.pairings.is_empty()
    }

    /// All live pairings naming `cluster`, in name order
    pub fn pairings_for_cluster<'a>(
        &'a self,
        cluster: &str,
    ) -> impl Iterator<Item = &'a MirrorPeer> + 'a {
        self.by_cluster
            .get(cluster)
            .into_iter()
            .flatten()
            .map(move |idx| &self.pairings[*idx])
    }

    /// Storage reference of `cluster` in the first pairing naming it
    pub fn resolve_storage_ref(&self, cluster: &str) -> Result<&StorageClusterRef> {
        self.pairings_for_cluster(cluster)
            .find_map(|p| p.peer_for_cluster(cluster))
            .map(|peer| &peer.storage_cluster_ref)
            .ok_or_else(|| {
                SyncError::NotFound(format!("no MirrorPeer references cluster {}", cluster))
            })
    }

    /// The pairing between exactly `cluster_a` and `cluster_b`, in any order
    pub fn resolve_pairing_for_cluster_set(
        &self,
        cluster_a: &str,
        cluster_b: &str,
    ) -> Result<&MirrorPeer> {
        self.by_cluster_set
            .get(&unordered_pair(cluster_a, cluster_b))
            .and_then(|idxs| idxs.first())
            .map(|idx| &self.pairings[*idx])
            .ok_or_else(|| {
                SyncError::NotFound(format!(
                    "no MirrorPeer for cluster set {}-{}",
                    cluster_a, cluster_b
                ))
            })
    }

    /// Structural validation of `pairing`, including collisions with the
    /// other pairings in this directory. Of several pairings naming the same
    /// cluster set only the first by name is accepted.
    pub fn validate_pairing(&self, pairing: &MirrorPeer) -> Result<()> {
        pairing.validate_spec()?;

        let Some(set) = pairing.cluster_set() else {
            return Ok(());
        };
        let name = pairing.name_any();

        let owner = self
            .by_cluster_set
            .get(&set)
            .into_iter()
            .flatten()
            .map(|idx| self.pairings[*idx].name_any())
            .chain(std::iter::once(name.clone()))
            .min();

        match owner {
            Some(owner) if owner != name => Err(SyncError::Validation(format!(
                "MirrorPeer {} pairs clusters {} and {} which are already paired by {}",
                name, set.0, set.1, owner
            ))),
            _ => Ok(()),
        }
    }
}

/// Every member of `pairing` must be a ManagedCluster known to the hub
#[instrument(skip(client, pairing), fields(mirror_peer = %pairing.name_any()))]
pub async fn validate_managed_clusters(client: &Client, pairing: &MirrorPeer) -> Result<()> {
    let api: Api<ManagedCluster> = Api::all(client.clone());
    for item in &pairing.spec.items {
        match api.get(&item.cluster_name).await {
            Ok(_) => {}
            Err(kube::Error::Api(err)) if err.code == 404 => {
                return Err(SyncError::Validation(format!(
                    "cluster {} of MirrorPeer {} is not a ManagedCluster",
                    item.cluster_name,
                    pairing.name_any()
                )));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
