// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Matching of source secrets to pairing members

use crate::constants::keys;
use crate::types::PeerRef;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;

/// Whether `secret` is the source secret produced for `peer`: it must live
/// in the member's hub namespace and describe the same storage deployment
pub fn matches_peer(peer: &PeerRef, secret: &Secret) -> bool {
    let data_value = |key: &str| {
        secret
            .data
            .as_ref()
            .and_then(|d| d.get(key))
            .map(|v| v.0.as_slice())
    };

    secret.namespace().as_deref() == Some(peer.cluster_name.as_str())
        && data_value(keys::NAMESPACE) == Some(peer.storage_cluster_ref.namespace.as_bytes())
        && data_value(keys::STORAGE_CLUSTER_NAME) == Some(peer.storage_cluster_ref.name.as_bytes())
}

/// Find the source secret for `peer` among `candidates`.
///
/// When several candidates match, the one with the lexicographically
/// smallest name wins.
pub fn find_match<'a>(peer: &PeerRef, candidates: &'a [Secret]) -> Option<&'a Secret> {
    candidates
        .iter()
        .filter(|s| matches_peer(peer, s))
        .min_by(|a, b| a.name_any().cmp(&b.name_any()))
}
