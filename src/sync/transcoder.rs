// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Derivation of destination secrets; names, labels and payloads.
//!
//! Everything here is pure. The destination name is a function of the
//! member cluster and its storage reference only, so deriving twice from
//! the same inputs always lands on the same object.

use crate::constants::{keys, labels, origin, s3, OPERATOR_NAME, SECRET_TYPE};
use crate::error::{Result, SyncError};
use crate::types::{PeerRef, StorageClusterRef};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::ByteString;
use kube::{api::ObjectMeta, ResourceExt};
use sha2::{Digest, Sha512};
use std::collections::BTreeMap;

/// Length of the hex digest kept in generated names
const HASH_LEN: usize = 39;

/// First 39 hex characters of SHA-512 over the dash-joined inputs.
///
/// Existing mirrors on live clusters carry names produced by this exact
/// function; changing it orphans all of them.
pub fn stable_hash(cluster: &str, storage_namespace: &str, storage_name: &str) -> String {
    let joined = format!("{}-{}-{}", cluster, storage_namespace, storage_name);
    let digest = Sha512::digest(joined.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(HASH_LEN);
    encoded
}

pub fn destination_name(
    cluster: &str,
    storage_ref: &StorageClusterRef,
    prefix: Option<&str>,
) -> String {
    let hash = stable_hash(cluster, &storage_ref.namespace, &storage_ref.name);
    match prefix {
        Some(prefix) => format!("{}-{}", prefix, hash),
        None => hash,
    }
}

/// Name of the mirror a peer's source secret produces in every sibling
pub fn mirror_name(peer: &PeerRef) -> String {
    destination_name(&peer.cluster_name, &peer.storage_cluster_ref, None)
}

/// Name of the object storage profile a member publishes on the hub
pub fn s3_profile_name(peer: &PeerRef) -> String {
    destination_name(
        &peer.cluster_name,
        &peer.storage_cluster_ref,
        Some(s3::PROFILE_PREFIX),
    )
}

fn owned_labels(secret_type: &str, origin: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (labels::SECRET_TYPE.to_string(), secret_type.to_string()),
        (labels::CREATED_BY.to_string(), OPERATOR_NAME.to_string()),
        (labels::SECRET_ORIGIN.to_string(), origin.to_string()),
    ])
}

fn bytes(value: &str) -> ByteString {
    ByteString(value.as_bytes().to_vec())
}

/// Build the mirror of `peer`'s source secret for `sibling_cluster`
pub fn derive_mirror(source: &Secret, peer: &PeerRef, sibling_cluster: &str) -> Result<Secret> {
    let data = source.data.as_ref().ok_or_else(|| {
        SyncError::InvalidSecret(format!("source secret {} has no data", source.name_any()))
    })?;
    let secret_data = data.get(keys::SECRET_DATA).ok_or_else(|| {
        SyncError::InvalidSecret(format!(
            "source secret {} has no {} key",
            source.name_any(),
            keys::SECRET_DATA
        ))
    })?;
    let source_origin = data
        .get(keys::SECRET_ORIGIN)
        .and_then(|v| String::from_utf8(v.0.clone()).ok())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| origin::ROOK.to_string());

    Ok(Secret {
        metadata: ObjectMeta {
            name: Some(mirror_name(peer)),
            namespace: Some(sibling_cluster.to_string()),
            labels: Some(owned_labels(labels::DESTINATION, &source_origin)),
            ..Default::default()
        },
        type_: Some(SECRET_TYPE.to_string()),
        data: Some(BTreeMap::from([
            (keys::SECRET_DATA.to_string(), secret_data.clone()),
            (
                keys::NAMESPACE.to_string(),
                bytes(&peer.storage_cluster_ref.namespace),
            ),
            (
                keys::STORAGE_CLUSTER_NAME.to_string(),
                bytes(&peer.storage_cluster_ref.name),
            ),
            (keys::SECRET_ORIGIN.to_string(), bytes(&source_origin)),
        ])),
        ..Default::default()
    })
}

/// Build the hub-side object storage profile for a member cluster from its
/// bucket claim secret and config map and the gateway route host
pub fn derive_s3_profile(
    bucket_secret: &Secret,
    bucket_config: &ConfigMap,
    route_host: &str,
    storage_ref: &StorageClusterRef,
    member_cluster: &str,
) -> Result<Secret> {
    let credential = |key: &str| -> Result<ByteString> {
        bucket_secret
            .data
            .as_ref()
            .and_then(|d| d.get(key))
            .cloned()
            .ok_or_else(|| {
                SyncError::InvalidSecret(format!(
                    "bucket secret {} has no {} key",
                    bucket_secret.name_any(),
                    key
                ))
            })
    };
    let config_value = |key: &str| -> String {
        bucket_config
            .data
            .as_ref()
            .and_then(|d| d.get(key))
            .cloned()
            .unwrap_or_default()
    };

    let region = config_value(s3::CONFIG_BUCKET_REGION);
    let region = if region.is_empty() {
        s3::DEFAULT_REGION.to_string()
    } else {
        region
    };

    let profile: BTreeMap<String, ByteString> = BTreeMap::from([
        (
            s3::PROFILE_NAME.to_string(),
            bytes(&format!(
                "{}-{}-{}",
                s3::PROFILE_PREFIX,
                member_cluster,
                storage_ref.name
            )),
        ),
        (
            s3::BUCKET.to_string(),
            bytes(&config_value(s3::CONFIG_BUCKET_NAME)),
        ),
        (s3::REGION.to_string(), bytes(&region)),
        (
            s3::ENDPOINT.to_string(),
            bytes(&format!("{}://{}", s3::ENDPOINT_PROTOCOL, route_host)),
        ),
        (
            s3::SECRET_ACCESS_KEY.to_string(),
            credential(s3::SECRET_ACCESS_KEY)?,
        ),
        (s3::ACCESS_KEY_ID.to_string(), credential(s3::ACCESS_KEY_ID)?),
    ]);

    Ok(Secret {
        metadata: ObjectMeta {
            name: Some(destination_name(
                member_cluster,
                storage_ref,
                Some(s3::PROFILE_PREFIX),
            )),
            namespace: Some(member_cluster.to_string()),
            labels: Some(owned_labels(labels::INTERNAL, origin::S3)),
            ..Default::default()
        },
        type_: Some(SECRET_TYPE.to_string()),
        data: Some(BTreeMap::from([
            (
                keys::SECRET_DATA.to_string(),
                ByteString(serde_json::to_vec(&profile)?),
            ),
            (keys::NAMESPACE.to_string(), bytes(&storage_ref.namespace)),
            (
                keys::STORAGE_CLUSTER_NAME.to_string(),
                bytes(&storage_ref.name),
            ),
            (keys::SECRET_ORIGIN.to_string(), bytes(origin::S3)),
        ])),
        ..Default::default()
    })
}
