// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Classification of secrets written by the synchronizer.

use crate::constants::{labels, origin, OPERATOR_NAME};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;

/// A hub secret this operator created and is therefore allowed to delete.
///
/// Anything without the ownership label, or with a type the sweep does
/// not know how to justify, does not parse and is never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedSecret {
    /// Copy of a member's source secret placed in a sibling's namespace
    Mirror { namespace: String, name: String },
    /// Object storage profile published by the member agent
    S3Profile { namespace: String, name: String },
}

impl OwnedSecret {
    pub fn from_secret(secret: &Secret) -> Option<Self> {
        let secret_labels = secret.labels();
        if secret_labels.get(labels::CREATED_BY).map(String::as_str) != Some(OPERATOR_NAME) {
            return None;
        }

        let namespace = secret.namespace()?;
        let name = secret.metadata.name.clone()?;

        match (
            secret_labels.get(labels::SECRET_TYPE).map(String::as_str),
            secret_labels.get(labels::SECRET_ORIGIN).map(String::as_str),
        ) {
            (Some(labels::DESTINATION), _) => Some(OwnedSecret::Mirror { namespace, name }),
            (Some(labels::INTERNAL), Some(origin::S3)) => {
                Some(OwnedSecret::S3Profile { namespace, name })
            }
            _ => None,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            OwnedSecret::Mirror { namespace, .. } | OwnedSecret::S3Profile { namespace, .. } => {
                namespace
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            OwnedSecret::Mirror { name, .. } | OwnedSecret::S3Profile { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;
    use std::collections::BTreeMap;

    fn make_secret(labels: &[(&str, &str)]) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some("abc123".to_string()),
                namespace: Some("cluster-b".to_string()),
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<BTreeMap<_, _>>(),
                ),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_mirror_secret_is_owned() {
        let secret = make_secret(&[
            (labels::CREATED_BY, OPERATOR_NAME),
            (labels::SECRET_TYPE, labels::DESTINATION),
            (labels::SECRET_ORIGIN, origin::ROOK),
        ]);
        assert_eq!(
            OwnedSecret::from_secret(&secret),
            Some(OwnedSecret::Mirror {
                namespace: "cluster-b".to_string(),
                name: "abc123".to_string(),
            })
        );
    }

    #[test]
    fn test_s3_profile_is_owned() {
        let secret = make_secret(&[
            (labels::CREATED_BY, OPERATOR_NAME),
            (labels::SECRET_TYPE, labels::INTERNAL),
            (labels::SECRET_ORIGIN, origin::S3),
        ]);
        assert!(matches!(
            OwnedSecret::from_secret(&secret),
            Some(OwnedSecret::S3Profile { .. })
        ));
    }

    #[test]
    fn test_secret_without_ownership_label_is_ignored() {
        let secret = make_secret(&[(labels::SECRET_TYPE, labels::DESTINATION)]);
        assert_eq!(OwnedSecret::from_secret(&secret), None);
    }

    #[test]
    fn test_secret_owned_by_someone_else_is_ignored() {
        let secret = make_secret(&[
            (labels::CREATED_BY, "tokenexchange"),
            (labels::SECRET_TYPE, labels::DESTINATION),
        ]);
        assert_eq!(OwnedSecret::from_secret(&secret), None);
    }

    #[test]
    fn test_source_secret_is_never_owned() {
        let secret = make_secret(&[
            (labels::CREATED_BY, OPERATOR_NAME),
            (labels::SECRET_TYPE, labels::SOURCE),
        ]);
        assert_eq!(OwnedSecret::from_secret(&secret), None);
    }
}
