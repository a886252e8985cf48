// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Invalid MirrorPeer: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid secret payload: {0}")]
    InvalidSecret(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Failed to sync {} member(s): {}", .0.len(), .0.join("; "))]
    MemberSync(Vec<String>),

    #[error("Failed to clean up {} secret(s): {}", .0.len(), .0.join("; "))]
    Sweep(Vec<String>),

    #[error("Finalizer error: {0}")]
    Finalizer(#[source] Box<kube::runtime::finalizer::Error<SyncError>>),
}

impl SyncError {
    /// Validation failures stay failed until the MirrorPeer spec changes
    pub fn is_terminal(&self) -> bool {
        match self {
            SyncError::Validation(_) => true,
            SyncError::Finalizer(e) => matches!(
                e.as_ref(),
                kube::runtime::finalizer::Error::ApplyFailed(inner)
                    | kube::runtime::finalizer::Error::CleanupFailed(inner)
                    if inner.is_terminal()
            ),
            _ => false,
        }
    }

    /// Referenced objects that may simply not exist yet
    pub fn is_not_found(&self) -> bool {
        match self {
            SyncError::NotFound(_) => true,
            SyncError::KubeError(kube::Error::Api(err)) => err.code == 404,
            SyncError::Finalizer(e) => matches!(
                e.as_ref(),
                kube::runtime::finalizer::Error::ApplyFailed(inner)
                    | kube::runtime::finalizer::Error::CleanupFailed(inner)
                    if inner.is_not_found()
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
