// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to watch events.

pub mod dr_policy;
pub mod locks;
pub mod mirror_peer;
pub mod s3_secret;
pub mod source_secret;

pub use dr_policy::DRPolicyReconciler;
pub use locks::PairingLocks;
pub use mirror_peer::MirrorPeerReconciler;
pub use s3_secret::S3SecretReconciler;
pub use source_secret::SourceSecretReconciler;

use crate::config::Config;
use crate::error::SyncError;
use kube::runtime::controller::Action;

/// Map a reconcile failure to the next scheduling decision
pub fn requeue_action(error: &SyncError, config: &Config) -> Action {
    if error.is_terminal() {
        Action::await_change()
    } else if error.is_not_found() {
        Action::requeue(config.not_found_requeue)
    } else {
        Action::requeue(config.error_requeue)
    }
}
