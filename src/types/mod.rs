// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resources read by the synchronizer.

pub mod external;
pub mod mirror_peer;
pub mod owned;

pub use external::{DRPolicy, ManagedCluster, Route};
pub use mirror_peer::{MirrorPeer, MirrorPeerSpec, PeerRef, StorageClusterRef};
pub use owned::OwnedSecret;
