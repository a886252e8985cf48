// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret matching, derivation and synchronization logic.

pub mod directory;
pub mod engine;
pub mod matcher;
pub mod s3;
pub mod transcoder;

pub use directory::PairingDirectory;
pub use engine::{DeliveryMode, SyncEngine, SyncReport};
pub use s3::S3ProfileSync;
