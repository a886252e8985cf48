// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Label keys and values placed on hub secrets
pub mod labels {
    /// Classifies a secret as source, mirrored destination or internal
    pub const SECRET_TYPE: &str = "multicluster.odf.openshift.io/secret-type";
    /// Ownership marker; only secrets carrying it are ever swept
    pub const CREATED_BY: &str = "multicluster.odf.openshift.io/created-by";
    /// Subsystem the credential originates from
    pub const SECRET_ORIGIN: &str = "multicluster.odf.openshift.io/secret-origin";

    pub const SOURCE: &str = "BLUE";
    pub const DESTINATION: &str = "GREEN";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Origin kinds recorded on synchronized secrets
pub mod origin {
    pub const ROOK: &str = "rook";
    pub const S3: &str = "S3";
}

/// Data keys of hub-side source and destination secrets
pub mod keys {
    pub const NAMESPACE: &str = "namespace";
    pub const STORAGE_CLUSTER_NAME: &str = "storage_cluster_name";
    pub const SECRET_DATA: &str = "secret-data";
    pub const SECRET_ORIGIN: &str = "secret-origin";
}

/// Object storage gateway keys and defaults
pub mod s3 {
    pub const PROFILE_PREFIX: &str = "s3profile";
    pub const PROFILE_NAME: &str = "s3ProfileName";
    pub const BUCKET: &str = "s3Bucket";
    pub const REGION: &str = "s3Region";
    pub const ENDPOINT: &str = "s3CompatibleEndpoint";
    pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
    pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

    /// Keys of the bucket claim config map on the member cluster
    pub const CONFIG_BUCKET_NAME: &str = "BUCKET_NAME";
    pub const CONFIG_BUCKET_REGION: &str = "BUCKET_REGION";

    pub const ROUTE_NAME: &str = "s3";
    pub const ENDPOINT_PROTOCOL: &str = "https";
    /// Placeholder used when the gateway does not report a region
    pub const DEFAULT_REGION: &str = "noobaa";

    pub const BUCKET_CLAIM_KIND: &str = "ObjectBucketClaim";
}

/// The operator name; value of the ownership label and field manager
pub const OPERATOR_NAME: &str = "mirror-secret-sync";

/// `type` field of every secret the operator writes
pub const SECRET_TYPE: &str = "multicluster.odf.openshift.io/secret-type";

/// Finalizer holding a MirrorPeer until its mirrors are swept
pub const FINALIZER: &str = "multicluster.odf.openshift.io/secret-sync";

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
