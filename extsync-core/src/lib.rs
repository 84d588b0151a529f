//! extsync core library: domain types, identifier codec, manifest parsing,
//! run configuration and the hosting-service seam.
//!
//! - [`types`]: subscribers, change operations, release metadata
//! - [`identifier`]: subscription identifier encode / decode
//! - [`manifest`]: per-repository subscription manifest
//! - [`config`]: layered [`RunConfig`]
//! - [`host`]: [`HostApi`] trait consumed by the engine
//! - [`memory`]: in-memory [`HostApi`] for tests
//! - [`error`]: error enums

pub mod config;
pub mod error;
pub mod host;
pub mod identifier;
pub mod manifest;
pub mod memory;
pub mod types;

pub use config::RunConfig;
pub use error::{ConfigError, HostError, IdentifierError, ManifestError};
pub use host::{
    CommitRequest, DirEntry, EntryKind, HostApi, MergeProposal, MergeProposalRequest, RepoInfo,
};
pub use manifest::{SubscriptionManifest, MANIFEST_PATH};
pub use memory::MemoryHost;
pub use types::{
    ChangeKind, ChangeOperation, CommitId, ReleaseInfo, SubscribedRepository, SubscriptionId,
};
