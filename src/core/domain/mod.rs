//! Domain types.
//!
//! Shapes exchanged with the secrets service. Collections handed out by the
//! service are snapshots; nothing here mutates them in place.

mod keypair;
mod organization;
mod secret;
mod share;
mod sync;

pub use keypair::RawKeypair;
pub use organization::{Member, Organization, Project, ProjectRef};
pub(crate) use secret::names_match;
pub use secret::{
    DefinitionScope, Scope, Secret, SecretChange, SecretDefinition, SecretExport, SecretRequest,
};
pub use share::{SecretDiff, Share};
pub use sync::SyncResult;
