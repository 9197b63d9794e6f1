//! The mod store, manifests, and the per-run active set.
//!
//! Each launch first runs [`LinkSetSynchronizer`] to clear the previous
//! run's links, then [`DependencyLinker`] to link the requested mods and
//! their dependencies from the store into the game's `Mods` directory.

pub mod linker;
pub mod manifest;
pub mod store;
pub mod sync;

pub use linker::{ActiveLinkSet, DependencyLinker, ModRequest};
pub use manifest::{ManifestReader, ModManifest};
pub use store::{ModStore, StoreEntry};
pub use sync::{LinkSetSynchronizer, SyncReport};
