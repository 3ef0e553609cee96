//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Reads take `&PgPool`; writes take `&mut PgConnection` so they compose
//! inside one sync transaction.

pub mod asset_repo;
pub mod door_repo;
pub mod registry_query_repo;
pub mod space_repo;
pub mod sync_repo;

pub use asset_repo::AssetRepo;
pub use door_repo::DoorRepo;
pub use registry_query_repo::{QueryError, QueryRows, RegistryQueryRepo};
pub use space_repo::SpaceRepo;
pub use sync_repo::{SyncOutcome, SyncRepo, SyncTarget};
