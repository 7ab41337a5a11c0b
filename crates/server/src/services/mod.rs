//! Business services for the server.

pub mod location;
pub mod profile_sync;

pub use location::{GeoClient, GeoError, Location};
pub use profile_sync::{ProfileSync, SyncedProfile};
