mod gate;
mod provider;

pub use gate::{PermissionDomain, PermissionGate, PermissionState};
pub use provider::{PermissionProvider, StaticPermissionProvider};
