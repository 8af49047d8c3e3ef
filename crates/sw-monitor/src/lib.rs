pub mod poller;
pub mod snapshot;

pub use poller::{PollerHandle, StatusPoller};
pub use snapshot::{DashboardSnapshot, Region};
