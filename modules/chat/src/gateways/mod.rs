pub mod local;
pub mod poller;

pub use local::ChatLocalClient;
pub use poller::{ChatPoller, PollerHandle};
