//! Offline support: the mutation queue and the connectivity observer.

mod connectivity;
mod network;
mod queue;

pub use connectivity::{Connectivity, ConnectivitySignal};
pub use network::{NetworkObserver, Transition};
pub use queue::{MutationKind, OfflineQueue, QueuedMutation, ReplayReport};
