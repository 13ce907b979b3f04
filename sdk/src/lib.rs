pub mod client;
pub mod controller;
pub mod pow;
pub mod store;

pub use {
    controller::{Completion, Outcome, ProtocolController, ProtocolState, RunError, Transition},
    store::{RemoteStore, StoreError},
};
