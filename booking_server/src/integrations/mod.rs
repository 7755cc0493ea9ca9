//! Concrete clients for the collaborators the booking engine talks to through its traits.
pub mod notifications;
pub mod sequence_rpc;
pub mod stripe;
