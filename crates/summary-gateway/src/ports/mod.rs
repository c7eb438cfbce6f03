//! Ports: the traits the aggregator depends on.

pub mod outbound;

pub use outbound::{AccessClient, Clock, ContextClient, IdentityClient, SystemClock};
