//! Small shared helpers.

pub mod path;
pub mod subscribers;
pub mod thread;

pub use subscribers::{SubscriptionId, Subscribers};
