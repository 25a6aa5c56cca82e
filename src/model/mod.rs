//! Access to the external generative model.

mod provider;
pub mod providers;

pub use provider::{GenerativeModel, ModelProviderKind, StructuredRequest};
