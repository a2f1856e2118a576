//! AWS access: request addressing, the live-call boundary and the cached client.

mod api_types;
mod cache;
mod cached_client;
mod client;
mod error;
mod request;
mod strategy;

#[cfg(test)]
pub mod stub;

pub use api_types::*;
pub use cached_client::{CachedAwsClient, RetryPolicy};
pub use client::AwsCliLister;
pub use error::FetchError;
pub use request::ApiRequest;
