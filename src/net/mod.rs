//! Network layer: the fetch seam, request interception, and connectivity.
//!
//! This module provides:
//! - `Fetcher`: the injected transport capability, with `HttpFetcher` as the
//!   production implementation over reqwest
//! - `NetworkInterceptor`: cache-first serving of GET reads with write-through
//! - `ConnectivityMonitor`: the online/offline signal and its UI side effects

pub mod connectivity;
pub mod fetch;
pub mod interceptor;

pub use connectivity::{ConnectivityEvent, ConnectivityMonitor};
pub use fetch::{FetchError, FetchedResponse, Fetcher, HttpFetcher, Request};
pub use interceptor::NetworkInterceptor;
