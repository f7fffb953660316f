//! Remote document synchronization.
//!
//! This module provides:
//! - `RemoteStore`: the injected document-store capability, with
//!   `HttpRemoteStore` for production and `MemoryRemoteStore` for tests
//! - merge-write plumbing: value-level merge plus server-timestamp
//!   substitution
//! - `RemoteSyncClient`: load-on-sign-in and save-on-mutation against one
//!   authenticated session

pub mod client;
pub mod store;

pub use client::{LoadOutcome, RemoteSyncClient, Session, SyncError};
pub use store::{HttpRemoteStore, MemoryRemoteStore, RemoteStore, SERVER_TIMESTAMP};
