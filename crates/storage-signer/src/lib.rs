//! Storage Signer
//!
//! Mints time-limited signed URLs for objects in a private storage bucket
//! via the provider's `object/sign` endpoint. Implements
//! [`signed_url_cache::UrlMinter`] so it can sit behind a
//! [`signed_url_cache::SignedUrlCache`].

pub mod error;
pub mod signer;
pub mod types;

pub use error::{Result, SignerError};
pub use signer::{SignerConfig, StorageSigner};
pub use types::{SignRequest, SignResponse, StorageErrorBody};
