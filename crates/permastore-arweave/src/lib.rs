//! Client for an Arweave-style permanent storage network.
//!
//! The upload path builds a signed format-2 data transaction, posts it in
//! bounded chunks, and persists progress to a keyed checkpoint store so an
//! interrupted upload can resume without recomputing or re-signing the
//! transaction.

pub mod client;
pub mod deephash;
pub mod gateway;
pub mod merkle;
pub mod signer;
pub mod tx;
pub mod uploader;

pub use client::ArweaveClient;
pub use gateway::{Gateway, HttpGateway};
pub use signer::{RsaPssSigner, Signer};
pub use tx::Transaction;
pub use uploader::{TransactionUploader, UploadCheckpoint};
