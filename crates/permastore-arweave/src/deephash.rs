//! Deep hash: the network's canonical digest over nested byte structures,
//! used to derive the signing payload of a transaction.
//!
//! A blob hashes as `sha384(sha384("blob" ++ len) ++ sha384(data))`; a list
//! folds its items into an accumulator seeded with `sha384("list" ++ count)`.

use sha2::{Digest, Sha384};

pub const DEEP_HASH_SIZE: usize = 48;

#[derive(Debug, Clone)]
pub enum DeepHashItem {
    Blob(Vec<u8>),
    List(Vec<DeepHashItem>),
}

impl DeepHashItem {
    pub fn blob(data: impl Into<Vec<u8>>) -> Self {
        DeepHashItem::Blob(data.into())
    }
}

pub fn deep_hash(item: &DeepHashItem) -> [u8; DEEP_HASH_SIZE] {
    match item {
        DeepHashItem::Blob(data) => {
            let tag = [b"blob".as_slice(), data.len().to_string().as_bytes()].concat();
            let mut hasher = Sha384::new();
            hasher.update(Sha384::digest(&tag));
            hasher.update(Sha384::digest(data));
            hasher.finalize().into()
        }
        DeepHashItem::List(items) => {
            let tag = [b"list".as_slice(), items.len().to_string().as_bytes()].concat();
            let mut acc: [u8; DEEP_HASH_SIZE] = Sha384::digest(&tag).into();
            for item in items {
                let mut hasher = Sha384::new();
                hasher.update(acc);
                hasher.update(deep_hash(item));
                acc = hasher.finalize().into();
            }
            acc
        }
    }
}
