//! Chunk tree: splits a payload into bounded chunks and builds the merkle
//! tree the network addresses chunked data with. Leaves commit to the
//! chunk's SHA-256 and its end offset; branches commit to both children and
//! the split offset. Each chunk gets a proof path used when transmitting it.

use permastore_core::{Result, StoreError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Largest chunk transmitted in one network call.
pub const MAX_CHUNK_SIZE: usize = 256 * 1024;
/// When the tail would fall under this, the last two chunks are rebalanced.
pub const MIN_CHUNK_SIZE: usize = 32 * 1024;

const HASH_SIZE: usize = 32;
const NOTE_SIZE: usize = 32;

/// One chunk of the payload, identified by its byte range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRange {
    #[serde(with = "base64_bytes")]
    pub data_hash: Vec<u8>,
    pub min_byte_range: usize,
    pub max_byte_range: usize,
}

/// Merkle proof path for one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub offset: usize,
    #[serde(with = "base64_bytes")]
    pub proof: Vec<u8>,
}

/// The full chunk tree for a payload: root, chunk ranges, one proof per chunk.
#[derive(Debug, Clone)]
pub struct ChunkTree {
    pub data_root: [u8; HASH_SIZE],
    pub chunks: Vec<ChunkRange>,
    pub proofs: Vec<Proof>,
}

/// Serde helper: raw bytes as base64url without padding.
mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Vec<u8>, s: S) -> Result<S::Ok, S::Error> {
        URL_SAFE_NO_PAD.encode(bytes).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        use serde::de::Error;
        let s = String::deserialize(d)?;
        URL_SAFE_NO_PAD.decode(&s).map_err(D::Error::custom)
    }
}

enum Node {
    Leaf {
        id: [u8; HASH_SIZE],
        data_hash: [u8; HASH_SIZE],
        max_byte_range: usize,
    },
    Branch {
        id: [u8; HASH_SIZE],
        byte_range: usize,
        max_byte_range: usize,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn id(&self) -> &[u8; HASH_SIZE] {
        match self {
            Node::Leaf { id, .. } | Node::Branch { id, .. } => id,
        }
    }

    fn max_byte_range(&self) -> usize {
        match self {
            Node::Leaf { max_byte_range, .. } | Node::Branch { max_byte_range, .. } => {
                *max_byte_range
            }
        }
    }
}

/// Split a payload into chunk ranges. The split is a pure function of the
/// payload bytes, so chunk identity survives process restarts.
pub fn chunk_ranges(data: &[u8]) -> Vec<ChunkRange> {
    let mut chunks = Vec::new();
    let mut cursor = 0usize;
    let mut rest = data;

    while rest.len() >= MAX_CHUNK_SIZE {
        let mut chunk_size = MAX_CHUNK_SIZE;
        let remainder = rest.len() - MAX_CHUNK_SIZE;
        if remainder > 0 && remainder < MIN_CHUNK_SIZE {
            chunk_size = rest.len().div_ceil(2);
        }
        let (head, tail) = rest.split_at(chunk_size);
        chunks.push(ChunkRange {
            data_hash: Sha256::digest(head).to_vec(),
            min_byte_range: cursor,
            max_byte_range: cursor + head.len(),
        });
        cursor += head.len();
        rest = tail;
    }

    if !rest.is_empty() {
        chunks.push(ChunkRange {
            data_hash: Sha256::digest(rest).to_vec(),
            min_byte_range: cursor,
            max_byte_range: cursor + rest.len(),
        });
    }

    chunks
}

/// Number of chunks a payload of the given length splits into, without
/// hashing anything. The small-tail rebalance turns the final max-size
/// chunk plus its short tail into two chunks, which leaves the count
/// equal to the plain ceiling division.
pub fn chunk_count(data_len: usize) -> usize {
    data_len.div_ceil(MAX_CHUNK_SIZE)
}

/// Build the full chunk tree for a payload.
pub fn generate_tree(data: &[u8]) -> Result<ChunkTree> {
    if data.is_empty() {
        return Err(StoreError::EmptyPayload);
    }

    let chunks = chunk_ranges(data);
    let leaves: Vec<Node> = chunks.iter().map(leaf).collect();
    let root = build_tree(leaves);
    let proofs = resolve_proofs(&root, Vec::new());

    Ok(ChunkTree {
        data_root: *root.id(),
        chunks,
        proofs,
    })
}

fn leaf(chunk: &ChunkRange) -> Node {
    let id = hash_parts(&[
        &Sha256::digest(&chunk.data_hash),
        &Sha256::digest(note(chunk.max_byte_range)),
    ]);
    let mut data_hash = [0u8; HASH_SIZE];
    data_hash.copy_from_slice(&chunk.data_hash);
    Node::Leaf {
        id,
        data_hash,
        max_byte_range: chunk.max_byte_range,
    }
}

fn build_tree(mut nodes: Vec<Node>) -> Node {
    while nodes.len() > 1 {
        let mut next = Vec::with_capacity(nodes.len().div_ceil(2));
        let mut iter = nodes.into_iter();
        while let Some(left) = iter.next() {
            match iter.next() {
                Some(right) => next.push(branch(left, right)),
                None => next.push(left),
            }
        }
        nodes = next;
    }
    nodes.remove(0)
}

fn branch(left: Node, right: Node) -> Node {
    let byte_range = left.max_byte_range();
    let id = hash_parts(&[
        &Sha256::digest(left.id()),
        &Sha256::digest(right.id()),
        &Sha256::digest(note(byte_range)),
    ]);
    Node::Branch {
        id,
        byte_range,
        max_byte_range: right.max_byte_range(),
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn resolve_proofs(node: &Node, partial: Vec<u8>) -> Vec<Proof> {
    match node {
        Node::Leaf {
            data_hash,
            max_byte_range,
            ..
        } => {
            let mut proof = partial;
            proof.extend_from_slice(data_hash);
            proof.extend_from_slice(&note(*max_byte_range));
            vec![Proof {
                offset: max_byte_range - 1,
                proof,
            }]
        }
        Node::Branch {
            left,
            right,
            byte_range,
            ..
        } => {
            let mut shared = partial;
            shared.extend_from_slice(left.id());
            shared.extend_from_slice(right.id());
            shared.extend_from_slice(&note(*byte_range));
            let mut proofs = resolve_proofs(left, shared.clone());
            proofs.extend(resolve_proofs(right, shared));
            proofs
        }
    }
}

/// Check a proof path against a data root. Walks branch segments narrowing
/// the offset interval, then checks the leaf segment.
pub fn validate_proof(data_root: &[u8; HASH_SIZE], dest_offset: usize, proof: &[u8]) -> bool {
    let mut expected = *data_root;
    let mut rest = proof;

    while rest.len() > HASH_SIZE + NOTE_SIZE {
        if rest.len() < 2 * HASH_SIZE + NOTE_SIZE {
            return false;
        }
        let left_id = &rest[..HASH_SIZE];
        let right_id = &rest[HASH_SIZE..2 * HASH_SIZE];
        let note_bytes = &rest[2 * HASH_SIZE..2 * HASH_SIZE + NOTE_SIZE];
        let byte_range = read_note(note_bytes);

        let id = hash_parts(&[
            &Sha256::digest(left_id),
            &Sha256::digest(right_id),
            &Sha256::digest(note_bytes),
        ]);
        if id != expected {
            return false;
        }

        if dest_offset < byte_range {
            expected.copy_from_slice(left_id);
        } else {
            expected.copy_from_slice(right_id);
        }
        rest = &rest[2 * HASH_SIZE + NOTE_SIZE..];
    }

    if rest.len() != HASH_SIZE + NOTE_SIZE {
        return false;
    }
    let data_hash = &rest[..HASH_SIZE];
    let note_bytes = &rest[HASH_SIZE..];
    let id = hash_parts(&[&Sha256::digest(data_hash), &Sha256::digest(note_bytes)]);
    id == expected && dest_offset < read_note(note_bytes)
}

fn hash_parts(parts: &[&[u8]]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Offset note: 32-byte big-endian integer.
fn note(value: usize) -> [u8; NOTE_SIZE] {
    let mut out = [0u8; NOTE_SIZE];
    out[NOTE_SIZE - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    out
}

fn read_note(bytes: &[u8]) -> usize {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[NOTE_SIZE - 8..]);
    u64::from_be_bytes(buf) as usize
}
