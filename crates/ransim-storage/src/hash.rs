//! Topology fingerprinting with blake3.
//!
//! The fingerprint is the blake3 hash of the topology's JSON form. The
//! topology serializes only `Vec`s and fixed-order structs, so equal
//! topologies always produce equal bytes. Fingerprints are stored in run
//! metadata, never used as keys.

use ransim_core::Topology;

use crate::error::StorageError;

/// Hex-encoded blake3 hash of `topology`.
pub fn topology_fingerprint(topology: &Topology) -> Result<String, StorageError> {
    let bytes = serde_json::to_vec(topology)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
