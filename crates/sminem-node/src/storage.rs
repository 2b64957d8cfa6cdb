//! Snapshot files.
//!
//! # File format
//! ```text
//! magic (4 bytes, "SMNM") || version (u32 LE) || bincode(EcosystemState)
//! ```

use std::path::Path;

use sminem_core::error::SminemError;
use tracing::info;

use crate::ecosystem::EcosystemState;

/// Magic bytes opening every snapshot.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"SMNM";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

const HEADER_LEN: usize = 8;

/// Encode `state` with its header.
pub fn encode_snapshot(state: &EcosystemState) -> Result<Vec<u8>, SminemError> {
    let payload = bincode::encode_to_vec(state, bincode::config::standard())
        .map_err(|e| SminemError::Storage(format!("encode: {e}")))?;
    let mut data = Vec::with_capacity(HEADER_LEN + payload.len());
    data.extend_from_slice(SNAPSHOT_MAGIC);
    data.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    data.extend_from_slice(&payload);
    Ok(data)
}

/// Decode a snapshot produced by [`encode_snapshot`].
pub fn decode_snapshot(data: &[u8]) -> Result<EcosystemState, SminemError> {
    if data.len() < HEADER_LEN {
        return Err(SminemError::Storage("snapshot too short".into()));
    }
    let (header, payload) = data.split_at(HEADER_LEN);
    if &header[..4] != SNAPSHOT_MAGIC {
        return Err(SminemError::Storage("invalid magic bytes".into()));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&header[4..]);
    let version = u32::from_le_bytes(version);
    if version != SNAPSHOT_VERSION {
        return Err(SminemError::Storage(format!("unsupported version: {version}")));
    }
    let (state, read) = bincode::decode_from_slice(payload, bincode::config::standard())
        .map_err(|e| SminemError::Storage(format!("invalid payload: {e}")))?;
    if read != payload.len() {
        return Err(SminemError::Storage(format!(
            "{} trailing bytes after payload",
            payload.len() - read
        )));
    }
    Ok(state)
}

/// Write `state` to `path`, replacing any previous snapshot.
///
/// The file is written beside `path` and renamed into place.
pub fn save_snapshot(path: &Path, state: &EcosystemState) -> Result<(), SminemError> {
    let data = encode_snapshot(state)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SminemError::Storage(e.to_string()))?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &data).map_err(|e| SminemError::Storage(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| SminemError::Storage(e.to_string()))?;
    info!(path = %path.display(), bytes = data.len(), "snapshot saved");
    Ok(())
}

/// Read a snapshot from `path`.
pub fn load_snapshot(path: &Path) -> Result<EcosystemState, SminemError> {
    let data = std::fs::read(path)
        .map_err(|e| SminemError::Storage(format!("{}: {e}", path.display())))?;
    decode_snapshot(&data)
}
