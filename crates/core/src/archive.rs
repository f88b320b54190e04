//! Decoding of the zip archive returned by the generation endpoint.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::Result;

/// One file extracted from a response archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name of the entry inside the archive, as chosen by the service.
    pub name: String,
    pub data: Vec<u8>,
}

/// Extracts every file entry of `bytes`, in archive order.
///
/// Directory entries are skipped. An archive without entries yields an
/// empty vector.
pub fn decode(bytes: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        // The declared size comes from the service; never reserve past the payload.
        let mut data = Vec::with_capacity(capacity_hint(file.size(), bytes.len()));
        file.read_to_end(&mut data)?;
        entries.push(ArchiveEntry {
            name: file.name().to_string(),
            data,
        });
    }

    tracing::trace!(target = "nai", entries = entries.len(), "decoded archive");
    Ok(entries)
}

fn capacity_hint(declared: u64, payload_len: usize) -> usize {
    usize::try_from(declared).map_or(payload_len, |declared| declared.min(payload_len))
}
