//! Zip packaging for grouped downloads.
//!
//! A mosaic item is offered as one archive holding its tiles, named
//! `{base}_parte_{n}.{ext}` in row-major order. Bulk export packages each
//! item on its own; there is no combined archive across items.
//!
//! Buffers are only read here. The packager borrows them for the duration
//! of the call and hands back a new `application/zip` buffer.

use crate::naming::tile_filename;
use crate::types::EncodedBuffer;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const ZIP_MEDIA_TYPE: &str = "application/zip";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("nothing to archive")]
    Empty,
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bundle buffers into a zip, entry `i` named `{base_name}_parte_{i+1}.{ext}`.
pub fn package_zip(
    buffers: &[EncodedBuffer],
    base_name: &str,
) -> Result<EncodedBuffer, ArchiveError> {
    if buffers.is_empty() {
        return Err(ArchiveError::Empty);
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (index, buffer) in buffers.iter().enumerate() {
        writer.start_file(tile_filename(base_name, index, &buffer.media_type), options)?;
        writer.write_all(&buffer.bytes)?;
    }

    let bytes = writer.finish()?.into_inner();
    log::debug!(
        "{base_name}: packaged {} entries into {} bytes",
        buffers.len(),
        bytes.len()
    );
    Ok(EncodedBuffer::new(ZIP_MEDIA_TYPE, bytes))
}
