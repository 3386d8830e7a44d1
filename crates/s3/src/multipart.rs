//! Multipart upload planning
//!
//! Files larger than [`MULTIPART_THRESHOLD`] are sent as numbered parts, each
//! read from its own byte range of the file.

/// Files up to this size go out in a single PUT
pub const MULTIPART_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Default part size: 64 MiB
pub const DEFAULT_PART_SIZE: u64 = 64 * 1024 * 1024;

/// Minimum part size: 5 MiB (S3 requirement)
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum number of parts: 10,000 (S3 limit)
pub const MAX_PARTS: u64 = 10_000;

/// One part of a multipart upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    /// 1-based part number
    pub number: i32,
    pub offset: u64,
    pub length: u64,
}

/// Part size for a file, growing past the default so the part count stays
/// within [`MAX_PARTS`]
pub fn part_size(file_size: u64) -> u64 {
    if file_size.div_ceil(DEFAULT_PART_SIZE) <= MAX_PARTS {
        DEFAULT_PART_SIZE
    } else {
        file_size
            .div_ceil(MAX_PARTS)
            .clamp(MIN_PART_SIZE, MAX_PART_SIZE)
    }
}

/// Split a file into consecutive parts covering every byte
pub fn plan(file_size: u64) -> Vec<Part> {
    let size = part_size(file_size);
    (0..file_size.div_ceil(size))
        .map(|i| {
            let offset = i * size;
            Part {
                number: i as i32 + 1,
                offset,
                length: size.min(file_size - offset),
            }
        })
        .collect()
}
