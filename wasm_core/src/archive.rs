//! ZIP and gzip helpers for the archive tools.

use std::io::{Cursor, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::files::mime_type;

/// Ceiling on the bytes one extraction or decompression may produce.
pub const MAX_EXTRACTED_BYTES: u64 = 512 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ArchiveFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ZipEntry {
    /// Last path segment.
    pub name: String,
    pub path: String,
    pub size: u64,
    pub compressed_size: u64,
    pub is_directory: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExtractedFile {
    pub path: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

fn deflate_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(6))
}

/// Builds a deflate-compressed archive. A later file with the same name
/// replaces the earlier one.
pub fn create_zip(files: &[ArchiveFile]) -> Result<Vec<u8>, String> {
    write_zip(files.iter().map(|f| (f.name.clone(), f.bytes.clone())).collect())
}

/// Re-packs `archive` with `files` added, replacing entries of the same name.
pub fn add_to_zip(archive: &[u8], files: &[ArchiveFile]) -> Result<Vec<u8>, String> {
    let mut entries: Vec<(String, Vec<u8>)> = extract_zip(archive)?
        .into_iter()
        .map(|file| (file.path, file.bytes))
        .collect();
    entries.extend(files.iter().map(|f| (f.name.clone(), f.bytes.clone())));
    write_zip(entries)
}

fn write_zip(entries: Vec<(String, Vec<u8>)>) -> Result<Vec<u8>, String> {
    let mut unique: Vec<(String, Vec<u8>)> = Vec::with_capacity(entries.len());
    for (name, bytes) in entries {
        let name = name.trim_start_matches('/').to_string();
        if name.is_empty() {
            return Err("archive entry name cannot be empty".into());
        }
        match unique.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = bytes,
            None => unique.push((name, bytes)),
        }
    }
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in unique {
        writer
            .start_file(name.as_str(), deflate_options())
            .map_err(|err| err.to_string())?;
        writer.write_all(&bytes).map_err(|err| err.to_string())?;
    }
    let cursor = writer.finish().map_err(|err| err.to_string())?;
    Ok(cursor.into_inner())
}

pub fn list_zip(bytes: &[u8]) -> Result<Vec<ZipEntry>, String> {
    let mut archive = open(bytes)?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive.by_index(index).map_err(|err| err.to_string())?;
        let path = file.name().to_string();
        let name = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(&path)
            .to_string();
        entries.push(ZipEntry {
            name,
            size: file.size(),
            compressed_size: file.compressed_size(),
            is_directory: file.is_dir(),
            path,
        });
    }
    Ok(entries)
}

/// Every file entry (directories skipped) with a mime guessed from its name.
/// Output is capped at [`MAX_EXTRACTED_BYTES`] in total.
pub fn extract_zip(bytes: &[u8]) -> Result<Vec<ExtractedFile>, String> {
    extract_zip_within(bytes, MAX_EXTRACTED_BYTES)
}

fn extract_zip_within(bytes: &[u8], limit: u64) -> Result<Vec<ExtractedFile>, String> {
    let mut archive = open(bytes)?;
    let mut files = Vec::new();
    let mut remaining = limit;
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(|err| err.to_string())?;
        if file.is_dir() {
            continue;
        }
        // header sizes are untrusted; only what is actually read counts
        let mut content = Vec::new();
        let name = file.name().to_string();
        read_limited(&mut file, remaining, &mut content)
            .map_err(|err| format!("failed to read {name}: {err}"))?;
        remaining -= content.len() as u64;
        files.push(ExtractedFile {
            path: file.name().to_string(),
            mime: mime_type(file.name()).to_string(),
            bytes: content,
        });
    }
    Ok(files)
}

fn open(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, String> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|err| format!("invalid ZIP archive: {err}"))
}

/// gzip at `level` 0-9 (values above 9 are clamped).
///
/// # Example
/// ```
/// use wcag_core::archive::{gzip_compress, gzip_decompress};
/// let packed = gzip_compress(b"hello hello hello", 6)?;
/// assert_eq!(&packed[..2], &[0x1f, 0x8b]);
/// assert_eq!(gzip_decompress(&packed)?, b"hello hello hello");
/// # Ok::<(), String>(())
/// ```
pub fn gzip_compress(bytes: &[u8], level: u32) -> Result<Vec<u8>, String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level.min(9)));
    encoder.write_all(bytes).map_err(|err| err.to_string())?;
    encoder.finish().map_err(|err| err.to_string())
}

pub fn gzip_decompress(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    read_limited(GzDecoder::new(bytes), MAX_EXTRACTED_BYTES, &mut out)
        .map_err(|err| format!("invalid gzip data: {err}"))?;
    Ok(out)
}

/// Reads to the end, failing once more than `limit` bytes arrive.
fn read_limited(reader: impl Read, limit: u64, out: &mut Vec<u8>) -> Result<(), String> {
    reader
        .take(limit.saturating_add(1))
        .read_to_end(out)
        .map_err(|err| err.to_string())?;
    if out.len() as u64 > limit {
        return Err(format!("output exceeds {limit} bytes"));
    }
    Ok(())
}

/// Percentage saved, rounded. Zero when the original is empty.
pub fn compression_ratio(original: u64, compressed: u64) -> i64 {
    if original == 0 {
        return 0;
    }
    ((1.0 - compressed as f64 / original as f64) * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, body: &str) -> ArchiveFile {
        ArchiveFile {
            name: name.into(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn zip_lists_and_extracts_what_it_packed() {
        let packed = create_zip(&[
            file("notes.txt", &"accessible ".repeat(50)),
            file("data/report.json", "{\"ok\":true}"),
        ])
        .expect("zip");
        let entries = list_zip(&packed).expect("list");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name, "report.json");
        assert_eq!(entries[1].path, "data/report.json");
        assert_eq!(entries[0].size, 550);
        assert!(entries[0].compressed_size < entries[0].size);

        let extracted = extract_zip(&packed).expect("extract");
        assert_eq!(extracted[1].mime, "application/json");
        assert_eq!(extracted[1].bytes, b"{\"ok\":true}");
    }

    #[test]
    fn add_to_zip_replaces_same_names() {
        let packed = create_zip(&[file("a.txt", "old"), file("b.txt", "keep")]).expect("zip");
        let updated = add_to_zip(&packed, &[file("a.txt", "new"), file("c.txt", "added")])
            .expect("add");
        let files = extract_zip(&updated).expect("extract");
        let names: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(files[0].bytes, b"new");
    }

    fn stored_zip(name: &str, body: &[u8]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(name, options).expect("start");
        writer.write_all(body).expect("write");
        writer.finish().expect("finish").into_inner()
    }

    /// Overwrites the uncompressed size in the local and central headers.
    fn forge_declared_size(zip: &mut [u8], size: u32) {
        let patch = |zip: &mut [u8], signature: &[u8; 4], offset: usize| {
            let at = zip
                .windows(4)
                .position(|window| window == signature)
                .expect("header");
            zip[at + offset..at + offset + 4].copy_from_slice(&size.to_le_bytes());
        };
        patch(zip, b"PK\x03\x04", 22);
        patch(zip, b"PK\x01\x02", 24);
    }

    #[test]
    fn declared_sizes_do_not_drive_allocation() {
        let mut zip = stored_zip("tiny.txt", b"tiny");
        forge_declared_size(&mut zip, 0xFFFF_FFF0);
        assert_eq!(list_zip(&zip).expect("list")[0].size, 0xFFFF_FFF0);
        let files = extract_zip(&zip).expect("extract");
        assert_eq!(files[0].bytes, b"tiny");
        assert!(files[0].bytes.capacity() < 1024);
    }

    #[test]
    fn extraction_stops_at_the_byte_limit() {
        let packed = create_zip(&[file("a.txt", "0123456789"), file("b.txt", "0123456789")])
            .expect("zip");
        assert_eq!(extract_zip_within(&packed, 20).expect("fits").len(), 2);
        let err = extract_zip_within(&packed, 15).unwrap_err();
        assert!(err.contains("b.txt"), "{err}");
        assert!(err.contains("exceeds 5 bytes"), "{err}");

        let mut out = Vec::new();
        assert!(read_limited(&b"abcdef"[..], 3, &mut out).is_err());
        out.clear();
        read_limited(&b"abc"[..], 3, &mut out).expect("exact fit");
        assert_eq!(out, b"abc");
    }

    #[test]
    fn broken_inputs_are_errors() {
        assert!(list_zip(b"PK nope").is_err());
        assert!(gzip_decompress(b"plain text").is_err());
        assert!(create_zip(&[file("/", "x")]).is_err());
    }

    #[test]
    fn compression_ratio_rounds_and_guards_zero() {
        assert_eq!(compression_ratio(1000, 250), 75);
        assert_eq!(compression_ratio(3, 2), 33);
        assert_eq!(compression_ratio(0, 10), 0);
        assert_eq!(compression_ratio(100, 150), -50);
    }
}
