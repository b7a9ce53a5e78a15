//! Shared key generation for storage backends.
//!
//! Key format: `{collection_id}/{asset_id}/{filename}`.

use uuid::Uuid;

/// Longest file name most filesystems accept, in bytes.
const MAX_FILENAME_BYTES: usize = 255;

/// Extensions longer than this are treated as part of the stem when truncating.
const MAX_KEPT_EXTENSION_BYTES: usize = 16;

/// Reduce `filename` to a single safe path segment.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(filename);
    let s: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        truncate_filename(s)
    }
}

/// Cut `name` to `MAX_FILENAME_BYTES` on a char boundary, keeping its extension.
fn truncate_filename(mut name: String) -> String {
    if name.len() <= MAX_FILENAME_BYTES {
        return name;
    }

    let extension = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= MAX_KEPT_EXTENSION_BYTES => {
            name.split_off(dot)
        }
        _ => String::new(),
    };

    let mut cut = MAX_FILENAME_BYTES - extension.len();
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }
    name.truncate(cut);
    name.push_str(&extension);
    name
}

/// Generate a storage key for an asset.
pub fn generate_storage_key(collection_id: Uuid, asset_id: Uuid, filename: &str) -> String {
    format!(
        "{}/{}/{}",
        collection_id,
        asset_id,
        sanitize_filename(filename)
    )
}
