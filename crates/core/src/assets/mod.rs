use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde_json::Value;

/// Turns a relative asset path into the URL a renderer should load.
///
/// The engine never assumes a resolution scheme; everything must work the same
/// with [`IdentityResolver`].
pub trait MediaResolver {
    fn resolve(&self, path: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityResolver;

impl MediaResolver for IdentityResolver {
    fn resolve(&self, path: &str) -> String {
        path.to_string()
    }
}

/// Lookup table from normalised relative paths to hosted URLs.
#[derive(Debug, Default, Clone)]
pub struct MediaMap {
    entries: HashMap<String, String>,
}

impl MediaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, url: impl Into<String>) {
        self.entries.insert(normalize_path(path), url.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a JSON object of `path -> url`. Non-string values are skipped;
    /// anything that is not an object gives an empty map.
    pub fn from_json(raw: &str) -> Self {
        let mut map = Self::new();
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => {
                for (path, url) in object {
                    if let Value::String(url) = url {
                        map.insert(&path, url);
                    }
                }
            }
            Ok(_) => tracing::warn!("media map is not a JSON object; ignoring it"),
            Err(err) => tracing::warn!(%err, "media map is not valid JSON; ignoring it"),
        }
        map
    }

    /// Loads the map through an [`AssetSource`]; a missing file is an empty map.
    pub fn load(source: &dyn AssetSource, path: &str) -> Self {
        match source.read_text(path) {
            Some(raw) => Self::from_json(&raw),
            None => {
                tracing::debug!(path, "no media map available; using identity resolution");
                Self::new()
            }
        }
    }
}

impl MediaResolver for MediaMap {
    fn resolve(&self, path: &str) -> String {
        let key = normalize_path(path);
        if key.is_empty() {
            return path.to_string();
        }
        self.entries
            .get(&key)
            .cloned()
            .unwrap_or_else(|| path.to_string())
    }
}

/// Canonical key for a media reference: fragments, queries, leading `./` or
/// `/` and backslashes are dropped and percent escapes decoded. Absolute
/// `data:`, `blob:` and `http(s):` refs are returned unchanged.
pub fn normalize_path(value: &str) -> String {
    let raw = value.trim();
    if raw.is_empty() {
        return String::new();
    }
    let lower = raw.to_ascii_lowercase();
    if ["data:", "blob:", "http:", "https:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return raw.to_string();
    }

    let without_fragment = raw.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    let slashed = without_query.replace('\\', "/");
    let trimmed = slashed
        .strip_prefix("./")
        .or_else(|| slashed.strip_prefix('/'))
        .unwrap_or(&slashed);

    percent_decode(trimmed).unwrap_or_else(|| trimmed.to_string())
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Read-only access to the experience's data files (lyrics, photo lists).
pub trait AssetSource {
    /// Returns the file contents, or `None` when it cannot be loaded.
    fn read_text(&self, path: &str) -> Option<String>;
}

/// Serves assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirectoryAssets {
    fn read_text(&self, path: &str) -> Option<String> {
        let full = self.root.join(normalize_path(path));
        match std::fs::read_to_string(&full) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(path = %full.display(), %err, "asset load failed");
                None
            }
        }
    }
}

/// In-memory assets, mostly for tests and scripted runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssets {
    files: HashMap<String, String>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, contents: impl Into<String>) -> Self {
        self.files.insert(normalize_path(path), contents.into());
        self
    }
}

impl AssetSource for MemoryAssets {
    fn read_text(&self, path: &str) -> Option<String> {
        self.files.get(&normalize_path(path)).cloned()
    }
}

/// Reads a JSON array of media refs. Anything unreadable is an empty list.
pub fn load_photo_list(source: &dyn AssetSource, path: &str) -> Vec<String> {
    let Some(raw) = source.read_text(path) else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(src) if !src.trim().is_empty() => Some(src),
                _ => None,
            })
            .collect(),
        _ => {
            tracing::warn!(path, "photo list is not a JSON array of strings");
            Vec::new()
        }
    }
}

/// Whether a media ref should be shown with a video element.
pub fn is_video(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".mp4")
}

/// Whether a media ref is a still image usable for dividers and the puzzle.
pub fn is_image(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    [".jpg", ".jpeg", ".png", ".webp"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}
