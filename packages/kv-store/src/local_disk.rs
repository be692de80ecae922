use std::collections::BTreeMap;
use std::{fs, io, path};

use crate::KvStore;

const VALUE_EXTENSION: &str = "val";

/// A key/value store persisted as one file per key under a root directory.
///
/// Keys are escaped into file names, so any key string is accepted. A write
/// or removal that fails on disk is kept in an in-memory shadow map instead
/// of being reported: the caller sees the value it wrote for the rest of the
/// process even if the disk refused it.
#[derive(Debug)]
pub struct DiskStore {
    root: path::PathBuf,
    shadow: BTreeMap<String, Option<String>>,
}

impl DiskStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// Fails if the root cannot be created, is not a directory, or is not
    /// writable.
    pub fn new(root: impl Into<path::PathBuf>) -> io::Result<DiskStore> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        let attr = fs::metadata(&root)?;
        if !attr.is_dir() {
            return Err(io::Error::other("Root path must be a directory."));
        }

        if attr.permissions().readonly() {
            return Err(io::Error::other("Root directory must be writable"));
        }

        // Probe writability for real: permission bits lie on some mounts.
        let probe = root.join(".codeplay-probe");
        fs::write(&probe, b"")?;
        fs::remove_file(&probe)?;

        Ok(DiskStore {
            root: root.canonicalize()?,
            shadow: BTreeMap::new(),
        })
    }

    /// The canonical root directory of this store.
    pub fn root(&self) -> &path::Path {
        &self.root
    }

    fn key_to_file_path(&self, key: &str) -> path::PathBuf {
        self.root
            .join(format!("{}.{}", escape_key(key), VALUE_EXTENSION))
    }

    fn read_value(&self, key: &str) -> io::Result<Option<String>> {
        let file_path = self.key_to_file_path(key);
        tracing::trace!("Reading {}...", file_path.display());
        match fs::read_to_string(&file_path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write_value(&self, key: &str, value: &str) -> io::Result<()> {
        let file_path = self.key_to_file_path(key);
        tracing::trace!("Writing {}...", file_path.display());

        // Write to a sibling then rename so a crash never leaves half a value.
        let tmp_path = file_path.with_extension("tmp");
        fs::write(&tmp_path, value.as_bytes())?;
        fs::rename(&tmp_path, &file_path)
    }

    fn remove_value(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.key_to_file_path(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

impl KvStore for DiskStore {
    fn get(&self, key: &str) -> Option<String> {
        if let Some(shadowed) = self.shadow.get(key) {
            return shadowed.clone();
        }

        match self.read_value(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read stored value");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match self.write_value(key, value) {
            Ok(()) => {
                self.shadow.remove(key);
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "disk write failed, keeping value in memory");
                self.shadow.insert(key.to_string(), Some(value.to_string()));
            }
        }
    }

    fn remove(&mut self, key: &str) {
        match self.remove_value(key) {
            Ok(()) => {
                self.shadow.remove(key);
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "disk remove failed, hiding value in memory");
                self.shadow.insert(key.to_string(), None);
            }
        }
    }
}

/// Escape a key into a portable file name.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte becomes
/// `%XX`. The mapping is injective, so distinct keys never share a file.
fn escape_key(key: &str) -> String {
    if key.is_empty() {
        return "%".to_string();
    }

    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("%{:02X}", byte));
        }
    }
    escaped
}
