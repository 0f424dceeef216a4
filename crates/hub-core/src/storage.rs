use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;

/// File-backed state belonging to a single handler instance.
///
/// Persistent storage lives under the data directory and survives the
/// handler; temporary storage is used for transient (test) handlers and is
/// removed on drop. Export produces an opaque blob (a JSON map of relative
/// path to base64 contents) that can be imported into another storage.
pub enum FileStorage {
    Persistent(PathBuf),
    Temporary(TempDir),
}

impl FileStorage {
    pub fn persistent(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self::Persistent(root))
    }

    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("handler_storage_")
            .tempdir()?;
        Ok(Self::Temporary(dir))
    }

    pub fn root(&self) -> &Path {
        match self {
            Self::Persistent(root) => root,
            Self::Temporary(dir) => dir.path(),
        }
    }

    /// Store a file under `name`, relative to the storage root.
    ///
    /// Names that would resolve outside the root are rejected.
    pub fn put(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = resolve_within(self.root(), name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn contains(&self, name: &str) -> bool {
        resolve_within(self.root(), name)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Serialize all stored files into an opaque blob.
    ///
    /// Returns `None` when the storage holds no files.
    pub fn export_files(&self) -> Result<Option<Vec<u8>>> {
        let mut files = BTreeMap::new();
        collect_files(self.root(), self.root(), &mut files)?;
        if files.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::to_vec(&files)?))
    }

    /// Restore files from a blob produced by `export_files`.
    pub fn import_files(&self, blob: &[u8]) -> Result<()> {
        let files: BTreeMap<String, String> = serde_json::from_slice(blob)?;
        for (name, contents) in files {
            let contents = BASE64
                .decode(contents.as_bytes())
                .map_err(|e| Error::Storage(format!("Invalid file contents: {}", e)))?;
            self.put(&name, &contents)?;
        }
        Ok(())
    }
}

/// Join `name` onto `base`, rejecting names that could escape it.
///
/// Absolute paths and any non-normal component (`..`, drive prefixes) are
/// refused, so a crafted filename cannot be written outside `base`.
pub fn resolve_within(base: &Path, name: &str) -> Result<PathBuf> {
    let candidate = Path::new(name);
    if name.is_empty() {
        return Err(Error::Storage("Empty file name".to_string()));
    }
    for component in candidate.components() {
        match component {
            Component::Normal(_) => {}
            _ => {
                return Err(Error::Storage(format!(
                    "Can not save file at path: {}",
                    name
                )))
            }
        }
    }
    Ok(base.join(candidate))
}

fn collect_files(
    root: &Path,
    dir: &Path,
    out: &mut BTreeMap<String, String>,
) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let name = path
                .strip_prefix(root)
                .map_err(|e| Error::Storage(e.to_string()))?
                .to_string_lossy()
                .into_owned();
            out.insert(name, BASE64.encode(fs::read(&path)?));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_within_accepts_plain_names() {
        let base = Path::new("/tmp/storage");
        let path = resolve_within(base, "cert.pem").unwrap();
        assert_eq!(path, base.join("cert.pem"));

        let nested = resolve_within(base, "certs/root.crt").unwrap();
        assert_eq!(nested, base.join("certs/root.crt"));
    }

    #[test]
    fn test_resolve_within_rejects_traversal() {
        let base = Path::new("/tmp/storage");
        assert!(resolve_within(base, "../outside").is_err());
        assert!(resolve_within(base, "certs/../../outside").is_err());
        assert!(resolve_within(base, "/etc/passwd").is_err());
        assert!(resolve_within(base, "").is_err());
    }

    #[test]
    fn test_export_import_round_trip() {
        let source = FileStorage::temporary().unwrap();
        source.put("token.json", b"{\"access\":\"abc\"}").unwrap();
        source.put("certs/root.crt", b"---cert---").unwrap();

        let blob = source.export_files().unwrap().expect("files exported");

        let target = FileStorage::temporary().unwrap();
        target.import_files(&blob).unwrap();

        assert!(target.contains("token.json"));
        assert!(target.contains("certs/root.crt"));
        assert_eq!(
            fs::read(target.root().join("certs/root.crt")).unwrap(),
            b"---cert---"
        );
    }

    #[test]
    fn test_export_empty_storage() {
        let storage = FileStorage::temporary().unwrap();
        assert!(storage.export_files().unwrap().is_none());
    }

    #[test]
    fn test_import_rejects_traversal_names() {
        let storage = FileStorage::temporary().unwrap();
        let blob = serde_json::to_vec(&BTreeMap::from([(
            "../evil".to_string(),
            BASE64.encode(b"x"),
        )]))
        .unwrap();
        assert!(storage.import_files(&blob).is_err());
    }
}
