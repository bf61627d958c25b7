use anyhow::{Context, Result};
#[cfg(test)]
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::{Arc, RwLock};

/// Trait for filesystem operations to enable testing with mocks
pub trait FileSystem: Send + Sync {
    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write string contents to file, replacing any existing content
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Write raw bytes to file, replacing any existing content
    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Create directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Copy a file, keeping permissions and modification time
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Move a file, falling back to copy and delete across devices
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Mark a file as executable by everyone
    fn set_executable(&self, path: &Path) -> Result<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Walk directory recursively, depth-first with siblings sorted by name
    fn walk_dir(&self, path: &Path, max_depth: usize) -> Result<Vec<PathBuf>>;
}

/// Real filesystem implementation using std::fs
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.write_bytes(path, contents.as_bytes())
    }

    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create parent directory: {:?}", parent))?;
        }

        std::fs::write(path, contents).with_context(|| format!("Failed to write file: {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {:?}", path))
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let metadata = std::fs::metadata(from)
            .with_context(|| format!("Failed to read metadata: {:?}", from))?;
        let modified = metadata
            .modified()
            .with_context(|| format!("Failed to read modification time: {:?}", from))?;

        // A read-only copy from an earlier run cannot be truncated in place
        if std::fs::metadata(to).is_ok_and(|existing| existing.permissions().readonly()) {
            make_writable(to)?;
        }

        // Content and mtime go through a write handle, so the source
        // permissions are applied last
        let mut source =
            std::fs::File::open(from).with_context(|| format!("Failed to open file: {:?}", from))?;
        let mut target = std::fs::File::create(to)
            .with_context(|| format!("Failed to create file: {:?}", to))?;
        std::io::copy(&mut source, &mut target)
            .with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
        target
            .set_modified(modified)
            .with_context(|| format!("Failed to set modification time: {:?}", to))?;
        drop(target);

        std::fs::set_permissions(to, metadata.permissions())
            .with_context(|| format!("Failed to set permissions: {:?}", to))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        if std::fs::rename(from, to).is_ok() {
            return Ok(());
        }

        // rename(2) fails across filesystems (e.g. /tmp on tmpfs)
        move_by_copy(self, from, to)
    }

    #[cfg(unix)]
    fn set_executable(&self, path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = std::fs::metadata(path)
            .with_context(|| format!("Failed to read metadata: {:?}", path))?
            .permissions();
        permissions.set_mode(0o755);

        std::fs::set_permissions(path, permissions)
            .with_context(|| format!("Failed to mark as executable: {:?}", path))
    }

    #[cfg(not(unix))]
    fn set_executable(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn walk_dir(&self, path: &Path, max_depth: usize) -> Result<Vec<PathBuf>> {
        use walkdir::WalkDir;

        let mut paths = Vec::new();
        for entry in WalkDir::new(path).max_depth(max_depth).sort_by_file_name() {
            let entry = entry.context("Failed to walk directory")?;
            paths.push(entry.path().to_path_buf());
        }

        Ok(paths)
    }
}

fn move_by_copy(fs: &RealFileSystem, from: &Path, to: &Path) -> Result<()> {
    fs.copy_file(from, to)?;
    std::fs::remove_file(from).with_context(|| format!("Failed to remove file: {:?}", from))
}

#[cfg(unix)]
fn make_writable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {:?}", path))?
        .permissions();
    permissions.set_mode(permissions.mode() | 0o200);

    std::fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to make writable: {:?}", path))
}

#[cfg(not(unix))]
fn make_writable(path: &Path) -> Result<()> {
    let mut permissions = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {:?}", path))?
        .permissions();
    permissions.set_readonly(false);

    std::fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to make writable: {:?}", path))
}

/// Mock filesystem implementation for testing (in-memory)
#[cfg(test)]
pub struct MockFileSystem {
    files: Arc<RwLock<HashMap<PathBuf, String>>>,
    directories: Arc<RwLock<HashSet<PathBuf>>>,
    executables: Arc<RwLock<HashSet<PathBuf>>>,
}

#[cfg(test)]
impl MockFileSystem {
    /// Create new empty mock filesystem
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            directories: Arc::new(RwLock::new(HashSet::new())),
            executables: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Get captured file contents for testing assertions
    pub fn get_file_contents(&self, path: &Path) -> Option<String> {
        self.files.read().unwrap().get(path).cloned()
    }

    /// Check if file was written
    pub fn has_file(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    /// Check if file was marked executable
    pub fn is_executable(&self, path: &Path) -> bool {
        self.executables.read().unwrap().contains(path)
    }
}

#[cfg(test)]
impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .with_context(|| format!("File not found in mock filesystem: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        // Ensure all parent directories exist in mock (recursively)
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }

        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write(path, &String::from_utf8_lossy(contents))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut directories = self.directories.write().unwrap();

        // Also add parent directories
        let mut current = Some(path);
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            directories.insert(dir.to_path_buf());
            current = dir.parent();
        }

        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            if !parent.as_os_str().is_empty() && !self.is_dir(parent) {
                anyhow::bail!("Destination directory does not exist: {:?}", parent);
            }
        }

        let contents = self.read_to_string(from)?;
        self.files
            .write()
            .unwrap()
            .insert(to.to_path_buf(), contents);

        if self.is_executable(from) {
            self.executables.write().unwrap().insert(to.to_path_buf());
        }

        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.copy_file(from, to)?;
        self.files.write().unwrap().remove(from);
        self.executables.write().unwrap().remove(from);
        Ok(())
    }

    fn set_executable(&self, path: &Path) -> Result<()> {
        if !self.is_file(path) {
            anyhow::bail!("File not found in mock filesystem: {:?}", path);
        }

        self.executables.write().unwrap().insert(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
            || self.directories.read().unwrap().contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.directories.read().unwrap().contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    fn walk_dir(&self, path: &Path, max_depth: usize) -> Result<Vec<PathBuf>> {
        if !self.exists(path) {
            anyhow::bail!("Failed to walk directory: {:?} not found", path);
        }

        let files = self.files.read().unwrap();
        let directories = self.directories.read().unwrap();

        let within_depth = |entry: &&PathBuf| match entry.strip_prefix(path) {
            Ok(relative) => relative.components().count() <= max_depth,
            Err(_) => false,
        };

        // Path ordering is component-wise, which matches a depth-first walk
        // with siblings sorted by name
        let mut entries: Vec<PathBuf> = files
            .keys()
            .chain(directories.iter())
            .filter(within_depth)
            .cloned()
            .collect();
        entries.sort();
        entries.dedup();

        Ok(entries)
    }
}
