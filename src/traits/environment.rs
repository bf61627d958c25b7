#[cfg(test)]
use std::collections::HashMap;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::RwLock;

/// Trait for reading (and, during install, extending) the process environment
pub trait Environment: Send + Sync {
    /// Value of an environment variable, `None` when unset or not unicode
    fn var(&self, name: &str) -> Option<String>;

    /// Whether the process runs with an effective uid of 0
    fn is_privileged(&self) -> bool;

    /// Home directory of the current user
    fn home_dir(&self) -> Option<PathBuf>;

    /// Directory for staging downloads
    fn temp_dir(&self) -> PathBuf;

    /// Host operating system, as reported by `std::env::consts::OS`
    fn os(&self) -> String;

    /// Host CPU architecture, as reported by `std::env::consts::ARCH`
    fn arch(&self) -> String;

    /// Append a directory to `PATH` for this process and its children
    fn append_to_path(&self, dir: &Path);

    /// Whether a directory is already one of the `PATH` entries
    fn path_contains(&self, dir: &Path) -> bool {
        self.var("PATH")
            .map(|path| std::env::split_paths(&path).any(|entry| entry == dir))
            .unwrap_or(false)
    }
}

/// Real environment backed by the running process
pub struct RealEnvironment;

impl Environment for RealEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    #[cfg(unix)]
    fn is_privileged(&self) -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(unix))]
    fn is_privileged(&self) -> bool {
        false
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn os(&self) -> String {
        std::env::consts::OS.to_string()
    }

    fn arch(&self) -> String {
        std::env::consts::ARCH.to_string()
    }

    fn append_to_path(&self, dir: &Path) {
        let mut entries: Vec<PathBuf> = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        entries.push(dir.to_path_buf());

        if let Ok(joined) = std::env::join_paths(entries) {
            // SAFETY: the tool is single-threaded; nothing reads the
            // environment concurrently with this write
            unsafe { std::env::set_var("PATH", joined) };
        }
    }
}

/// Mock environment for testing
#[cfg(test)]
pub struct MockEnvironment {
    vars: RwLock<HashMap<String, String>>,
    privileged: bool,
    home: Option<PathBuf>,
    os: String,
    arch: String,
}

#[cfg(test)]
impl MockEnvironment {
    /// Unprivileged linux/x86_64 host with home `/home/tester` and no variables
    pub fn new() -> Self {
        Self {
            vars: RwLock::new(HashMap::new()),
            privileged: false,
            home: Some(PathBuf::from("/home/tester")),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        }
    }

    pub fn with_var(self, name: &str, value: &str) -> Self {
        self.set_var(name, value);
        self
    }

    pub fn with_privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    pub fn with_platform(mut self, os: &str, arch: &str) -> Self {
        self.os = os.to_string();
        self.arch = arch.to_string();
        self
    }

    pub fn without_home(mut self) -> Self {
        self.home = None;
        self
    }

    pub fn set_var(&self, name: &str, value: &str) {
        self.vars
            .write()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }
}

#[cfg(test)]
impl Default for MockEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Environment for MockEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.read().unwrap().get(name).cloned()
    }

    fn is_privileged(&self) -> bool {
        self.privileged
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn temp_dir(&self) -> PathBuf {
        PathBuf::from("/tmp")
    }

    fn os(&self) -> String {
        self.os.clone()
    }

    fn arch(&self) -> String {
        self.arch.clone()
    }

    fn append_to_path(&self, dir: &Path) {
        let current = self.var("PATH").unwrap_or_default();
        let updated = if current.is_empty() {
            dir.display().to_string()
        } else {
            format!("{}:{}", current, dir.display())
        };
        self.set_var("PATH", &updated);
    }
}
