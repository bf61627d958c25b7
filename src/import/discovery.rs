use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::traits::FileSystem;

/// Whether the file name ends with `suffix` (e.g. `.tf`, `.tfstate`)
pub fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(suffix))
        .unwrap_or(false)
}

/// Files under `root` whose name ends with `suffix`, in walk order
///
/// Walk order is depth-first with siblings sorted by name, so repeated runs
/// over the same tree see files in the same order. A missing root yields no
/// files.
pub fn discover_files(fs: &dyn FileSystem, root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    if !fs.is_dir(root) {
        return Ok(Vec::new());
    }

    Ok(fs
        .walk_dir(root, usize::MAX)?
        .into_iter()
        .filter(|path| has_suffix(path, suffix) && fs.is_file(path))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockFileSystem;

    #[test]
    fn test_suffix_is_matched_on_file_name() {
        assert!(has_suffix(Path::new("out/aws/vpc/vpc.tf"), ".tf"));
        assert!(!has_suffix(Path::new("out/aws/vpc/terraform.tfstate"), ".tf"));
        assert!(has_suffix(Path::new("out/aws/vpc/terraform.tfstate"), ".tfstate"));
        assert!(!has_suffix(Path::new("out/aws/vpc.tf.bak"), ".tf"));
    }

    #[test]
    fn test_discover_skips_other_files_and_dirs() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("/out/aws/vpc/vpc.tf"), "").unwrap();
        fs.write(Path::new("/out/aws/vpc/terraform.tfstate"), "{}").unwrap();
        fs.write(Path::new("/out/aws/s3/s3.tf"), "").unwrap();
        fs.create_dir_all(Path::new("/out/aws/weird.tf")).unwrap();

        let files = discover_files(&fs, Path::new("/out"), ".tf").unwrap();

        assert_eq!(
            files,
            vec![
                PathBuf::from("/out/aws/s3/s3.tf"),
                PathBuf::from("/out/aws/vpc/vpc.tf"),
            ]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let fs = MockFileSystem::new();
        assert!(discover_files(&fs, Path::new("/nope"), ".tf").unwrap().is_empty());
    }
}
