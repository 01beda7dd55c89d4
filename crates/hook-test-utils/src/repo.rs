//! Temporary git working tree fixture

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway git repository to run hooks against.
///
/// Created empty with `git init`; files become tracked through
/// [`TestRepo::commit_files`]. The directory is removed on drop.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        git2::Repository::init(dir.path()).expect("git init");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file without staging or committing it.
    pub fn write_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write file");
        path
    }

    /// Write an executable script (mode 0o755 on unix).
    pub fn write_script(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.write_file(rel, content);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod script");
        }
        path
    }

    /// Write the given files, stage everything and commit.
    pub fn commit_files(&self, files: &[(&str, &str)]) {
        for (rel, content) in files {
            self.write_file(rel, content);
        }
        self.commit_all("test commit");
    }

    /// Stage the whole tree and commit it.
    pub fn commit_all(&self, message: &str) {
        let repo = git2::Repository::open(self.dir.path()).expect("open repo");
        let mut index = repo.index().expect("index");
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .expect("git add");
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");
        let tree = repo.find_tree(tree_id).expect("find tree");
        let sig = git2::Signature::now("test", "test@example.com").expect("signature");
        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .expect("commit");
    }

    /// Write a `.hooks.yaml` manifest at the repository root.
    pub fn write_manifest(&self, yaml: &str) -> PathBuf {
        self.write_file(".hooks.yaml", yaml)
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
