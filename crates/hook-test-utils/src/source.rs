//! Temporary upstream hook repository fixture

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway hook source repository: a git repo carrying a
/// `hooks.yaml` definition registry and optionally the scripts it
/// refers to, pinned by a tag.
pub struct HookSourceRepo {
    dir: TempDir,
}

impl HookSourceRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        git2::Repository::init(dir.path()).expect("git init");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The locator manifests use to reference this repository.
    pub fn locator(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    /// Write the `hooks.yaml` definition registry.
    pub fn write_registry(&self, yaml: &str) {
        std::fs::write(self.dir.path().join("hooks.yaml"), yaml).expect("write registry");
    }

    /// Write an executable script next to the registry.
    pub fn write_script(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write script");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod script");
        }
        path
    }

    /// Commit everything and pin it under `tag`, returning the tag.
    pub fn commit_tagged(&self, tag: &str) -> String {
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
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, "release", &tree, &parent_refs)
            .expect("commit");
        repo.tag_lightweight(tag, &repo.find_object(oid, None).expect("object"), true)
            .expect("tag");
        tag.to_string()
    }
}

impl Default for HookSourceRepo {
    fn default() -> Self {
        Self::new()
    }
}
