//! File type tagging
//!
//! Classifies working-tree files into the type tags hooks filter on
//! (`types: [python]` and friends). Tags come from the file name and
//! extension, the shebang line for extensionless scripts, the executable
//! bit, and a text/binary sniff of the leading bytes.

use std::collections::BTreeSet;
use std::path::Path;

/// Number of leading bytes sniffed for the text/binary decision.
const SNIFF_LEN: usize = 1024;

/// Extension to tag mapping. The first tag is the language tag; extra
/// entries are supplementary tags.
const EXTENSION_TAGS: &[(&str, &[&str])] = &[
    ("bash", &["bash", "shell"]),
    ("c", &["c"]),
    ("cfg", &["ini"]),
    ("cpp", &["c++"]),
    ("css", &["css"]),
    ("go", &["go"]),
    ("h", &["c", "header"]),
    ("html", &["html"]),
    ("ini", &["ini"]),
    ("js", &["javascript"]),
    ("json", &["json"]),
    ("jsx", &["jsx", "javascript"]),
    ("md", &["markdown"]),
    ("py", &["python"]),
    ("pyi", &["python", "pyi"]),
    ("rb", &["ruby"]),
    ("rs", &["rust"]),
    ("rst", &["rst"]),
    ("sh", &["shell"]),
    ("svg", &["svg", "xml"]),
    ("toml", &["toml"]),
    ("ts", &["ts"]),
    ("tsx", &["tsx", "ts"]),
    ("txt", &["plain-text"]),
    ("xml", &["xml"]),
    ("yaml", &["yaml"]),
    ("yml", &["yaml"]),
];

/// Special file names recognized regardless of extension.
const NAME_TAGS: &[(&str, &[&str])] = &[
    ("Dockerfile", &["dockerfile"]),
    ("Makefile", &["makefile"]),
];

/// Shebang interpreter to tag mapping.
const SHEBANG_TAGS: &[(&str, &[&str])] = &[
    ("bash", &["bash", "shell"]),
    ("node", &["javascript"]),
    ("python", &["python"]),
    ("python3", &["python"]),
    ("sh", &["shell"]),
];

/// Compute the type tags for one file under `root`.
///
/// `rel` is the repository-relative path. A path that no longer exists
/// yields just the `file` tag; classification never fails.
pub fn tags_for_path(root: &Path, rel: &Path) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    tags.insert("file".to_string());

    let full = root.join(rel);
    let meta = match std::fs::symlink_metadata(&full) {
        Ok(m) => m,
        Err(_) => return tags,
    };
    if meta.is_symlink() {
        tags.insert("symlink".to_string());
        return tags;
    }

    if is_executable(&meta) {
        tags.insert("executable".to_string());
    } else {
        tags.insert("non-executable".to_string());
    }

    if let Some(name) = rel.file_name().and_then(|n| n.to_str()) {
        for (known, extra) in NAME_TAGS {
            if name == *known {
                extend(&mut tags, extra);
            }
        }
    }

    let mut tagged_by_suffix = false;
    if let Some(ext) = rel.extension().and_then(|e| e.to_str()) {
        let lower = ext.to_ascii_lowercase();
        for (known, extra) in EXTENSION_TAGS {
            if lower == *known {
                extend(&mut tags, extra);
                tagged_by_suffix = true;
            }
        }
    }

    let head = read_head(&full);
    if !tagged_by_suffix
        && let Some(interpreter) = shebang_interpreter(&head)
    {
        for (known, extra) in SHEBANG_TAGS {
            if interpreter == *known {
                extend(&mut tags, extra);
            }
        }
    }

    if head.contains(&0u8) {
        tags.insert("binary".to_string());
    } else {
        tags.insert("text".to_string());
    }

    tags
}

fn extend(tags: &mut BTreeSet<String>, extra: &[&str]) {
    for tag in extra {
        tags.insert((*tag).to_string());
    }
}

fn is_executable(meta: &std::fs::Metadata) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        let _ = meta;
        false
    }
}

fn read_head(path: &Path) -> Vec<u8> {
    use std::io::Read;
    let Ok(file) = std::fs::File::open(path) else {
        return Vec::new();
    };
    let mut buf = Vec::with_capacity(SNIFF_LEN);
    let _ = file.take(SNIFF_LEN as u64).read_to_end(&mut buf);
    buf
}

/// Extract the interpreter name from a `#!` line, unwrapping `env`.
fn shebang_interpreter(head: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(head).ok()?;
    let line = text.lines().next()?;
    let rest = line.strip_prefix("#!")?;
    let mut words = rest.split_whitespace();
    let program = Path::new(words.next()?)
        .file_name()?
        .to_str()?
        .to_string();
    if program == "env" {
        return words.next().map(str::to_string);
    }
    Some(program)
}
