use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use culls_contracts::MANIFEST_FILE_NAME;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub type Manifest = Map<String, Value>;

pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE_NAME)
}

pub fn load(path: &Path) -> Result<Manifest> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let doc: Value =
        serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))?;
    match doc {
        Value::Object(m) => Ok(m),
        other => bail!(
            "{} must hold a JSON object (got {})",
            path.display(),
            json_kind(&other)
        ),
    }
}

/// Two-space indented JSON with a single trailing newline.
pub fn render(manifest: &Manifest) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(manifest)?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn save(path: &Path, manifest: &Manifest) -> Result<()> {
    let bytes = render(manifest)?;
    write_atomic(path, &bytes)
}

/// Writes next to the real file behind `path` and renames over it, so a
/// failed write never leaves a truncated manifest behind. Symlinks are
/// followed and the file's permissions carried over.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let target =
        std::fs::canonicalize(path).with_context(|| format!("resolve {}", path.display()))?;
    let perms = std::fs::metadata(&target)
        .with_context(|| format!("stat {}", target.display()))?
        .permissions();

    let tmp = temp_path_next_to(&target);
    let written = std::fs::write(&tmp, contents)
        .with_context(|| format!("write temp: {}", tmp.display()))
        .and_then(|()| {
            std::fs::set_permissions(&tmp, perms)
                .with_context(|| format!("set permissions: {}", tmp.display()))
        })
        .and_then(|()| {
            std::fs::rename(&tmp, &target)
                .with_context(|| format!("rename: {}", target.display()))
        });
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written
}

fn temp_path_next_to(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let pid = std::process::id();
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{file_name}.{pid}.{n}.tmp"))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    static TMP_N: AtomicUsize = AtomicUsize::new(0);

    fn tmp_root(prefix: &str) -> PathBuf {
        let pid = std::process::id();
        let n = TMP_N.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!("culls_{prefix}_{pid}_{n}"));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();
        root
    }

    #[test]
    fn render_uses_two_space_indent_and_trailing_newline() {
        let Value::Object(m) = json!({ "name": "x", "scripts": { "prepare": "husky" } }) else {
            unreachable!()
        };
        let got = String::from_utf8(render(&m).unwrap()).unwrap();
        assert_eq!(
            got,
            "{\n  \"name\": \"x\",\n  \"scripts\": {\n    \"prepare\": \"husky\"\n  }\n}\n"
        );
    }

    #[test]
    fn load_keeps_key_order() {
        let root = tmp_root("load_order");
        let path = manifest_path(&root);
        std::fs::write(&path, r#"{"version":"1.0.0","name":"x","author":"a"}"#).unwrap();

        let m = load(&path).unwrap();
        let keys: Vec<&str> = m.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["version", "name", "author"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn load_rejects_missing_invalid_and_non_object() {
        let root = tmp_root("load_errors");
        let path = manifest_path(&root);

        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("read "), "{err:#}");

        std::fs::write(&path, "{ not json").unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse "), "{err:#}");

        std::fs::write(&path, "[1, 2]").unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("got array"), "{err:#}");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn save_replaces_file_and_leaves_no_temp_behind() {
        let root = tmp_root("save");
        let path = manifest_path(&root);
        std::fs::write(&path, "{}").unwrap();

        let Value::Object(m) = json!({ "name": "x" }) else {
            unreachable!()
        };
        save(&path, &m).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\n  \"name\": \"x\"\n}\n"
        );
        let entries: Vec<_> = std::fs::read_dir(&root)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("package.json")]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[cfg(unix)]
    #[test]
    fn save_follows_symlinks() {
        let root = tmp_root("save_symlink");
        let shared = root.join("shared");
        let pkg = root.join("pkg");
        std::fs::create_dir_all(&shared).unwrap();
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(shared.join("package.json"), "{}").unwrap();
        std::os::unix::fs::symlink("../shared/package.json", pkg.join("package.json")).unwrap();

        let Value::Object(m) = json!({ "name": "x" }) else {
            unreachable!()
        };
        save(&manifest_path(&pkg), &m).unwrap();

        let link = std::fs::symlink_metadata(pkg.join("package.json")).unwrap();
        assert!(link.file_type().is_symlink());
        assert_eq!(
            std::fs::read_to_string(shared.join("package.json")).unwrap(),
            "{\n  \"name\": \"x\"\n}\n"
        );
        assert_eq!(std::fs::read_dir(&shared).unwrap().count(), 1);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let root = tmp_root("save_mode");
        let path = manifest_path(&root);
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        let Value::Object(m) = json!({ "name": "x" }) else {
            unreachable!()
        };
        save(&path, &m).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn failed_rename_keeps_original_and_cleans_temp() {
        let root = tmp_root("save_rename_fail");
        let path = manifest_path(&root);
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let Value::Object(m) = json!({ "name": "x" }) else {
            unreachable!()
        };
        assert!(save(&path, &m).is_err());

        assert!(path.join("occupied").is_dir());
        let entries: Vec<_> = std::fs::read_dir(&root)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("package.json")]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn save_into_missing_dir_fails() {
        let root = tmp_root("save_missing");
        let path = manifest_path(&root.join("nope"));
        let Value::Object(m) = json!({}) else {
            unreachable!()
        };
        assert!(save(&path, &m).is_err());
        assert!(!path.exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}
