//! Vault path helpers. Vault paths are `/`-separated and relative to the vault root.

/// Last `/`-separated segment of `path`, or the whole path when that segment is empty.
pub fn basename(path: &str) -> &str {
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => path,
    }
}

/// Resolve `target` against the remote folder `cwd`.
///
/// A leading `/` starts from the vault root. `.` and `..` are honoured and
/// `..` stops at the root. A trailing `/` on `target` is kept.
pub fn resolve(cwd: &str, target: &str) -> String {
    let mut parts: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        cwd.split('/').filter(|c| !c.is_empty()).collect()
    };

    for comp in target.split('/') {
        match comp {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }

    let mut resolved = parts.join("/");
    if !resolved.is_empty() && is_dir_like(target) {
        resolved.push('/');
    }
    resolved
}

/// Resolve `target` as a folder: the root is `""`, everything else ends with `/`.
pub fn resolve_dir(cwd: &str, target: &str) -> String {
    let mut resolved = resolve(cwd, target);
    if !resolved.is_empty() && !resolved.ends_with('/') {
        resolved.push('/');
    }
    resolved
}

fn is_dir_like(target: &str) -> bool {
    target.ends_with('/')
        || target == "."
        || target == ".."
        || target.ends_with("/.")
        || target.ends_with("/..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename_nested() {
        assert_eq!(basename("a/b/c.md"), "c.md");
    }

    #[test]
    fn test_basename_without_separator() {
        assert_eq!(basename("root.md"), "root.md");
    }

    #[test]
    fn test_basename_trailing_slash_keeps_full_path() {
        assert_eq!(basename("notes/"), "notes/");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve("notes/", "a.md"), "notes/a.md");
        assert_eq!(resolve("", "a.md"), "a.md");
        assert_eq!(resolve("notes/daily/", "../a.md"), "notes/a.md");
    }

    #[test]
    fn test_resolve_absolute() {
        assert_eq!(resolve("notes/", "/inbox/b.md"), "inbox/b.md");
        assert_eq!(resolve("notes/", "/"), "");
    }

    #[test]
    fn test_resolve_parent_stops_at_root() {
        assert_eq!(resolve("notes/", "../../../x.md"), "x.md");
    }

    #[test]
    fn test_resolve_dir() {
        assert_eq!(resolve_dir("notes/", ".."), "");
        assert_eq!(resolve_dir("", "notes"), "notes/");
        assert_eq!(resolve_dir("notes/", "daily/"), "notes/daily/");
        assert_eq!(resolve_dir("notes/", "."), "notes/");
    }
}
