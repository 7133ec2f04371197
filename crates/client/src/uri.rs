//! Request path construction for repository documents.

use std::borrow::Cow;

/// Collapse every run of `/` into a single separator.
pub fn squeeze_slashes(path: &str) -> String {
    let mut squeezed = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch == '/' && squeezed.ends_with('/') {
            continue;
        }
        squeezed.push(ch);
    }
    squeezed
}

/// `path` with a leading `/`, so it can follow a host directly.
pub fn absolute_path(path: &str) -> Cow<'_, str> {
    if path.starts_with('/') { Cow::Borrowed(path) } else { Cow::Owned(format!("/{path}")) }
}

/// Extension of the final path segment, dot included.
///
/// Returns `""` when there is none. Leading dots do not start an extension
/// (`.env` has none), and neither does a trailing one.
pub fn extname(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    let stem_start = name.len() - name.trim_start_matches('.').len();

    match name[stem_start..].rfind('.') {
        Some(dot) if stem_start + dot + 1 < name.len() => &name[stem_start + dot..],
        _ => "",
    }
}

/// Append `fallback` to `slug` unless it already has an extension.
pub fn ensure_ext(slug: &str, fallback: &str) -> String {
    if extname(slug).is_empty() { format!("{slug}{fallback}") } else { slug.to_string() }
}

/// `/{org}/{repo}/{branch}/{doc_root}/{slug}` with separators collapsed.
pub fn document_path(org: &str, repo: &str, branch: &str, doc_root: &str, slug: &str) -> String {
    squeeze_slashes(&format!("/{org}/{repo}/{branch}/{doc_root}/{slug}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squeeze_slashes() {
        assert_eq!(squeeze_slashes("//a///b/c//"), "/a/b/c/");
        assert_eq!(squeeze_slashes("/a/b"), "/a/b");
        assert_eq!(squeeze_slashes(""), "");
    }

    #[test]
    fn test_absolute_path() {
        assert_eq!(absolute_path("/a.doc"), "/a.doc");
        assert!(matches!(absolute_path("/a.doc"), Cow::Borrowed(_)));
        assert_eq!(absolute_path("a.doc"), "/a.doc");
        assert_eq!(absolute_path(""), "/");
    }

    #[test]
    fn test_extname() {
        assert_eq!(extname("any-file.ext"), ".ext");
        assert_eq!(extname("/docs/guide/intro.md"), ".md");
        assert_eq!(extname("archive.tar.gz"), ".gz");
        assert_eq!(extname("README"), "");
        assert_eq!(extname("/docs.d/README"), "");
    }

    #[test]
    fn test_extname_dotfiles() {
        assert_eq!(extname(".env"), "");
        assert_eq!(extname("/config/.env"), "");
        assert_eq!(extname("..hidden"), "");
        assert_eq!(extname(".env.local"), ".local");
        assert_eq!(extname("trailing."), "");
    }

    #[test]
    fn test_ensure_ext() {
        assert_eq!(ensure_ext("any-file", ".md"), "any-file.md");
        assert_eq!(ensure_ext("any-file.ext", ".md"), "any-file.ext");
        assert_eq!(ensure_ext(".env", ".md"), ".env.md");
        assert_eq!(ensure_ext("guide/intro", ""), "guide/intro");
    }

    #[test]
    fn test_document_path() {
        assert_eq!(
            document_path("any-org", "any-repo", "master", "docs", "any-file.ext"),
            "/any-org/any-repo/master/docs/any-file.ext"
        );
        assert_eq!(document_path("o", "r", "b", "/", "any-file.ext"), "/o/r/b/any-file.ext");
        assert_eq!(document_path("o", "r", "b", "/nested//root/", "/a.md"), "/o/r/b/nested/root/a.md");
        assert_eq!(document_path("", "", "b", "docs", "a.md"), "/b/docs/a.md");
    }
}
