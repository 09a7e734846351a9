//! Public URLs and stable URLs for files in the watched output tree.
//!
//! A bundler emits `style-3f9a2c1d.css` and, after the next rebuild,
//! `style-8b7e6f5a.css`. Both map to the stable URL `/public/style.css`,
//! which is what the classifier uses to correlate them.
//!
//! The hash pattern is a heuristic. The default strips any 6-10 character
//! alphanumeric segment sitting right before the extension, so
//! `main.bundle.js` also becomes `main.js`. Projects that hit this set
//! `[watch] hash_pattern` to something tighter.

use std::borrow::Cow;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;
use thiserror::Error;

/// Separator plus 6-10 alphanumerics right before the final extension.
pub const DEFAULT_HASH_PATTERN: &str = r"(?P<hash>[-.][A-Za-z0-9]{6,10})\.[A-Za-z0-9]+$";

/// Characters escaped inside a single URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Errors raised while compiling user-supplied patterns.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern `{0}`")]
    Invalid(String, #[source] regex::Error),

    #[error("pattern `{0}` has no `hash` capture group")]
    MissingHashGroup(String),
}

// ============================================================================
// StableUrl
// ============================================================================

/// URL with the content-hash segment of its file name removed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StableUrl(String);

impl StableUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, without query string or fragment.
    pub fn file_name(&self) -> &str {
        let path = split_suffix(&self.0).0;
        path.rsplit('/').next().unwrap_or(path)
    }
}

impl fmt::Display for StableUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StableUrl {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ============================================================================
// HashPattern
// ============================================================================

/// Compiled content-hash matcher.
///
/// The regex is matched against a file name; whatever the `hash` group
/// captures is cut out of it.
#[derive(Debug, Clone)]
pub struct HashPattern(Regex);

impl HashPattern {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let regex =
            Regex::new(pattern).map_err(|e| PatternError::Invalid(pattern.to_string(), e))?;
        if !regex.capture_names().any(|name| name == Some("hash")) {
            return Err(PatternError::MissingHashGroup(pattern.to_string()));
        }
        Ok(Self(regex))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Remove one hash segment from `name`, if present.
    ///
    /// Never strips the whole name and never returns an unchanged name.
    fn strip_once(&self, name: &str) -> Option<String> {
        let caps = self.0.captures(name)?;
        let hash = caps.name("hash")?;
        if hash.is_empty() || hash.start() == 0 {
            return None;
        }
        let mut out = String::with_capacity(name.len() - hash.len());
        out.push_str(&name[..hash.start()]);
        out.push_str(&name[hash.end()..]);
        Some(out)
    }
}

impl Default for HashPattern {
    fn default() -> Self {
        Self(Regex::new(DEFAULT_HASH_PATTERN).expect("default hash pattern is valid"))
    }
}

// ============================================================================
// UrlMapper
// ============================================================================

/// Maps files under the watched root to the URLs a browser requests.
#[derive(Debug, Clone)]
pub struct UrlMapper {
    root: PathBuf,
    prefix: String,
    pattern: HashPattern,
}

impl UrlMapper {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str, pattern: HashPattern) -> Self {
        Self {
            root: root.into(),
            prefix: normalize_prefix(url_prefix),
            pattern,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Public URL for an absolute path, `None` for paths outside the root.
    pub fn to_url(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let mut url = self.prefix.clone();
        let mut segments = 0;

        for component in rel.components() {
            let Component::Normal(segment) = component else {
                return None;
            };
            if segments > 0 {
                url.push('/');
            }
            url.extend(utf8_percent_encode(&segment.to_string_lossy(), SEGMENT));
            segments += 1;
        }

        (segments > 0).then_some(url)
    }

    pub fn to_stable_url(&self, url: &str) -> StableUrl {
        stable_url(url, &self.pattern)
    }

    /// `(stable_url, url)` for an absolute path.
    pub fn locate(&self, path: &Path) -> Option<(StableUrl, String)> {
        let url = self.to_url(path)?;
        Some((self.to_stable_url(&url), url))
    }
}

/// Strip content-hash segments from the file name of `url`.
///
/// Repeats until the name stops changing, which makes the result a fixed
/// point: `stable_url(stable_url(u)) == stable_url(u)`.
pub fn stable_url(url: &str, pattern: &HashPattern) -> StableUrl {
    let (path, suffix) = split_suffix(url);
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    let (dir, name) = path.split_at(name_start);

    let mut name = Cow::Borrowed(name);
    while let Some(stripped) = pattern.strip_once(&name) {
        name = Cow::Owned(stripped);
    }

    StableUrl(format!("{dir}{name}{suffix}"))
}

/// Split a URL into `(path, "?query#fragment")`.
fn split_suffix(url: &str) -> (&str, &str) {
    let at = url.find(|c| c == '?' || c == '#').unwrap_or(url.len());
    url.split_at(at)
}

/// `"public"` -> `"/public/"`, `""` -> `"/"`.
///
/// Absolute prefixes (`http://host/public`) keep scheme and host and only
/// gain a trailing `/`.
fn normalize_prefix(prefix: &str) -> String {
    if prefix.contains("://") {
        let mut absolute = prefix.to_string();
        if !absolute.ends_with('/') {
            absolute.push('/');
        }
        return absolute;
    }

    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> UrlMapper {
        UrlMapper::new("/srv/dist/public", "/public/", HashPattern::default())
    }

    fn stable(url: &str) -> String {
        mapper().to_stable_url(url).as_str().to_string()
    }

    #[test]
    fn test_to_url_nested() {
        let url = mapper().to_url(Path::new("/srv/dist/public/pages/home/home.page-a1b2c3d4.js"));
        assert_eq!(url.as_deref(), Some("/public/pages/home/home.page-a1b2c3d4.js"));
    }

    #[test]
    fn test_to_url_outside_root() {
        assert!(mapper().to_url(Path::new("/srv/dist/server/app.js")).is_none());
        assert!(mapper().to_url(Path::new("/srv/dist/public")).is_none());
    }

    #[test]
    fn test_to_url_percent_encodes_segments() {
        let url = mapper().to_url(Path::new("/srv/dist/public/my file#1.css"));
        assert_eq!(url.as_deref(), Some("/public/my%20file%231.css"));
    }

    #[test]
    fn test_prefix_normalization() {
        assert_eq!(UrlMapper::new("/r", "public", HashPattern::default()).prefix(), "/public/");
        assert_eq!(UrlMapper::new("/r", "", HashPattern::default()).prefix(), "/");
        assert_eq!(UrlMapper::new("/r", "/", HashPattern::default()).prefix(), "/");
    }

    #[test]
    fn test_absolute_prefix_kept() {
        let mapper = UrlMapper::new(
            "/srv/dist/public",
            "http://localhost:3000/public",
            HashPattern::default(),
        );
        assert_eq!(mapper.prefix(), "http://localhost:3000/public/");

        let url = mapper
            .to_url(Path::new("/srv/dist/public/a-1a2b3c4d.css"))
            .unwrap();
        assert_eq!(url, "http://localhost:3000/public/a-1a2b3c4d.css");
        assert_eq!(
            mapper.to_stable_url(&url).as_str(),
            "http://localhost:3000/public/a.css"
        );
    }

    #[test]
    fn test_stable_url_strips_hash() {
        assert_eq!(stable("/public/style-aaa111.css"), "/public/style.css");
        assert_eq!(stable("/public/style-bbb222.css"), "/public/style.css");
        assert_eq!(stable("/public/app.3f9a2c1d.js"), "/public/app.js");
        assert_eq!(
            stable("/public/pages/home/home.page-a1b2c3d4.js"),
            "/public/pages/home/home.page.js"
        );
    }

    #[test]
    fn test_stable_url_leaves_plain_names() {
        assert_eq!(stable("/public/favicon.ico"), "/public/favicon.ico");
        assert_eq!(stable("/public/home.page.js"), "/public/home.page.js");
        // too short to be a hash
        assert_eq!(stable("/public/chunk-c1.js"), "/public/chunk-c1.js");
    }

    #[test]
    fn test_stable_url_keeps_query_and_fragment() {
        assert_eq!(stable("/public/style-aaa111.css?v=2#x"), "/public/style.css?v=2#x");
    }

    #[test]
    fn test_stable_url_only_touches_file_name() {
        assert_eq!(stable("/public/build-abcdef12/app.js"), "/public/build-abcdef12/app.js");
    }

    #[test]
    fn test_stable_url_idempotent() {
        for url in [
            "/public/style-aaa111.css",
            "/public/vendor-abcdef-123456.js",
            "/public/main.bundle.js",
            "/public/x",
            "",
            "/public/-abcdef.css",
        ] {
            let once = stable(url);
            assert_eq!(stable(&once), once, "not idempotent for {url}");
        }
    }

    #[test]
    fn test_heuristic_false_positive_is_accepted() {
        // `bundle` looks like a hash to the default pattern
        assert_eq!(stable("/public/main.bundle.js"), "/public/main.js");
    }

    #[test]
    fn test_custom_pattern_for_short_hashes() {
        let pattern = HashPattern::new(r"(?P<hash>-[a-z0-9]{1,8})\.[a-z]+$").unwrap();
        let mapper = UrlMapper::new("/r", "/", pattern);
        assert_eq!(mapper.to_stable_url("/home.page-h1.js").as_str(), "/home.page.js");
        assert_eq!(mapper.to_stable_url("/chunk-c1.js").as_str(), "/chunk.js");
    }

    #[test]
    fn test_pattern_errors() {
        assert!(matches!(
            HashPattern::new("(unclosed"),
            Err(PatternError::Invalid(..))
        ));
        assert!(matches!(
            HashPattern::new(r"-[a-z0-9]{8}\.js$"),
            Err(PatternError::MissingHashGroup(_))
        ));
    }

    #[test]
    fn test_stable_file_name() {
        let stable = mapper().to_stable_url("/public/pages/home/home.page-a1b2c3d4.js?v=1");
        assert_eq!(stable.file_name(), "home.page.js");
    }
}
