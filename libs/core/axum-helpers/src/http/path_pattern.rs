/// A route path where a `*` segment matches any single segment.
///
/// `"/api/snapshots/*/restore"` matches `/api/snapshots/docs/restore`
/// but not `/api/snapshots/docs/x/restore`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPattern(String);

impl PathPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut expected = self.0.split('/');
        let mut actual = path.split('/');
        loop {
            match (expected.next(), actual.next()) {
                (None, None) => return true,
                (Some("*"), Some(seg)) if !seg.is_empty() => continue,
                (Some(e), Some(a)) if e == a => continue,
                _ => return false,
            }
        }
    }
}

impl From<&str> for PathPattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
