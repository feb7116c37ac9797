use crate::config::ExclusionConfig;

/// Splits a path into its non-empty segments, ignoring leading and trailing slashes.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.trim().trim_matches('/').split('/').filter(|s| !s.is_empty())
}

/// Decides which requests bypass region handling entirely.
#[derive(Debug)]
pub struct Exclusions {
    prefixes: Vec<Vec<String>>,
    extensions: Vec<String>,
}

impl Exclusions {
    pub fn new(config: &ExclusionConfig) -> Self {
        let prefixes = config
            .prefixes
            .iter()
            .map(|p| segments(p).map(String::from).collect::<Vec<_>>())
            .filter(|p| !p.is_empty())
            .collect();

        let extensions = config
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Exclusions {
            prefixes,
            extensions,
        }
    }

    /// True when the leading segments of `path` equal one of the configured prefixes, or the
    /// final segment ends in one of the configured extensions.
    pub fn is_excluded(&self, path: &str) -> bool {
        let path_segments: Vec<&str> = segments(path).collect();

        let prefix_match = self.prefixes.iter().any(|prefix| {
            prefix.len() <= path_segments.len()
                && prefix.iter().zip(&path_segments).all(|(p, s)| p.as_str() == *s)
        });
        if prefix_match {
            return true;
        }

        path_segments
            .last()
            .and_then(|last| last.rsplit_once('.'))
            .is_some_and(|(_, ext)| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
    }
}
