//! URI template grammar: exactly one `{param}` placeholder, at the tail.
//!
//! Restricting the grammar to a single trailing placeholder means a plain
//! prefix/suffix string match is sufficient — no `regex` dependency needed.
//! Rejection happens at construction time instead of at match time, since
//! an invalid template can never be built in the first place.

use crate::error::ServerError;

#[derive(Debug, Clone)]
pub struct UriTemplate {
    raw: String,
    prefix: String,
    param_name: String,
}

impl UriTemplate {
    /// Parses `raw`, requiring exactly one `{name}` placeholder positioned
    /// at the end of the string. Anything else is rejected up front.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ServerError> {
        let raw = raw.into();
        let open = raw.find('{');
        let close = raw.rfind('}');

        let (open, close) = match (open, close) {
            (Some(o), Some(c)) if c > o => (o, c),
            _ => return Err(ServerError::UnsupportedTemplate(raw)),
        };

        if close != raw.len() - 1 {
            return Err(ServerError::UnsupportedTemplate(raw));
        }
        let param_name = &raw[open + 1..close];
        if param_name.is_empty() || param_name.contains(['{', '}']) {
            return Err(ServerError::UnsupportedTemplate(raw));
        }
        // A second `{` before the tail placeholder means more than one
        // parameter was requested, which this grammar does not support.
        if raw[..open].contains('{') {
            return Err(ServerError::UnsupportedTemplate(raw));
        }

        Ok(Self {
            prefix: raw[..open].to_string(),
            param_name: param_name.to_string(),
            raw,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn param_name(&self) -> &str {
        &self.param_name
    }

    /// Matches `uri` against this template, returning the captured
    /// parameter value. The captured substring must be non-empty; it may
    /// contain `/`, since a template parameter can stand for a multi-segment
    /// path (e.g. `path = "examples/x.txt"`). Traversal safety is the
    /// handler's job via `check_safe_path`, not this matcher's.
    pub fn matches(&self, uri: &str) -> Option<String> {
        let captured = uri.strip_prefix(self.prefix.as_str())?;
        if captured.is_empty() {
            return None;
        }
        Some(captured.to_string())
    }

    pub fn render(&self, value: &str) -> String {
        format!("{}{}", self.prefix, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_trailing_placeholder() {
        let t = UriTemplate::parse("file:///./{path}").unwrap();
        assert_eq!(t.param_name(), "path");
        assert_eq!(t.matches("file:///./x.txt"), Some("x.txt".to_string()));
    }

    #[test]
    fn rejects_non_tail_placeholder() {
        assert!(UriTemplate::parse("file:///{path}/tail").is_err());
    }

    #[test]
    fn rejects_multiple_placeholders() {
        assert!(UriTemplate::parse("file:///{a}/{b}").is_err());
    }

    #[test]
    fn rejects_missing_placeholder() {
        assert!(UriTemplate::parse("file:///static").is_err());
    }

    #[test]
    fn match_captures_multi_segment_path_but_rejects_empty_capture() {
        let t = UriTemplate::parse("file:///./{path}").unwrap();
        assert_eq!(t.matches("file:///./a/b"), Some("a/b".to_string()));
        assert_eq!(t.matches("file:///./"), None);
        assert_eq!(t.matches("other://x"), None);
    }
}
