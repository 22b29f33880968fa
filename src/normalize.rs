//! Turns the photo references stored by the backend into URLs we can fetch.
//!
//! The backend is not consistent about how it stores these: evidence photos
//! arrive either as a JSON array serialized into a string, or as a plain
//! comma-separated list, and both forms may carry stray quotes, brackets and
//! Windows path separators.

use log::debug;

const STRAY_CHARS: &[char] = &['\'', '"', '[', ']'];

fn strip_stray(candidate: &str) -> String {
    candidate
        .chars()
        .filter(|c| !STRAY_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Splits a raw multi-photo field into clean relative paths, in order.
pub fn normalize_list(raw: Option<&str>) -> Vec<String> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Vec::new(),
    };
    let candidates = match serde_json::from_str::<Vec<String>>(raw) {
        Ok(paths) => paths,
        Err(e) => {
            debug!("Photo list is not a JSON array ({}), splitting on commas", e);
            raw.split(',').map(str::to_string).collect()
        }
    };
    candidates
        .iter()
        .map(|candidate| strip_stray(candidate))
        .filter(|path| !path.is_empty())
        .collect()
}

/// Cleans a single relative path: no stray characters, forward slashes only,
/// no drive prefix and no leading slash.
pub fn clean_path(raw: &str) -> Option<String> {
    let path = strip_stray(raw).replace('\\', "/");
    let path = strip_drive_prefix(&path).trim_start_matches('/');
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

fn strip_drive_prefix(path: &str) -> &str {
    let bytes = path.as_bytes();
    let has_drive = bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/');
    if has_drive {
        &path[2..]
    } else {
        path
    }
}

/// Builds the absolute URL for a single raw photo reference.
pub fn normalize_single(raw: Option<&str>, host: &str) -> Option<String> {
    let path = clean_path(raw?)?;
    Some(format!("{}/{}", host.trim_end_matches('/'), path))
}

/// A backend host that photo references are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHost {
    host: String,
}

impl ImageHost {
    pub fn new(host: impl Into<String>) -> Self {
        ImageHost { host: host.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.host
    }

    pub fn photo_url(&self, raw: Option<&str>) -> Option<String> {
        normalize_single(raw, &self.host)
    }

    /// Absolute URLs for every photo in a raw multi-photo field.
    pub fn photo_urls(&self, raw: Option<&str>) -> Vec<String> {
        normalize_list(raw)
            .iter()
            .filter_map(|path| self.photo_url(Some(path)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_values_are_empty() {
        assert!(normalize_list(None).is_empty());
        assert!(normalize_list(Some("")).is_empty());
        assert_eq!(normalize_single(None, "http://h"), None);
        assert_eq!(normalize_single(Some(""), "http://h"), None);
    }

    #[test]
    fn json_array_is_decoded_and_cleaned() {
        assert_eq!(
            normalize_list(Some(r#"["'a.jpg'", "", "b.jpg"]"#)),
            vec!["a.jpg", "b.jpg"]
        );
        assert_eq!(
            normalize_list(Some(r#"["uploads/x,y.jpg"]"#)),
            vec!["uploads/x,y.jpg"]
        );
    }

    #[test]
    fn malformed_input_falls_back_to_commas() {
        assert_eq!(
            normalize_list(Some("['a.jpg', 'b.jpg',  ]")),
            vec!["a.jpg", "b.jpg"]
        );
        assert_eq!(
            normalize_list(Some("uploads/1.jpg, uploads/2.jpg")),
            vec!["uploads/1.jpg", "uploads/2.jpg"]
        );
    }

    #[test]
    fn non_array_json_falls_back_to_commas() {
        assert_eq!(normalize_list(Some("42")), vec!["42"]);
        assert_eq!(
            normalize_list(Some(r#"{"a": 1, "b": 2}"#)),
            vec![r#"{a: 1"#, r#"b: 2}"#]
        );
        assert_eq!(normalize_list(Some("[1, 2]")), vec!["1", "2"]);
    }

    #[test]
    fn normalizing_twice_is_stable() {
        let once = normalize_list(Some(r#"["'a.jpg'", " [b.jpg] "]"#));
        let joined = once.join(",");
        assert_eq!(normalize_list(Some(&joined)), once);
    }

    #[test]
    fn windows_paths_become_urls() {
        assert_eq!(
            normalize_single(Some("C:\\a\\b.jpg"), "http://h"),
            Some("http://h/a/b.jpg".to_string())
        );
        assert_eq!(
            normalize_single(Some("uploads\\20240101_120000.jpg"), "http://h:5000/"),
            Some("http://h:5000/uploads/20240101_120000.jpg".to_string())
        );
    }

    #[test]
    fn leading_slashes_and_quotes_are_removed() {
        assert_eq!(
            normalize_single(Some(r#""///uploads/a.jpg""#), "http://h//"),
            Some("http://h/uploads/a.jpg".to_string())
        );
        assert_eq!(normalize_single(Some("'[]'"), "http://h"), None);
    }

    #[test]
    fn host_resolves_every_evidence_photo() {
        let host = ImageHost::new("http://backend:5000");
        assert_eq!(
            host.photo_urls(Some(r#"["uploads\\a.jpg", "/uploads/b.jpg"]"#)),
            vec![
                "http://backend:5000/uploads/a.jpg",
                "http://backend:5000/uploads/b.jpg"
            ]
        );
        assert!(host.photo_urls(None).is_empty());
    }
}
