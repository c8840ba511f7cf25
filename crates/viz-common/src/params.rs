//! Flat string-keyed request parameters with typed accessors.
//!
//! Absence is never an error here: every typed accessor returns
//! `Ok(None)` (or the supplied default) when the key is missing, and
//! only fails when a present value does not parse.

use std::collections::HashMap;

use crate::error::{VizError, VizResult};

/// Request parameter map.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    values: HashMap<String, String>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Required string parameter.
    pub fn require(&self, key: &str) -> VizResult<&str> {
        self.get(key).ok_or_else(|| VizError::InvalidParameter {
            param: key.to_string(),
            message: "missing required parameter".to_string(),
        })
    }

    /// Optional f64; absent is `Ok(None)`, unparsable is an error.
    pub fn get_f64(&self, key: &str) -> VizResult<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
                VizError::InvalidParameter {
                    param: key.to_string(),
                    message: format!("expected a number, got {:?}", raw),
                }
            }),
        }
    }

    /// Required f64.
    pub fn require_f64(&self, key: &str) -> VizResult<f64> {
        self.get_f64(key)?.ok_or_else(|| VizError::InvalidParameter {
            param: key.to_string(),
            message: "missing required parameter".to_string(),
        })
    }

    /// Optional u32 with default.
    pub fn u32_or(&self, key: &str, default: u32) -> VizResult<u32> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| VizError::InvalidParameter {
                param: key.to_string(),
                message: format!("expected an integer, got {:?}", raw),
            }),
        }
    }

    /// Optional boolean with default. Accepts true/false/t/f/1/0.
    pub fn bool_or(&self, key: &str, default: bool) -> VizResult<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(VizError::InvalidParameter {
                    param: key.to_string(),
                    message: format!("expected a boolean, got {:?}", raw),
                }),
            },
        }
    }

    /// Comma-separated list of integer ids; absent or empty yields an
    /// empty set.
    pub fn id_set(&self, key: &str) -> VizResult<std::collections::HashSet<i64>> {
        let mut ids = std::collections::HashSet::new();
        if let Some(raw) = self.get(key) {
            for tok in raw.split(',') {
                let tok = tok.trim();
                if tok.is_empty() {
                    continue;
                }
                let id = tok.parse().map_err(|_| VizError::InvalidParameter {
                    param: key.to_string(),
                    message: format!("expected a channel id, got {:?}", tok),
                })?;
                ids.insert(id);
            }
        }
        Ok(ids)
    }

    /// Iterate over raw key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_is_not_an_error() {
        let p = RequestParams::new();
        assert_eq!(p.get_f64("west").unwrap(), None);
        assert!(p.bool_or("xTickMarks", true).unwrap());
        assert_eq!(p.u32_or("w", 1000).unwrap(), 1000);
        assert!(p.id_set("ch").unwrap().is_empty());
    }

    #[test]
    fn test_present_but_malformed_is_an_error() {
        let p: RequestParams = [("west", "far away")].into_iter().collect();
        let err = p.get_f64("west").unwrap_err();
        assert_eq!(err.kind(), "InvalidParameter");
    }

    #[test]
    fn test_bool_spellings() {
        let p: RequestParams = [("a", "T"), ("b", "0"), ("c", "maybe")]
            .into_iter()
            .collect();
        assert!(p.bool_or("a", false).unwrap());
        assert!(!p.bool_or("b", true).unwrap());
        assert!(p.bool_or("c", true).is_err());
    }

    #[test]
    fn test_id_set_deduplicates() {
        let p: RequestParams = [("ch", "1,2,2,3, 3")].into_iter().collect();
        let ids = p.id_set("ch").unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&1) && ids.contains(&2) && ids.contains(&3));
    }

    #[test]
    fn test_require_reports_missing() {
        let p = RequestParams::new();
        assert_eq!(p.require("src").unwrap_err().kind(), "InvalidParameter");
    }
}
