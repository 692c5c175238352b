//! Canonical query-parameter maps built from filter sets.
//!
//! Keys are kept in a sorted map so equal filters always produce the same
//! parameters and the same query string.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Key/value pairs sent as the query string of list and totals requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text value after trimming; blank or missing values are skipped.
    pub fn push_text(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.0.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn push_value<T: Display>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            let rendered = value.to_string();
            if !rendered.is_empty() {
                self.0.insert(key.to_string(), rendered);
            }
        }
        self
    }

    pub fn push_timestamp(&mut self, key: &str, value: Option<&DateTime<Utc>>) -> &mut Self {
        if let Some(value) = value {
            self.0.insert(key.to_string(), format_timestamp(value));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of these parameters without the given keys.
    pub fn without(&self, keys: &[&str]) -> Self {
        let mut copy = self.clone();
        for key in keys {
            copy.0.remove(*key);
        }
        copy
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Percent-encoded `key=value&...` string in key order.
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Wire format for timestamps: UTC with millisecond precision.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_blank_text_is_omitted() {
        let mut params = QueryParams::new();
        params
            .push_text("agentId", Some(""))
            .push_text("userId", Some("   "))
            .push_text("game", None)
            .push_text("platform", Some(" SPADE "));

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("platform"), Some("SPADE"));
        assert!(!params.contains_key("agentId"));
    }

    #[test]
    fn test_numbers_are_stringified() {
        let mut params = QueryParams::new();
        params.push_value("page", Some(3u32)).push_value::<u32>("limit", None);
        assert_eq!(params.get("page"), Some("3"));
        assert!(!params.contains_key("limit"));
    }

    #[test]
    fn test_timestamp_format() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-10T00:00:00.000Z");
    }

    #[test]
    fn test_query_string_is_sorted_and_encoded() {
        let mut params = QueryParams::new();
        params
            .push_text("search", Some("lucky wheel&co"))
            .push_value("page", Some(1))
            .push_text("agentId", Some("agent007"));

        assert_eq!(
            params.to_query_string(),
            "agentId=agent007&page=1&search=lucky%20wheel%26co"
        );
    }

    #[test]
    fn test_without_removes_keys() {
        let mut params = QueryParams::new();
        params
            .push_value("page", Some(2))
            .push_value("limit", Some(20))
            .push_text("game", Some("ChickenRoad"));

        let stripped = params.without(&["page", "limit"]);
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped.get("game"), Some("ChickenRoad"));
        assert_eq!(params.len(), 3);
    }
}
