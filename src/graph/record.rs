//! Persisted record types of the link graph
//!
//! Field names follow the `data.json` schema (`dateRetrieved`,
//! `numberOfAccesses`, URL sets as `{"<url>": true}` objects).

use chrono::{DateTime, Utc};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// One crawled (or linked-from) page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(rename = "dateRetrieved")]
    pub last_retrieved_at: DateTime<Utc>,

    #[serde(rename = "numberOfAccesses")]
    pub access_count: u64,

    #[serde(default)]
    pub children: BTreeMap<String, EdgeRecord>,

    /// URLs whose pages linked to this page
    #[serde(default)]
    pub parents: UrlSet,

    /// Image URL -> local file path
    #[serde(default)]
    pub images: BTreeMap<String, PathBuf>,
}

impl PageRecord {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_retrieved_at: now,
            access_count: 1,
            children: BTreeMap::new(),
            parents: UrlSet::default(),
            images: BTreeMap::new(),
        }
    }

    /// Bumps the access count and refreshes the timestamp
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.access_count += 1;
        self.last_retrieved_at = now;
    }
}

/// A parent -> child link, keyed by child URL inside the parent's record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(rename = "dateRetrieved")]
    pub last_retrieved_at: DateTime<Utc>,

    #[serde(rename = "numberOfAccesses")]
    pub access_count: u64,

    /// Back-references to the linking page(s), lookup only
    #[serde(default)]
    pub parents: UrlSet,
}

impl EdgeRecord {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_retrieved_at: now,
            access_count: 1,
            parents: UrlSet::default(),
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.access_count += 1;
        self.last_retrieved_at = now;
    }
}

/// Ordered set of URLs, serialized as a JSON object mapping each URL to `true`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlSet(BTreeSet<String>);

impl UrlSet {
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.0.insert(url.into())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.0.contains(url)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Serialize for UrlSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for url in &self.0 {
            map.serialize_entry(url, &true)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for UrlSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UrlSetVisitor;

        impl<'de> Visitor<'de> for UrlSetVisitor {
            type Value = UrlSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping URLs to true")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<UrlSet, A::Error> {
                let mut set = BTreeSet::new();
                while let Some((url, present)) = access.next_entry::<String, bool>()? {
                    if present {
                        set.insert(url);
                    }
                }
                Ok(UrlSet(set))
            }
        }

        deserializer.deserialize_map(UrlSetVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_set_serializes_as_object_of_true() {
        let mut set = UrlSet::default();
        set.insert("https://b.example/");
        set.insert("https://a.example/");

        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(
            value,
            json!({"https://a.example/": true, "https://b.example/": true})
        );
    }

    #[test]
    fn test_url_set_skips_false_entries() {
        let set: UrlSet =
            serde_json::from_value(json!({"https://a.example/": true, "https://b.example/": false}))
                .unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("https://a.example/"));
    }

    #[test]
    fn test_page_record_field_names() {
        let now = Utc::now();
        let mut page = PageRecord::new(now);
        page.parents.insert("https://ref.example/");
        let value = serde_json::to_value(&page).unwrap();

        assert_eq!(value["numberOfAccesses"], json!(1));
        assert!(value["dateRetrieved"].is_string());
        assert_eq!(value["parents"], json!({"https://ref.example/": true}));
        assert_eq!(value["children"], json!({}));
        assert_eq!(value["images"], json!({}));
    }

    #[test]
    fn test_touch_increments() {
        let earlier = Utc::now() - chrono::Duration::seconds(10);
        let mut edge = EdgeRecord::new(earlier);
        let now = Utc::now();
        edge.touch(now);
        assert_eq!(edge.access_count, 2);
        assert_eq!(edge.last_retrieved_at, now);
    }
}
