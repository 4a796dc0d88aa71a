use std::{collections::HashMap, sync::OnceLock};

use serde::{Deserialize, Serialize};

/// An outbound mail as handed to the transport. The queue never looks inside
/// it; only [`crate::codec`] knows how it is stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub from_email: Option<String>,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub headers: Headers,
}

impl Email {
    /// Every address the transport will deliver to.
    pub fn recipients(&self) -> Vec<&str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(String::as_str)
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: Option<String>,
    pub content: Vec<u8>,
    pub mimetype: Option<String>,
}

/// Extra headers in the order they were given, with names kept as written.
///
/// Lookups ignore case (RFC 2045). The lower-cased index is built on first
/// lookup and dropped whenever the headers change.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers {
    entries: Vec<(String, String)>,
    #[serde(skip)]
    index: OnceLock<HashMap<String, usize>>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
        self.index = OnceLock::new();
    }

    /// Value of the first header whose name matches `name` case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        let index = self.index.get_or_init(|| {
            let mut index = HashMap::with_capacity(self.entries.len());
            for (position, (key, _)) in self.entries.iter().enumerate() {
                index.entry(key.to_lowercase()).or_insert(position);
            }
            index
        });

        index
            .get(&name.to_lowercase())
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn message_id(&self) -> Option<&str> {
        self.get("message-id")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Headers {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Headers {}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
