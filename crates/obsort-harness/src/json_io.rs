//! JSON record shapes accepted and produced by the CLI.

use serde::{Deserialize, Serialize};

use obsort_core::Item;

/// One caller record: `{"sort_key": 5, "payload": "text"}`. The payload is
/// optional on input and defaults to empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortItem {
    pub sort_key: i32,
    #[serde(default)]
    pub payload: String,
}

impl SortItem {
    pub fn into_item(self) -> Item {
        Item::new(self.sort_key, self.payload.into_bytes())
    }

    pub fn from_item(item: Item) -> Self {
        Self {
            sort_key: item.sort_key,
            payload: String::from_utf8_lossy(&item.payload).into_owned(),
        }
    }
}

/// Parse a JSON array of records. Bare integers are accepted as a
/// shorthand for records with empty payloads.
pub fn parse_items(text: &str) -> Result<Vec<Item>, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Bare(i32),
        Full(SortItem),
    }

    let entries: Vec<Entry> = serde_json::from_str(text)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Entry::Bare(sort_key) => Item::new(sort_key, Vec::new()),
            Entry::Full(item) => item.into_item(),
        })
        .collect())
}

/// Render sorted records as a pretty-printed JSON array.
pub fn render_items(items: Vec<Item>) -> Result<String, serde_json::Error> {
    let out: Vec<SortItem> = items.into_iter().map(SortItem::from_item).collect();
    serde_json::to_string_pretty(&out)
}
