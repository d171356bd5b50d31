use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// How a resource locator addresses its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorMode {
    List,
    Id,
    Path,
}

/// A site, drive, folder or file reference as the user entered it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLocator {
    pub mode: LocatorMode,
    #[serde(default, deserialize_with = "value_as_string")]
    pub value: String,
}

impl ResourceLocator {
    pub fn new(mode: LocatorMode, value: impl Into<String>) -> Self {
        Self {
            mode,
            value: value.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(LocatorMode::Id, value)
    }

    pub fn path(value: impl Into<String>) -> Self {
        Self::new(LocatorMode::Path, value)
    }

    pub fn list(value: impl Into<String>) -> Self {
        Self::new(LocatorMode::List, value)
    }

    /// The trimmed value, or `None` when nothing was selected.
    pub fn selected(&self) -> Option<&str> {
        let trimmed = self.value.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Hosts store locator values loosely; numbers and nulls show up too.
fn value_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Typed view over the driveItem fields this crate reads.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub file: Option<FileFacet>,
    pub folder: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FileFacet {
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
}

impl GraphItem {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.file
            .as_ref()
            .and_then(|f| f.mime_type.as_deref())
            .filter(|m| !m.is_empty())
    }
}

/// A binary attachment travelling with an item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BinaryData {
    pub data: Vec<u8>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

impl BinaryData {
    pub fn new(data: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            file_name: Some(file_name.into()),
            mime_type: Some(mime_type.into()),
        }
    }

    pub fn mime_type_or_default(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedBinary {
    pub property: String,
    pub data: BinaryData,
}

/// One emitted record, tied back to the input item it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputRecord {
    pub json: Value,
    pub binary: Option<NamedBinary>,
    pub paired_item: usize,
}

impl OutputRecord {
    pub fn json(json: Value, paired_item: usize) -> Self {
        Self {
            json,
            binary: None,
            paired_item,
        }
    }

    pub fn error(message: impl Into<String>, paired_item: usize) -> Self {
        Self::json(serde_json::json!({ "error": message.into() }), paired_item)
    }

    pub fn is_error(&self) -> bool {
        self.json.get("error").is_some() && self.binary.is_none()
    }
}

/// One entry of a searchable selection list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListSearchItem {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListSearchResult {
    pub results: Vec<ListSearchItem>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CredentialTestStatus {
    #[serde(rename = "OK")]
    Ok,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CredentialTestResult {
    pub status: CredentialTestStatus,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn locator_deserializes_loose_values() {
        let locator: ResourceLocator =
            serde_json::from_value(json!({"mode": "id", "value": 42})).unwrap();
        assert_eq!(locator, ResourceLocator::id("42"));

        let locator: ResourceLocator =
            serde_json::from_value(json!({"mode": "list", "value": null})).unwrap();
        assert_eq!(locator.selected(), None);
    }

    #[test]
    fn blank_locator_is_unset() {
        assert_eq!(ResourceLocator::list("   ").selected(), None);
        assert_eq!(ResourceLocator::path(" /Docs ").selected(), Some("/Docs"));
    }

    #[test]
    fn graph_item_view() {
        let item = GraphItem::from_value(&json!({
            "id": "01ABC",
            "name": "report.pdf",
            "file": {"mimeType": "application/pdf"}
        }));
        assert_eq!(item.mime_type(), Some("application/pdf"));
        assert!(!item.is_folder());

        let folder = GraphItem::from_value(&json!({"name": "Docs", "folder": {"childCount": 3}}));
        assert!(folder.is_folder());
        assert_eq!(folder.mime_type(), None);
    }

    #[test]
    fn binary_mime_falls_back() {
        let blob = BinaryData {
            data: vec![1, 2, 3],
            file_name: None,
            mime_type: Some(String::new()),
        };
        assert_eq!(blob.mime_type_or_default(), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn credential_status_wire_names() {
        let ok = CredentialTestResult {
            status: CredentialTestStatus::Ok,
            message: "Connection successful".into(),
        };
        assert_eq!(serde_json::to_value(&ok).unwrap()["status"], "OK");
    }
}
