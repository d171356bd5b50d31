//! Pure mapping from locators to Graph path segments (relative to the
//! Graph base URL). Nothing here performs I/O.

use super::models::{LocatorMode, ResourceLocator};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left untouched by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const ROOT_FOLDER: &str = "/";

pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

/// Trims and guarantees exactly one leading `/`; empty input is the root.
pub fn normalize_folder_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == ROOT_FOLDER {
        ROOT_FOLDER.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// The folder itself: `/drives/{d}/root` or `/drives/{d}/root:{path}:`.
pub fn folder_endpoint(drive_id: &str, folder_path: &str) -> String {
    let folder_path = normalize_folder_path(folder_path);
    if folder_path == ROOT_FOLDER {
        format!("/drives/{drive_id}/root")
    } else {
        format!("/drives/{drive_id}/root:{folder_path}:")
    }
}

pub fn children_endpoint(folder_endpoint: &str) -> String {
    format!("{folder_endpoint}/children")
}

/// A drive item addressed either by identifier or by path. The two forms
/// take different suffix grammars and must not be mixed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemAddress {
    ById { drive_id: String, item_id: String },
    ByPath { drive_id: String, path: String },
}

impl ItemAddress {
    pub fn endpoint(&self) -> String {
        match self {
            ItemAddress::ById { drive_id, item_id } => format!("/drives/{drive_id}/items/{item_id}"),
            ItemAddress::ByPath { drive_id, path } => format!("/drives/{drive_id}/root:{path}"),
        }
    }

    /// `.../items/{id}/content` or `.../root:{path}:/content`.
    pub fn content_endpoint(&self) -> String {
        self.action_endpoint("content")
    }

    pub fn upload_session_endpoint(&self) -> String {
        self.action_endpoint("createUploadSession")
    }

    fn action_endpoint(&self, action: &str) -> String {
        match self {
            ItemAddress::ById { .. } => format!("{}/{action}", self.endpoint()),
            ItemAddress::ByPath { .. } => format!("{}:/{action}", self.endpoint()),
        }
    }
}

/// Resolves the file locator. `id` addresses the item directly; any other
/// mode is a path, absolute when it starts with `/`, otherwise relative to
/// the selected folder.
pub fn file_endpoint(drive_id: &str, file: &ResourceLocator, folder_path: &str) -> ItemAddress {
    let value = file.value.trim();
    if file.mode == LocatorMode::Id {
        return ItemAddress::ById {
            drive_id: drive_id.to_string(),
            item_id: value.to_string(),
        };
    }
    let path = if value.starts_with('/') {
        value.to_string()
    } else {
        join_folder(&normalize_folder_path(folder_path), value)
    };
    ItemAddress::ByPath {
        drive_id: drive_id.to_string(),
        path,
    }
}

pub fn content_endpoint(file: &ItemAddress) -> String {
    file.content_endpoint()
}

/// Target of an upload: the encoded file name inside the given folder.
pub fn upload_target(drive_id: &str, folder_path: &str, file_name: &str) -> ItemAddress {
    ItemAddress::ByPath {
        drive_id: drive_id.to_string(),
        path: join_folder(&normalize_folder_path(folder_path), &encode_component(file_name)),
    }
}

fn join_folder(folder_path: &str, name: &str) -> String {
    if folder_path == ROOT_FOLDER {
        format!("/{name}")
    } else {
        format!("{folder_path}/{name}")
    }
}

pub fn sites_search_endpoint(filter: Option<&str>) -> String {
    let query = filter.filter(|f| !f.is_empty()).unwrap_or("*");
    format!("/sites?search={}", encode_component(query))
}

pub fn site_drives_endpoint(site_id: &str) -> String {
    format!("/sites/{site_id}/drives")
}

pub const SITE_ROOT_ENDPOINT: &str = "/sites/root";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_root_and_missing_slash() {
        assert_eq!(normalize_folder_path(""), "/");
        assert_eq!(normalize_folder_path("   "), "/");
        assert_eq!(normalize_folder_path(" / "), "/");
        assert_eq!(normalize_folder_path("Docs/Reports"), "/Docs/Reports");
        assert_eq!(normalize_folder_path(" /Docs "), "/Docs");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["", "/", "a", "/a", " a/b ", "a/", "//a", " \t/x y/ ", "Shared Documents"] {
            let once = normalize_folder_path(raw);
            assert_eq!(normalize_folder_path(&once), once, "input {raw:?}");
            assert!(once.starts_with('/'));
        }
    }

    #[test]
    fn folder_endpoint_forms() {
        assert_eq!(folder_endpoint("D1", "/"), "/drives/D1/root");
        assert_eq!(folder_endpoint("D1", ""), "/drives/D1/root");
        assert_eq!(folder_endpoint("D1", "Docs"), "/drives/D1/root:/Docs:");
        assert_eq!(
            children_endpoint(&folder_endpoint("D1", "/Docs/2024")),
            "/drives/D1/root:/Docs/2024:/children"
        );
        assert_eq!(
            children_endpoint(&folder_endpoint("D1", "/")),
            "/drives/D1/root/children"
        );
    }

    #[test]
    fn file_endpoint_by_id() {
        let address = file_endpoint("D1", &ResourceLocator::id("ITEM123"), "/Docs");
        assert_eq!(address.endpoint(), "/drives/D1/items/ITEM123");
        assert_eq!(content_endpoint(&address), "/drives/D1/items/ITEM123/content");
    }

    #[test]
    fn file_endpoint_by_absolute_path() {
        let address = file_endpoint("D1", &ResourceLocator::path("/Docs/a.txt"), "/Other");
        assert_eq!(address.endpoint(), "/drives/D1/root:/Docs/a.txt");
        assert_eq!(content_endpoint(&address), "/drives/D1/root:/Docs/a.txt:/content");
    }

    #[test]
    fn file_endpoint_relative_to_folder() {
        let address = file_endpoint("D1", &ResourceLocator::path("a.txt"), "/Docs");
        assert_eq!(address.endpoint(), "/drives/D1/root:/Docs/a.txt");

        let at_root = file_endpoint("D1", &ResourceLocator::path(" a.txt "), "/");
        assert_eq!(at_root.endpoint(), "/drives/D1/root:/a.txt");
    }

    #[test]
    fn path_containing_items_segment_keeps_path_suffix() {
        let address = file_endpoint("D1", &ResourceLocator::path("/items/x.bin"), "/");
        assert_eq!(content_endpoint(&address), "/drives/D1/root:/items/x.bin:/content");
    }

    #[test]
    fn upload_target_encodes_file_name() {
        let target = upload_target("D1", "/Docs", "Q1 report (final).pdf");
        assert_eq!(
            target.content_endpoint(),
            "/drives/D1/root:/Docs/Q1%20report%20(final).pdf:/content"
        );
        assert_eq!(
            upload_target("D1", "/", "a&b.txt").upload_session_endpoint(),
            "/drives/D1/root:/a%26b.txt:/createUploadSession"
        );
    }

    #[test]
    fn site_endpoints() {
        assert_eq!(sites_search_endpoint(None), "/sites?search=*");
        assert_eq!(sites_search_endpoint(Some("")), "/sites?search=*");
        assert_eq!(
            sites_search_endpoint(Some("team site")),
            "/sites?search=team%20site"
        );
        assert_eq!(site_drives_endpoint("S1"), "/sites/S1/drives");
    }
}
