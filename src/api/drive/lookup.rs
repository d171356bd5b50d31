//! Searchable selection lists for the site, drive and folder pickers.

use super::{
    client::{GraphClient, RequestOptions},
    endpoints::{
        children_endpoint, folder_endpoint, normalize_folder_path, site_drives_endpoint,
        sites_search_endpoint, ROOT_FOLDER,
    },
    models::{GraphItem, ListSearchItem, ListSearchResult},
};
use crate::error::{ApiError, Result};
use crate::transport::RequestBody;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

const ROOT_ENTRY_NAME: &str = "/ (Root)";

#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteDto {
    id: String,
    display_name: Option<String>,
    web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveDto {
    id: String,
    name: Option<String>,
    web_url: Option<String>,
}

async fn get_collection<T: serde::de::DeserializeOwned>(
    client: &GraphClient,
    endpoint: &str,
) -> Result<Vec<T>> {
    let value = client
        .request(
            Method::GET,
            endpoint,
            RequestBody::Empty,
            &RequestOptions::default(),
        )
        .await?;
    serde_json::from_value::<Collection<T>>(value)
        .map(|c| c.value)
        .map_err(|e| ApiError::transport(format!("unexpected collection shape: {e}")).into())
}

/// Sites matching `filter`, or every visible site when it is empty.
pub async fn search_sites(client: &GraphClient, filter: Option<&str>) -> Result<ListSearchResult> {
    let sites: Vec<SiteDto> = get_collection(client, &sites_search_endpoint(filter)).await?;
    Ok(ListSearchResult {
        results: sites
            .into_iter()
            .map(|site| ListSearchItem {
                name: site.display_name.unwrap_or_else(|| site.id.clone()),
                value: site.id,
                url: site.web_url,
            })
            .collect(),
    })
}

/// Document libraries of a site, filtered by a case-insensitive substring
/// of their name. No site selected yields no drives.
pub async fn search_drives(
    client: &GraphClient,
    site_id: Option<&str>,
    filter: Option<&str>,
) -> Result<ListSearchResult> {
    let Some(site_id) = site_id else {
        return Ok(ListSearchResult::default());
    };
    let drives: Vec<DriveDto> = get_collection(client, &site_drives_endpoint(site_id)).await?;
    let needle = filter.unwrap_or_default().to_lowercase();
    Ok(ListSearchResult {
        results: drives
            .into_iter()
            .map(|drive| ListSearchItem {
                name: drive.name.unwrap_or_default(),
                value: drive.id,
                url: drive.web_url,
            })
            .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
            .collect(),
    })
}

/// Folders one level below the parent path given as `filter`, preceded by
/// a root entry. The filter is a path, not a name match; entries are
/// prefixed with it exactly as typed.
pub async fn search_folders(
    client: &GraphClient,
    drive_id: Option<&str>,
    filter: Option<&str>,
) -> Result<ListSearchResult> {
    let Some(drive_id) = drive_id else {
        return Ok(ListSearchResult::default());
    };
    let typed = filter.unwrap_or_default().trim();
    let parent = normalize_folder_path(typed);
    let prefix = if parent == ROOT_FOLDER { "" } else { typed };

    let mut results = vec![ListSearchItem {
        name: ROOT_ENTRY_NAME.to_string(),
        value: ROOT_FOLDER.to_string(),
        url: None,
    }];

    let children: Vec<Value> =
        get_collection(client, &children_endpoint(&folder_endpoint(drive_id, &parent))).await?;
    results.extend(
        children
            .iter()
            .map(GraphItem::from_value)
            .filter(GraphItem::is_folder)
            .map(|item| {
                let path = format!("{prefix}/{}", item.name.unwrap_or_default());
                ListSearchItem {
                    name: path.clone(),
                    value: path,
                    url: None,
                }
            }),
    );
    Ok(ListSearchResult { results })
}
