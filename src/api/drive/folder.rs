use super::{
    client::{GraphClient, RequestOptions},
    endpoints::{children_endpoint, folder_endpoint},
};
use crate::error::Result;
use crate::transport::RequestBody;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

/// Creates `name` inside the folder. An existing item with that name is an
/// error; nothing is renamed or overwritten.
pub async fn create_folder(
    client: &GraphClient,
    drive_id: &str,
    parent_path: &str,
    name: &str,
) -> Result<Value> {
    let endpoint = children_endpoint(&folder_endpoint(drive_id, parent_path));
    let created = client
        .request(
            Method::POST,
            &endpoint,
            RequestBody::Json(json!({
                "name": name,
                "folder": {},
                "@microsoft.graph.conflictBehavior": "fail",
            })),
            &RequestOptions::default(),
        )
        .await?;
    info!(name, parent = parent_path, "created folder");
    Ok(created)
}
