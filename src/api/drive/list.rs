use super::{
    client::{GraphClient, RequestOptions},
    endpoints::{children_endpoint, folder_endpoint},
};
use crate::error::Result;
use crate::transport::RequestBody;
use reqwest::Method;
use serde_json::Value;

/// Every child of the folder, across all pages, as raw driveItems.
pub async fn list_folder_children(
    client: &GraphClient,
    drive_id: &str,
    folder_path: &str,
) -> Result<Vec<Value>> {
    let endpoint = children_endpoint(&folder_endpoint(drive_id, folder_path));
    client
        .request_all_pages(
            Method::GET,
            &endpoint,
            RequestBody::Empty,
            &RequestOptions::default(),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::Credentials;
    use crate::settings::GraphSettings;
    use crate::transport::mock::ScriptedTransport;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn lists_children_of_nested_folder() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            200,
            json!({"value": [{"name": "a.txt", "file": {}}, {"name": "Sub", "folder": {}}]}),
        );
        let client = GraphClient::new(
            transport.clone(),
            GraphSettings::default(),
            Credentials::new("t", "c", "s"),
        );

        let children = list_folder_children(&client, "D1", "Docs/2024").await.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(
            transport.graph_requests()[0].url,
            "https://graph.microsoft.com/v1.0/drives/D1/root:/Docs/2024:/children"
        );
    }
}
