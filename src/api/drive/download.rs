use super::{
    client::{GraphClient, RequestOptions},
    endpoints::file_endpoint,
    models::{GraphItem, ResourceLocator, DEFAULT_MIME_TYPE},
};
use crate::error::Result;
use crate::transport::RequestBody;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

const FALLBACK_FILE_NAME: &str = "download";

/// Metadata plus content of a downloaded file.
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadedFile {
    pub metadata: Value,
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Fetches the item's metadata, then its content stream.
pub async fn download_file(
    client: &GraphClient,
    drive_id: &str,
    file: &ResourceLocator,
    folder_path: &str,
) -> Result<DownloadedFile> {
    let address = file_endpoint(drive_id, file, folder_path);
    debug!(endpoint = %address.endpoint(), "fetching download metadata");
    let metadata = client
        .request(
            Method::GET,
            &address.endpoint(),
            RequestBody::Empty,
            &RequestOptions::default(),
        )
        .await?;

    let content = client
        .request_binary(Method::GET, &address.content_endpoint())
        .await?;

    let item = GraphItem::from_value(&metadata);
    let file_name = item
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
    let mime_type = item.mime_type().unwrap_or(DEFAULT_MIME_TYPE).to_string();
    debug!(file_name = %file_name, bytes = content.len(), "downloaded file content");

    Ok(DownloadedFile {
        metadata,
        file_name,
        mime_type,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::Credentials;
    use crate::settings::GraphSettings;
    use crate::transport::mock::ScriptedTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn client(transport: &Arc<ScriptedTransport>) -> GraphClient {
        GraphClient::new(
            transport.clone(),
            GraphSettings::default(),
            Credentials::new("t", "c", "s"),
        )
    }

    #[tokio::test]
    async fn by_path_uses_colon_content_suffix() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            200,
            json!({"id": "F1", "name": "a.txt", "file": {"mimeType": "text/plain"}}),
        );
        transport.push_bytes(200, b"contents".to_vec());

        let file = download_file(&client(&transport), "D1", &ResourceLocator::path("a.txt"), "/Docs")
            .await
            .unwrap();
        assert_eq!(file.file_name, "a.txt");
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.content, b"contents");
        assert_eq!(file.metadata["id"], "F1");

        let urls: Vec<_> = transport.graph_requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://graph.microsoft.com/v1.0/drives/D1/root:/Docs/a.txt",
                "https://graph.microsoft.com/v1.0/drives/D1/root:/Docs/a.txt:/content",
            ]
        );
        assert_eq!(transport.tokens_issued(), 2);
    }

    #[tokio::test]
    async fn by_id_defaults_name_and_mime() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"id": "X"}));
        transport.push_bytes(200, vec![1, 2]);

        let file = download_file(&client(&transport), "D1", &ResourceLocator::id("X"), "/")
            .await
            .unwrap();
        assert_eq!(file.file_name, "download");
        assert_eq!(file.mime_type, DEFAULT_MIME_TYPE);
        assert_eq!(
            transport.graph_requests()[1].url,
            "https://graph.microsoft.com/v1.0/drives/D1/items/X/content"
        );
    }
}
