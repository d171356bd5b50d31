use crate::api::auth::{token_request, Credentials, TokenResponse};
use crate::api::drive::{
    self, endpoints, lookup, CredentialTestResult, CredentialTestStatus, GraphClient,
    ListSearchResult, NamedBinary, OutputRecord, UploadRequest,
};
use crate::error::{Error, Result};
use crate::host::{locator_parameter, text_parameter, InputItem, NodeContext, Parameter};
use crate::settings::GraphSettings;
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use reqwest::Method;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

const FALLBACK_UPLOAD_NAME: &str = "upload";
const CREDENTIAL_TEST_OK: &str = "Connection successful";
const TOKEN_PREVIEW_CHARS: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Download,
    Upload,
    CreateFolder,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Download => "download",
            Operation::Upload => "upload",
            Operation::CreateFolder => "createFolder",
        }
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "list" => Ok(Operation::List),
            "download" => Ok(Operation::Download),
            "upload" => Ok(Operation::Upload),
            "createFolder" => Ok(Operation::CreateFolder),
            other => Err(Error::validation(format!("unknown operation {other:?}"))),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The SharePoint Files node: file operations over Graph plus the
/// credential test and picker lookups the host calls.
#[derive(Clone)]
pub struct SharePointFiles {
    transport: Arc<dyn HttpTransport>,
    settings: GraphSettings,
}

impl SharePointFiles {
    pub fn new(transport: Arc<dyn HttpTransport>, settings: GraphSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Uses the bundled reqwest transport.
    pub fn with_settings(settings: GraphSettings) -> Result<Self> {
        let transport = ReqwestTransport::new(&settings)?;
        Ok(Self::new(Arc::new(transport), settings))
    }

    async fn client(&self, ctx: &dyn NodeContext) -> Result<GraphClient> {
        let credentials = ctx.credentials().await?;
        Ok(GraphClient::new(
            self.transport.clone(),
            self.settings.clone(),
            credentials,
        ))
    }

    /// Runs the configured operation over every item, in order. With
    /// continue-on-fail an item error becomes an `{"error": ...}` record;
    /// otherwise it aborts the batch.
    pub async fn execute(
        &self,
        ctx: &dyn NodeContext,
        items: &[InputItem],
    ) -> Result<Vec<OutputRecord>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let operation: Operation = text_parameter(ctx, Parameter::Operation, 0).parse()?;
        debug!(%operation, items = items.len(), "executing batch");

        let mut records = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match self.execute_item(ctx, operation, item, index).await {
                Ok(produced) => records.extend(produced),
                Err(err) if ctx.continue_on_fail() => {
                    warn!(%operation, item = index, error = %err, "item failed; continuing");
                    records.push(OutputRecord::error(err.to_string(), index));
                }
                Err(err) => return Err(err),
            }
        }
        info!(%operation, records = records.len(), "batch finished");
        Ok(records)
    }

    async fn execute_item(
        &self,
        ctx: &dyn NodeContext,
        operation: Operation,
        item: &InputItem,
        index: usize,
    ) -> Result<Vec<OutputRecord>> {
        let drive_id = required(
            locator_parameter(ctx, Parameter::DriveId, index).selected(),
            "drive",
        )?
        .to_string();
        let folder_path = endpoints::normalize_folder_path(
            &locator_parameter(ctx, Parameter::FolderPath, index).value,
        );
        let client = self.client(ctx).await?;

        match operation {
            Operation::List => {
                let children = drive::list_folder_children(&client, &drive_id, &folder_path).await?;
                Ok(children
                    .into_iter()
                    .map(|child| OutputRecord::json(child, index))
                    .collect())
            }
            Operation::Download => {
                let file = locator_parameter(ctx, Parameter::File, index);
                required(file.selected(), "file")?;
                let downloaded = drive::download_file(&client, &drive_id, &file, &folder_path).await?;
                let property = text_parameter(ctx, Parameter::BinaryPropertyName, index);
                let binary = ctx.prepare_binary(
                    downloaded.content,
                    &downloaded.file_name,
                    &downloaded.mime_type,
                );
                Ok(vec![OutputRecord {
                    json: downloaded.metadata,
                    binary: Some(NamedBinary {
                        property,
                        data: binary,
                    }),
                    paired_item: index,
                }])
            }
            Operation::Upload => {
                let property = text_parameter(ctx, Parameter::InputBinaryPropertyName, index);
                let source = item.assert_binary(&property)?;
                let file_name = upload_file_name(
                    &text_parameter(ctx, Parameter::FileName, index),
                    source.file_name.as_deref(),
                );
                let response = drive::upload_file(
                    &client,
                    UploadRequest {
                        drive_id: &drive_id,
                        folder_path: &folder_path,
                        file_name: &file_name,
                        data: &source.data,
                        mime_type: source.mime_type_or_default(),
                    },
                )
                .await?;
                Ok(vec![OutputRecord::json(response, index)])
            }
            Operation::CreateFolder => {
                let name = text_parameter(ctx, Parameter::FolderName, index);
                let name = required(Some(name.trim()).filter(|n| !n.is_empty()), "folder name")?;
                let created = drive::create_folder(&client, &drive_id, &folder_path, name).await?;
                Ok(vec![OutputRecord::json(created, index)])
            }
        }
    }

    /// Exchanges the credentials for a token and reads the root site.
    pub async fn test_credentials(&self, credentials: &Credentials) -> CredentialTestResult {
        match self.check_credentials(credentials).await {
            Ok(()) => CredentialTestResult {
                status: CredentialTestStatus::Ok,
                message: CREDENTIAL_TEST_OK.to_string(),
            },
            Err(message) => CredentialTestResult {
                status: CredentialTestStatus::Error,
                message,
            },
        }
    }

    async fn check_credentials(&self, credentials: &Credentials) -> std::result::Result<(), String> {
        let response = self
            .transport
            .send(token_request(&self.settings, credentials))
            .await
            .map_err(|e| failure_message(e.status(), &e.to_string()))?;
        if !response.is_success() {
            let body = String::from_utf8_lossy(&response.body);
            return Err(failure_message(Some(response.status), body.trim()));
        }

        let token = response
            .json::<TokenResponse>()
            .ok()
            .and_then(|payload| payload.access_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                let preview: String = String::from_utf8_lossy(&response.body)
                    .chars()
                    .take(TOKEN_PREVIEW_CHARS)
                    .collect();
                format!("Token response missing access_token: {preview}")
            })?;

        let probe = HttpRequest::new(
            Method::GET,
            self.settings.graph_url(endpoints::SITE_ROOT_ENDPOINT),
        )
        .header("Authorization", format!("Bearer {token}"));
        let response = self
            .transport
            .send(probe)
            .await
            .map_err(|e| failure_message(e.status(), &e.to_string()))?;
        response
            .error_for_status()
            .map(|_| ())
            .map_err(|e| failure_message(e.status, &e.message))
    }

    pub async fn search_sites(
        &self,
        ctx: &dyn NodeContext,
        filter: Option<&str>,
    ) -> Result<ListSearchResult> {
        lookup::search_sites(&self.client(ctx).await?, filter).await
    }

    pub async fn search_drives(
        &self,
        ctx: &dyn NodeContext,
        filter: Option<&str>,
    ) -> Result<ListSearchResult> {
        let site = locator_parameter(ctx, Parameter::SiteId, 0);
        let Some(site_id) = site.selected() else {
            return Ok(ListSearchResult::default());
        };
        lookup::search_drives(&self.client(ctx).await?, Some(site_id), filter).await
    }

    pub async fn search_folders(
        &self,
        ctx: &dyn NodeContext,
        filter: Option<&str>,
    ) -> Result<ListSearchResult> {
        let drive = locator_parameter(ctx, Parameter::DriveId, 0);
        let Some(drive_id) = drive.selected() else {
            return Ok(ListSearchResult::default());
        };
        lookup::search_folders(&self.client(ctx).await?, Some(drive_id), filter).await
    }
}

fn required<'a>(value: Option<&'a str>, what: &str) -> Result<&'a str> {
    value.ok_or_else(|| Error::validation(format!("{what} is required")))
}

/// Explicit name, else the attachment's own name, else `upload`.
fn upload_file_name(explicit: &str, from_binary: Option<&str>) -> String {
    [Some(explicit), from_binary]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(FALLBACK_UPLOAD_NAME)
        .to_string()
}

fn failure_message(status: Option<u16>, message: &str) -> String {
    let status = status.map(|s| s.to_string()).unwrap_or_default();
    format!("{status} {message}").trim().to_string()
}
