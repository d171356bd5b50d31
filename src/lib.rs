//! SharePoint document library operations over Microsoft Graph: list a
//! folder, download and upload files, create folders, plus the credential
//! test and picker lookups a workflow host needs.

pub mod api;
pub mod error;
pub mod host;
pub mod node;
pub mod settings;
pub mod transport;

pub use api::auth::{fetch_token, AccessToken, Credentials};
pub use api::drive::{
    BinaryData, CredentialTestResult, CredentialTestStatus, GraphClient, ListSearchItem,
    ListSearchResult, LocatorMode, OutputRecord, RequestOptions, ResourceLocator,
};
pub use error::{ApiError, Error, Result};
pub use host::{InputItem, NodeContext, Parameter, ParameterValue, StaticContext};
pub use node::{Operation, SharePointFiles};
pub use settings::GraphSettings;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, RequestBody};
