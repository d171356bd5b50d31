mod client;
mod download;
pub mod endpoints;
mod folder;
mod list;
pub mod lookup;
mod models;
pub mod upload;

pub use client::{GraphClient, RequestOptions};
pub use download::{download_file, DownloadedFile};
pub use folder::create_folder;
pub use list::list_folder_children;
pub use models::{
    BinaryData, CredentialTestResult, CredentialTestStatus, FileFacet, GraphItem, JsonObject,
    ListSearchItem, ListSearchResult, LocatorMode, NamedBinary, OutputRecord, ResourceLocator,
    DEFAULT_MIME_TYPE,
};
pub use upload::{upload_file, UploadRequest, UploadSession, UploadStrategy};
