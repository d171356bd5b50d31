pub mod graph;
pub mod request_timeout;

pub use graph::{GraphSettings, DEFAULT_AUTHORITY_HOST, DEFAULT_GRAPH_BASE, GRAPH_SCOPE};
pub use request_timeout::{
    default_request_timeout, parse_request_timeout, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
};
