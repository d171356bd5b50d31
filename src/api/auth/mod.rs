mod token;

pub use token::{fetch_token, AccessToken, Credentials};
pub(crate) use token::{token_request, TokenResponse};
