pub mod callback;
pub mod client;
pub mod decrypt;
pub mod http;
pub mod query;
pub mod response;
pub mod session;
pub mod state;
pub mod types;

pub use callback::CallbackContext;
pub use client::{OAuth2Client, probe};
pub use decrypt::decrypt_payload;
pub use http::ApiClient;
pub use query::QueryParams;
pub use response::{ApiResponse, ErrorFields};
pub use session::Session;
pub use types::{AuthorizationUrl, Gender, TokenGrant, UserProfile};

pub use socialite_common::{ErrorKind, IdentityIdMode, ProviderKind, SocialError, SocialResult};
