pub mod error;
pub mod types;

pub use error::{ErrorKind, SocialError, SocialResult};
pub use types::{IdentityIdMode, ProviderKind};
