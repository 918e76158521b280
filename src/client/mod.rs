pub mod error;
pub mod http;
pub mod services;
pub mod tokens;

pub use error::{ClientError, ClientResult};
pub use http::ApiClient;
pub use tokens::{MemoryTokenStore, TokenStore};
