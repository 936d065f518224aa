pub mod compress;
pub mod cors;
pub mod error;
pub mod ext;
pub mod minify;
pub mod payload;
pub mod redirect;

pub use compress::compress_payload;
pub use cors::{crossdomain, json_response, DEFAULT_ALLOW_METHODS};
pub use error::TransformError;
pub use ext::{AllowedMethods, ClientAddr, Finalized};
pub use minify::minify_payload;
pub use payload::{Payload, StoredResponse};
pub use redirect::{host_redirect, request_url};
