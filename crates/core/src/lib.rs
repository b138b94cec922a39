pub mod api;
pub mod endpoints;
pub mod errors;
pub mod session;

pub use api::{
    DEFAULT_MEDIA_FORMAT, DEFAULT_MEDIA_SIZE, MediaApi, ensure_positive_id, is_positive_id,
    normalize_media_format,
};
pub use endpoints::{CSRF_COOKIE_NAME, DEFAULT_BASE_URL, ProbeIdentifiers, SiteEndpoints};
pub use errors::{MediaApiError, Result};
pub use session::{DEFAULT_USER_AGENT, RequestDescriptor, Session};
