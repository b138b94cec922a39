use thiserror::Error;

use agon_core::MediaApiError;

pub type Result<T> = std::result::Result<T, AgonError>;

#[derive(Debug, Error)]
pub enum AgonError {
    #[error("media api error: {0}")]
    Api(#[from] MediaApiError),

    #[error("login failed: the site returned to the login form")]
    LoginRejected,

    #[error("site error page: {message}")]
    SitePage { message: String },

    #[error("regex not matched for embedded {field} in episode page")]
    RegexNotMatch { field: &'static str },

    #[error("failed to read response body while {context}: {source}")]
    ResponseBody {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0}")]
    Message(String),
}
