use thiserror::Error;

pub type Result<T> = std::result::Result<T, MediaApiError>;

#[derive(Debug, Error)]
pub enum MediaApiError {
    #[error("failed to parse site base URL")]
    BaseUrl,

    #[error("request client build failed while {context}: {source}")]
    BuildClient {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("request failed while {context}: {source}")]
    Request {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body while {context}: {source}")]
    ResponseBody {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context} returned {status} at {final_url}\nresponse text:\n{body}")]
    HttpStatus {
        context: String,
        status: reqwest::StatusCode,
        final_url: String,
        body: String,
    },

    #[error("{field} must be a positive number, given: {given}")]
    InvalidIdentifier { field: &'static str, given: String },

    #[error("failed to decode JSON while {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("api error while {context}: {message}")]
    Api { context: String, message: String },

    #[error("missing {field} while {context}")]
    MissingField {
        field: &'static str,
        context: String,
    },

    #[error("csrf token cookie was not issued by the media-state endpoint")]
    CsrfCookieMissing,
}
