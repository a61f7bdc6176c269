use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OverlayError>;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("error querying overlay API at {endpoint}: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("overlay API at {endpoint} responded with status '{status}'")]
    ProbeStatus {
        endpoint: String,
        status: StatusCode,
    },

    #[error("error sending route advertisement: {0}")]
    Request(#[from] reqwest::Error),

    #[error("advertisement push to {endpoint} returned status '{status}'")]
    PushStatus {
        endpoint: String,
        status: StatusCode,
    },
}
