use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid route entry '{entry}': {source}")]
    InvalidRoute {
        entry: String,
        #[source]
        source: ipnetwork::IpNetworkError,
    },

    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}
