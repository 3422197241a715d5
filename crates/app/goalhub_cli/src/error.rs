use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("{}", .0)]
    Denied(String),

    #[error("Json: {}", .0)]
    Json(#[from] serde_json::Error),

    #[error("Client: {}", .0)]
    Client(#[from] goalhub_client::ClientError),

    #[error("Auth: {}", .0)]
    Auth(#[from] goalhub_core::auth::AuthError),

    #[error("Logging: {}", .0)]
    Logging(String),
}
