use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("You are not logged in")]
    NotAuthenticated,
    #[error("You are already logged in")]
    AlreadyAuthenticated,
    #[error("User already exists")]
    DuplicateUsername,
    #[error("Wrong username or password")]
    InvalidCredentials,
    #[error("You are not allowed to do this")]
    NotAuthorized,
    #[error("Room not found")]
    RoomNotFound,
    #[error("Message not found")]
    MessageNotFound,
    /// Backend read/write failed or a persisted value could not be (de)serialized.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
