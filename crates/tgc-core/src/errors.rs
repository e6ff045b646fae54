/// Core error type for the placement engine.
///
/// Backend adapters map their specific failures into these variants so the
/// engine can branch on kind (recover, skip, surface) without matching on
/// error strings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Bad, expired or revoked session credential.
    #[error("auth error: {0}")]
    Auth(String),

    /// The target chat does not exist or is not accessible.
    #[error("chat unresolvable: {0}")]
    ChatUnresolvable(String),

    /// The message has no discussion thread attached.
    #[error("no discussion thread for message {message_id}")]
    ThreadUnavailable { message_id: i32 },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Generic network/protocol failure from the chat backend.
    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
