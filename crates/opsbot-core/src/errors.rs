/// Core error type for the bot.
///
/// Only genuinely unexpected failures travel through this enum (config,
/// messenger transport, I/O). Expected runtime failures such as an
/// unreachable remote host or a dead database are data, not errors: the
/// gateway and the store return result values with bounded error text
/// instead of `Err`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
