use crate::config::ConfigError;

/// Errors that stop the monitor.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("system clock is before the UNIX epoch")]
    Clock(#[from] std::time::SystemTimeError),
    #[error("failed to serialize stats: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write stats: {0}")]
    Io(#[from] std::io::Error),
}

pub trait ResultOkLogExt<T, E> {
    /// Converts into an `Option`, logging the error prefixed with `context`.
    fn ok_log(self, context: &str) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self, context: &str) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{context}: {err}");
                None
            }
        }
    }
}
