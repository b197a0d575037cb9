#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("AI API returned an empty reply")]
    EmptyReply,

    #[error(transparent)]
    Provider(#[from] parley_providers::Error),

    #[error(transparent)]
    Channel(#[from] parley_channels::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
