use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Agent(#[from] agent::Error),

    #[error("Malformed plan: {0}")]
    MalformedPlan(String),

    #[error("Section \"{section}\" failed after {attempts} attempt(s): {source}")]
    SectionFailed {
        section: String,
        attempts: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    TaskJoinError(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Agent(err) => err.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
