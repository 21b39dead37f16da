use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlitzError {
    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("Invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for BlitzError {
    fn from(err: toml::de::Error) -> Self {
        BlitzError::Fixture(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BlitzError>;
