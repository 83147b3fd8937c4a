pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Numerical degeneracy: {0}")]
    Degenerate(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::Degenerate(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_their_text() {
        let label = "S1";
        let owned = Error::invalid_input(format!("point set '{label}' is empty"));
        assert_eq!(owned.to_string(), "Invalid input: point set 'S1' is empty");
        match Error::invalid_input("need at least 2 point sets") {
            Error::InvalidInput(msg) => assert_eq!(msg, "need at least 2 point sets"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
