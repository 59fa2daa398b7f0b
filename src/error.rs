use std::path::PathBuf;

/// Failures talking to the model backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached at all (refused, DNS, timeout).
    #[error("Could not connect to Ollama at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend accepted the request but did not finish it within the client timeout.
    #[error("Ollama did not finish the {context} request within the timeout: {source}")]
    TimedOut {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered, but not in a way we understand.
    #[error("Unexpected response from Ollama ({context}): {message}")]
    Unexpected { context: String, message: String },
}

impl BackendError {
    /// Listing models is the liveness check, so a timeout there means the
    /// service is not answering at all.
    pub(crate) fn from_listing(url: &str, context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Unreachable {
                url: url.to_string(),
                source: err,
            }
        } else {
            Self::from_transport(url, context, err)
        }
    }

    pub(crate) fn from_transport(url: &str, context: &str, err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Unreachable {
                url: url.to_string(),
                source: err,
            }
        } else if err.is_timeout() {
            Self::TimedOut {
                context: context.to_string(),
                source: err,
            }
        } else {
            Self::Unexpected {
                context: context.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConsultError {
    #[error("You must specify a package file with --package.")]
    MissingPackage,

    #[error("\"{}\" does not exist.", .0.display())]
    PackageNotFound(PathBuf),

    #[error("Expected a `.swift` file. Got: {}", .0.display())]
    WrongExtension(PathBuf),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Model \"{model}\" not found in Ollama.")]
    ModelNotFound { model: String },

    #[error("Model returned an empty response after {attempts} attempt(s).")]
    EmptyResponse { attempts: u32 },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ConsultError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::MissingPackage | Self::PackageNotFound(_) | Self::WrongExtension(_) => 1,
            Self::Backend(_) | Self::ModelNotFound { .. } | Self::EmptyResponse { .. } => 1,
            Self::Io { .. } | Self::Config(_) => 1,
        }
    }

    /// Remediation hint printed under the error, if there is one.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ModelNotFound { model } => {
                Some(format!("Run `ollama run {model}` to download and start it."))
            }
            Self::Backend(BackendError::Unreachable { .. }) => {
                Some("Is `ollama serve` running? Set OLLAMA_HOST or --host if it listens elsewhere.".to_string())
            }
            Self::Backend(BackendError::TimedOut { .. }) => {
                Some("Raise llm.timeout_seconds in the config file for slow models.".to_string())
            }
            _ => None,
        }
    }
}

impl From<anyhow::Error> for ConsultError {
    fn from(err: anyhow::Error) -> Self {
        Self::Config(format!("{err:#}"))
    }
}
