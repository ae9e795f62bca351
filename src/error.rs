use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoastError>;

#[derive(Error, Debug)]
pub enum RoastError {
    #[error("{0}")]
    InvalidInput(String),
    /// The profile fetch failed; `message` is GitHub's own text when it sent one.
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("Network error talking to {service}: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{0} not configured")]
    ConfigurationMissing(&'static str),
    #[error("{0}")]
    GenerationUpstream(String),
    /// `excerpt` is the bounded head of the model output, kept for logs.
    #[error("Failed to parse AI response: {reason}")]
    GenerationParse { reason: String, excerpt: String },
}

impl RoastError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn github_transport(source: reqwest::Error) -> Self {
        Self::Transport {
            service: "GitHub",
            source,
        }
    }

    pub fn groq_transport(source: reqwest::Error) -> Self {
        Self::Transport {
            service: "Groq",
            source,
        }
    }

    /// Whether the caller is at fault (as opposed to us or an upstream).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
