use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Invalid log filter '{directives}': {reason}")]
    Filter { directives: String, reason: String },

    #[error("Tracing subscriber already installed: {0}")]
    Init(String),

    #[error("Cannot listen on '{addr}': {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Metrics server error: {0}")]
    Serve(#[from] std::io::Error),
}
