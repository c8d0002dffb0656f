use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("trace {0} not found")]
    TraceNotFound(Uuid),

    #[error(transparent)]
    Trace(#[from] nf_domain::TraceError),
}

impl From<ObservabilityError> for nf_domain::Error {
    fn from(e: ObservabilityError) -> Self {
        nf_domain::Error::Other(e.to_string())
    }
}
