use nf_domain::Error as DomainError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("workflow graph has a cycle touching node '{0}'")]
    CyclicWorkflow(String),

    #[error("node '{0}' depends on undeclared node '{1}'")]
    UnknownDependency(String, String),

    #[error("workflow cancelled before node '{0}' started")]
    Cancelled(String),

    #[error("node '{0}' skipped because a dependency failed")]
    SkippedUpstreamFailure(String),

    #[error(transparent)]
    Node(#[from] DomainError),
}

impl From<EngineError> for DomainError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Node(inner) => inner,
            other => DomainError::Other(other.to_string()),
        }
    }
}
