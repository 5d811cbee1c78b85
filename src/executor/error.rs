use crate::remote::RemoteError;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("failed to construct remote client: {source}")]
    ClientSetup {
        #[source]
        source: RemoteError,
    },
    #[error("remote client is not configured for this command")]
    MissingClient,
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("`{slot}` must be resolved before this step")]
    MissingSlot { slot: String },
    #[error("no account selected; pass an account id or switch accounts first")]
    MissingAccount,
    #[error("operation aborted")]
    Aborted,
    #[error("step worker panicked: {0}")]
    WorkerPanicked(String),
    #[error("{0}")]
    Failed(String),
}
