use {
    crate::{
        pow::{self, BlockSize, InsufficientBlocks},
        store::{RemoteStore, StoreError},
    },
    bytes::Bytes,
    derive_more::Display,
    ownproof_protocol::{
        Proof, Tag,
        endpoints::{CheckFile, Duplicate, VerifyOwnership, status},
    },
    tokio::{sync::mpsc, task::block_in_place},
    tracing::{debug, warn},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ProtocolState {
    Idle,
    Hashing,
    CheckingDuplicate,
    Uploading,
    Proving,
    Verifying,
    Succeeded,
    Failed,
}

impl ProtocolState {
    #[must_use]
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Outcome {
    Success,
    Failure,
}

/// Emitted on every state change of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: ProtocolState,
    pub to: ProtocolState,
    /// Human-readable status line.
    pub message: String,
    /// Set only on the final transition of a run.
    pub outcome: Option<Outcome>,
}

/// Why a run ended in [`ProtocolState::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    InsufficientBlocks(#[from] InsufficientBlocks),
    #[error("network failure: {0}")]
    NetworkFailure(#[from] StoreError),
    #[error("ownership verification rejected by the store (status: {status:?})")]
    VerificationRejected { status: String },
    #[error("unexpected answer to the duplicate check (status: {status:?})")]
    UnexpectedServerState { status: String },
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The content was new and has been uploaded.
    Uploaded { tag: Tag },
    /// The content was already stored and the store accepted the proof.
    Verified { tag: Tag, proof: Proof },
}

impl Completion {
    #[must_use]
    #[inline]
    pub fn tag(&self) -> Tag {
        match self {
            Self::Uploaded { tag } | Self::Verified { tag, .. } => *tag,
        }
    }
}

/// Drives one file through duplicate check, upload or proof, and verification.
///
/// The controller owns the protocol state and reports every state change to
/// its subscribers. It renders nothing itself.
pub struct ProtocolController<S> {
    store: S,
    block_size: BlockSize,
    state: ProtocolState,
    subscribers: Vec<mpsc::UnboundedSender<Transition>>,
}

impl<S: RemoteStore> ProtocolController<S> {
    #[inline]
    pub fn new(store: S, block_size: BlockSize) -> Self {
        Self {
            store,
            block_size,
            state: ProtocolState::Idle,
            subscribers: Vec::new(),
        }
    }

    #[must_use]
    #[inline]
    pub fn state(&self) -> ProtocolState {
        self.state
    }

    #[must_use]
    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a receiver of all transitions from now on.
    ///
    /// The channel is closed when the controller is dropped.
    #[inline]
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Transition> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Runs the protocol for a file that has been fully read.
    ///
    /// Hashing and proving block the current worker thread.
    ///
    /// # Panics
    ///
    /// Panics if called from a current-thread tokio runtime, since
    /// [`block_in_place`] is not available there.
    #[inline]
    pub async fn run(&mut self, file: Bytes) -> Result<Completion, RunError> {
        self.state = ProtocolState::Idle;
        let result = self.drive(file).await;
        match &result {
            Ok(Completion::Uploaded { tag }) => self.emit(
                ProtocolState::Succeeded,
                format!("Upload of {} complete", tag.0.short()),
                Some(Outcome::Success),
            ),
            Ok(Completion::Verified { tag, .. }) => self.emit(
                ProtocolState::Succeeded,
                format!("Ownership of {} verified", tag.0.short()),
                Some(Outcome::Success),
            ),
            Err(err) => self.emit(
                ProtocolState::Failed,
                err.to_string(),
                Some(Outcome::Failure),
            ),
        }
        result
    }

    async fn drive(&mut self, file: Bytes) -> Result<Completion, RunError> {
        self.transition(
            ProtocolState::Hashing,
            format!("Calculating file tag ({} bytes)", file.len()),
        );
        let tag = block_in_place(|| pow::tag(&file));

        self.transition(
            ProtocolState::CheckingDuplicate,
            format!("File tag {}..., checking store", tag.0.short()),
        );
        let reply = self.store.check_file(&CheckFile { tag }).await?;
        let status = reply.status.clone();
        match reply
            .decode()
            .ok_or(RunError::UnexpectedServerState { status })?
        {
            Duplicate::New => {
                self.transition(
                    ProtocolState::Uploading,
                    "Store says file is new, uploading full file",
                );
                self.store.upload(&tag, file).await?;
                Ok(Completion::Uploaded { tag })
            }
            Duplicate::Exists(seed) => {
                self.transition(
                    ProtocolState::Proving,
                    format!("Store says file exists, proving ownership for seed {seed}"),
                );
                let block_size = self.block_size;
                let proof = block_in_place(|| pow::prove(pow::split(&file, block_size), &seed))?;

                self.transition(
                    ProtocolState::Verifying,
                    format!("Proof {}..., sending for verification", proof.0.short()),
                );
                let reply = self.store.verify(&VerifyOwnership { tag, proof }).await?;
                if reply.is(status::VERIFIED) {
                    Ok(Completion::Verified { tag, proof })
                } else {
                    Err(RunError::VerificationRejected {
                        status: reply.status,
                    })
                }
            }
        }
    }

    fn transition(&mut self, to: ProtocolState, message: impl Into<String>) {
        self.emit(to, message.into(), None);
    }

    fn emit(&mut self, to: ProtocolState, message: String, outcome: Option<Outcome>) {
        if outcome == Some(Outcome::Failure) {
            warn!(from = %self.state, %to, "{message}");
        } else {
            debug!(from = %self.state, %to, "{message}");
        }
        let transition = Transition {
            from: self.state,
            to,
            message,
            outcome,
        };
        self.state = to;
        self.subscribers
            .retain(|subscriber| subscriber.send(transition.clone()).is_ok());
    }
}
