use {
    crate::{Proof, Seed, Tag},
    serde::{Deserialize, Serialize},
};

pub trait RequestToResponse {
    type Response;
    const PATH: &'static str;
}
macro_rules! response_type {
    ($request:ty, $response:ty, $path:literal) => {
        impl RequestToResponse for $request {
            type Response = $response;
            const PATH: &'static str = $path;
        }
    };
}

pub type Response<Request> = <Request as RequestToResponse>::Response;

/// Path prefix for raw content uploads: `PUT /content/<tag>`.
pub const CONTENT_PATH_PREFIX: &str = "/content/";

/// Values of the `status` field used by the store.
pub mod status {
    pub const NEW: &str = "new";
    pub const EXISTS: &str = "exists";
    pub const UPLOADED: &str = "uploaded";
    pub const VERIFIED: &str = "verified";
    pub const FAILED: &str = "failed";
    pub const ERROR: &str = "error";
}

/// Checks whether content with the specified tag is already stored.
/// If it is, the store issues a fresh seed for a proof of ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckFile {
    pub tag: Tag,
}
response_type!(CheckFile, CheckFileReply, "/check-file");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFileReply {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Seed>,
}

/// Decoded answer to [`CheckFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Duplicate {
    New,
    Exists(Seed),
}

impl CheckFileReply {
    #[must_use]
    #[inline]
    pub fn new_content() -> Self {
        Self {
            status: status::NEW.into(),
            seed: None,
        }
    }

    #[must_use]
    #[inline]
    pub fn exists(seed: Seed) -> Self {
        Self {
            status: status::EXISTS.into(),
            seed: Some(seed),
        }
    }

    /// Returns `None` if the reply is neither `new` nor `exists` with a seed.
    #[must_use]
    #[inline]
    pub fn decode(self) -> Option<Duplicate> {
        match (self.status.as_str(), self.seed) {
            (status::NEW, _) => Some(Duplicate::New),
            (status::EXISTS, Some(seed)) => Some(Duplicate::Exists(seed)),
            _ => None,
        }
    }
}

/// Submits a proof computed for the seed issued by the last [`CheckFile`].
/// The store answers with status `verified` if it recomputes the same proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOwnership {
    pub tag: Tag,
    pub proof: Proof,
}
response_type!(VerifyOwnership, StatusReply, "/verify");

/// Generic store answer. Also used for upload acknowledgements and errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusReply {
    #[must_use]
    #[inline]
    pub fn new(status: &str) -> Self {
        Self {
            status: status.into(),
            message: None,
        }
    }

    #[must_use]
    #[inline]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: status::ERROR.into(),
            message: Some(message.into()),
        }
    }

    #[must_use]
    #[inline]
    pub fn is(&self, status: &str) -> bool {
        self.status == status
    }
}
