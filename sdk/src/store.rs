use {
    bytes::Bytes,
    ownproof_protocol::{
        Tag,
        endpoints::{CheckFile, CheckFileReply, StatusReply, VerifyOwnership},
    },
    std::future::Future,
};

/// A remote store exchange that did not complete.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid store reply: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("store answered with HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid store URL: {0}")]
    Url(#[from] url::ParseError),
}

/// The three exchanges the protocol needs from a store.
///
/// Implementations report an error only when an exchange does not complete;
/// any answer the store gives is returned as is, including rejections.
pub trait RemoteStore {
    fn check_file(
        &self,
        request: &CheckFile,
    ) -> impl Future<Output = Result<CheckFileReply, StoreError>> + Send;

    fn upload(
        &self,
        tag: &Tag,
        content: Bytes,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn verify(
        &self,
        request: &VerifyOwnership,
    ) -> impl Future<Output = Result<StatusReply, StoreError>> + Send;
}
