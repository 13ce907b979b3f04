use {
    crate::store::{RemoteStore, StoreError},
    bytes::Bytes,
    ownproof_protocol::{
        Tag,
        endpoints::{
            CONTENT_PATH_PREFIX, CheckFile, CheckFileReply, RequestToResponse, StatusReply,
            VerifyOwnership,
        },
    },
    reqwest::{Method, Url, header::CONTENT_LENGTH},
    serde::{Serialize, de::DeserializeOwned},
    std::time::Duration,
    tracing::{debug, instrument},
};

/// HTTP client for the store.
///
/// Reuse created client or clone it in order to reuse a connection pool.
/// Failed requests are never retried.
#[derive(Debug, Clone)]
pub struct Client {
    reqwest: reqwest::Client,
    server_url: Url,
    timeout: Duration,
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[must_use]
#[inline]
pub fn upload_timeout(timeout: Duration, upload_size: u64) -> Duration {
    // Assuming upload speed above 1 MB/s.
    timeout.saturating_add(Duration::from_micros(upload_size))
}

impl Client {
    #[inline]
    pub fn new(server_url: Url, timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            reqwest: reqwest::Client::builder().timeout(timeout).build()?,
            server_url,
            timeout,
        })
    }

    #[must_use]
    #[inline]
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    #[instrument(skip_all, fields(path = R::PATH))]
    #[inline]
    pub async fn request<R>(&self, request: &R) -> Result<R::Response, StoreError>
    where
        R: RequestToResponse + Serialize + Sync,
        R::Response: DeserializeOwned,
    {
        let url = self.server_url.join(R::PATH)?;
        let response = self
            .reqwest
            .request(Method::POST, url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Sends a proof for verification.
    ///
    /// Unlike other requests, a rejection may come with an error status, so the
    /// body is decoded regardless of the status if possible.
    #[instrument(skip_all, fields(tag = %request.tag))]
    #[inline]
    pub async fn verify_ownership(
        &self,
        request: &VerifyOwnership,
    ) -> Result<StatusReply, StoreError> {
        let url = self.server_url.join(VerifyOwnership::PATH)?;
        let response = self.reqwest.post(url).json(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(%status, "verify reply");
        serde_json::from_slice(&body).map_err(|err| {
            if status.is_success() {
                StoreError::Decode(err)
            } else {
                StoreError::Status(status)
            }
        })
    }

    #[instrument(skip_all, fields(%tag, size = content.len()))]
    #[inline]
    pub async fn upload_content(&self, tag: &Tag, content: Bytes) -> Result<(), StoreError> {
        let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
        self.reqwest
            .put(self.content_url(tag)?)
            .timeout(upload_timeout(self.timeout, size))
            .header(CONTENT_LENGTH, size)
            .body(content)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn content_url(&self, tag: &Tag) -> Result<Url, StoreError> {
        Ok(self
            .server_url
            .join(&format!("{CONTENT_PATH_PREFIX}{tag}"))?)
    }
}

impl RemoteStore for Client {
    #[inline]
    async fn check_file(&self, request: &CheckFile) -> Result<CheckFileReply, StoreError> {
        self.request(request).await
    }

    #[inline]
    async fn upload(&self, tag: &Tag, content: Bytes) -> Result<(), StoreError> {
        self.upload_content(tag, content).await
    }

    #[inline]
    async fn verify(&self, request: &VerifyOwnership) -> Result<StatusReply, StoreError> {
        self.verify_ownership(request).await
    }
}
