use {
    anyhow::Result,
    byte_unit::Byte,
    bytes::Bytes,
    http_body_util::{BodyExt, Full, combinators::BoxBody},
    hyper::{
        Method, Request, Response, StatusCode,
        body::Incoming,
        header::{CONTENT_TYPE, HeaderValue},
        server::conn::http1,
        service::service_fn,
    },
    hyper_util::{rt::TokioIo, server::graceful::GracefulShutdown},
    ownproof_protocol::{
        Tag,
        endpoints::{
            CONTENT_PATH_PREFIX, CheckFile, RequestToResponse, StatusReply, VerifyOwnership,
        },
    },
    ownproof_sdk::pow::BlockSize,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    std::{
        convert::Infallible, fmt::Display, future::Future, net::SocketAddr, path::PathBuf,
        pin::pin, sync::Arc,
    },
    storage::Storage,
    tokio::{net::TcpListener, select, task::block_in_place},
    tracing::{info, warn},
};

mod content_streaming;
pub mod handler;
pub mod storage;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub storage_path: PathBuf,
    #[serde(default)]
    pub block_size: BlockSize,
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: Byte,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_max_upload_size() -> Byte {
    Byte::from_u64(1 << 30)
}

fn default_log_filter() -> String {
    "info".into()
}

type Reply = Response<BoxBody<Bytes, Infallible>>;

/// An error answer: `{"status": "error", "message": ...}` with an HTTP error code.
#[derive(Debug)]
struct Rejection {
    code: StatusCode,
    message: String,
}

impl Rejection {
    fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn bad_request(err: impl Display) -> Self {
        warn!(%err, "bad request");
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }

    fn internal(err: impl Display) -> Self {
        warn!(%err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }

    fn into_reply(self) -> Reply {
        json_reply(self.code, &StatusReply::error(self.message))
    }
}

fn json_reply<T: Serialize>(code: StatusCode, value: &T) -> Reply {
    let (code, body) = match serde_json::to_vec(value) {
        Ok(body) => (code, body),
        Err(err) => {
            warn!(%err, "failed to serialize reply");
            (StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
        }
    };
    let mut response = Response::new(Full::new(Bytes::from(body)).boxed());
    *response.status_mut() = code;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Binds to the configured address and serves until SIGINT or SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Listening on: {}", config.bind_addr);
    serve(listener, &config, shutdown_signal()).await
}

/// Serves requests from `listener` until `shutdown` completes, then waits for
/// open connections to finish.
pub async fn serve(
    listener: TcpListener,
    config: &Config,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let ctx = handler::Context {
        storage: Arc::new(Storage::new(config.storage_path.clone())?),
        pending_seeds: Arc::default(),
        block_size: config.block_size,
        max_upload_size: config.max_upload_size.as_u64(),
    };

    let graceful = GracefulShutdown::new();
    let mut shutdown = pin!(shutdown);
    loop {
        select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let ctx = ctx.clone();
                    let connection = http1::Builder::new().keep_alive(true).serve_connection(
                        TokioIo::new(stream),
                        service_fn(move |request| handle_request(ctx.clone(), request)),
                    );
                    let connection = graceful.watch(connection);
                    tokio::spawn(async move {
                        if let Err(err) = connection.await {
                            warn!(?err, %addr, "error while serving HTTP connection");
                        }
                    });
                }
                Err(err) => warn!(?err, "failed to accept"),
            },
            () = &mut shutdown => break,
        }
    }
    info!("shutting down");
    graceful.shutdown().await;
    Ok(())
}

async fn handle_request(
    ctx: handler::Context,
    request: Request<Incoming>,
) -> Result<Reply, Infallible> {
    Ok(try_handle_request(ctx, request)
        .await
        .unwrap_or_else(Rejection::into_reply))
}

async fn try_handle_request(
    ctx: handler::Context,
    request: Request<Incoming>,
) -> Result<Reply, Rejection> {
    let path = request.uri().path().to_owned();
    if let Some(tag) = path.strip_prefix(CONTENT_PATH_PREFIX) {
        let tag: Tag = tag.parse().map_err(Rejection::bad_request)?;
        if request.method() == Method::PUT {
            content_streaming::upload(ctx, request, &tag).await
        } else {
            Err(Rejection::new(StatusCode::METHOD_NOT_ALLOWED, "use PUT"))
        }
    } else if request.method() != Method::POST {
        Err(Rejection::new(StatusCode::NOT_FOUND, "not found"))
    } else if path == CheckFile::PATH {
        wrap_request(ctx, request, handler::check_file).await
    } else if path == VerifyOwnership::PATH {
        wrap_request(ctx, request, handler::verify).await
    } else {
        Err(Rejection::new(StatusCode::NOT_FOUND, "not found"))
    }
}

async fn wrap_request<T, F>(
    ctx: handler::Context,
    request: Request<Incoming>,
    f: F,
) -> Result<Reply, Rejection>
where
    T: RequestToResponse + DeserializeOwned,
    T::Response: Serialize,
    F: FnOnce(&handler::Context, &T) -> Result<(StatusCode, T::Response)>,
{
    let request = parse_request::<T>(request).await?;
    let (code, response) = block_in_place(|| f(&ctx, &request)).map_err(Rejection::internal)?;
    Ok(json_reply(code, &response))
}

async fn parse_request<T: DeserializeOwned>(request: Request<Incoming>) -> Result<T, Rejection> {
    let bytes = request
        .into_body()
        .collect()
        .await
        .map_err(Rejection::bad_request)?
        .to_bytes();
    serde_json::from_slice(&bytes).map_err(Rejection::bad_request)
}

/// Completes on the first SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let sigint = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(?err, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };
    select! {
        () = sigint => info!("received SIGINT"),
        () = sigterm() => info!("received SIGTERM"),
    }
}

#[cfg(target_family = "unix")]
async fn sigterm() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(err) => {
            warn!(?err, "failed to listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(target_family = "unix"))]
async fn sigterm() {
    std::future::pending::<()>().await;
}

#[cfg(target_os = "linux")]
pub fn default_config_dir() -> Result<PathBuf> {
    Ok("/etc".into())
}

// Windows: %APPDATA% (%USERPROFILE%\AppData\Roaming);
// macOS: $HOME/Library/Application Support
#[cfg(not(target_os = "linux"))]
pub fn default_config_dir() -> Result<PathBuf> {
    dirs::config_dir().ok_or_else(|| anyhow::anyhow!("failed to get config dir"))
}
