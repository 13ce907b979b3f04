use {
    crate::{Rejection, Reply, handler, json_reply},
    http_body_util::BodyExt,
    hyper::{Request, StatusCode, body, header::CONTENT_LENGTH},
    ownproof_protocol::{
        Digest, Tag,
        endpoints::{StatusReply, status},
    },
    sha2::{Digest as _, Sha256},
    std::io::Write,
    tokio::task::block_in_place,
    tracing::{info, warn},
};

/// Receives the full content of a new file and stores it under its tag.
pub async fn upload(
    ctx: handler::Context,
    mut request: Request<body::Incoming>,
    tag: &Tag,
) -> Result<Reply, Rejection> {
    // Clients may omit the header for an empty body.
    let content_length: u64 = match request.headers().get(CONTENT_LENGTH) {
        Some(value) => value
            .to_str()
            .map_err(Rejection::bad_request)?
            .parse()
            .map_err(Rejection::bad_request)?,
        None => 0,
    };
    if content_length > ctx.max_upload_size {
        warn!(content_length, max = ctx.max_upload_size, "upload is too large");
        return Err(Rejection::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("upload exceeds {} bytes", ctx.max_upload_size),
        ));
    }

    let mut file = block_in_place(|| ctx.storage.create_file()).map_err(Rejection::internal)?;
    let mut hasher = Sha256::new();
    let mut received_length = 0_u64;
    while let Some(frame) = request.body_mut().frame().await {
        let frame = frame.map_err(Rejection::bad_request)?;
        let Some(data) = frame.data_ref() else {
            return Err(Rejection::bad_request("unexpected trailer frame"));
        };
        received_length =
            received_length.saturating_add(u64::try_from(data.len()).unwrap_or(u64::MAX));
        if received_length > content_length {
            return Err(Rejection::bad_request("body exceeds content length"));
        }
        hasher.update(data);
        block_in_place(|| file.write_all(data)).map_err(Rejection::internal)?;
    }

    if content_length != received_length {
        warn!(content_length, received_length, "content length mismatch");
        return Err(Rejection::bad_request("content length mismatch"));
    }
    let actual = Tag(Digest(hasher.finalize().into()));
    if actual != *tag {
        warn!(%tag, %actual, "uploaded content doesn't match its tag");
        return Err(Rejection::bad_request("content does not match tag"));
    }

    block_in_place(|| ctx.storage.commit_file(file, tag)).map_err(Rejection::internal)?;
    info!(%tag, size = received_length, "content stored");
    Ok(json_reply(
        StatusCode::OK,
        &StatusReply::new(status::UPLOADED),
    ))
}
