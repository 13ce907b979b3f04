use {
    crate::storage::Storage,
    anyhow::Result,
    hyper::StatusCode,
    ownproof_protocol::{
        Seed, Tag,
        endpoints::{
            CheckFile, CheckFileReply, Response, StatusReply, VerifyOwnership, status,
        },
    },
    ownproof_sdk::pow::{self, BlockSize},
    parking_lot::Mutex,
    std::{collections::HashMap, io, sync::Arc},
    tracing::{info, warn},
};

#[derive(Debug, Clone)]
pub struct Context {
    pub storage: Arc<Storage>,
    /// Seed issued by the last duplicate check of each tag, not yet used.
    pub pending_seeds: Arc<Mutex<HashMap<Tag, Seed>>>,
    pub block_size: BlockSize,
    pub max_upload_size: u64,
}

pub fn check_file(
    ctx: &Context,
    request: &CheckFile,
) -> Result<(StatusCode, Response<CheckFile>)> {
    if ctx.storage.contains(&request.tag)? {
        let seed = Seed::generate();
        ctx.pending_seeds.lock().insert(request.tag, seed.clone());
        info!(tag = %request.tag, %seed, "content exists, issued challenge");
        Ok((StatusCode::OK, CheckFileReply::exists(seed)))
    } else {
        info!(tag = %request.tag, "content is new");
        Ok((StatusCode::OK, CheckFileReply::new_content()))
    }
}

/// Recomputes the proof from the stored copy. A seed is consumed by the first
/// verification attempt, successful or not.
pub fn verify(
    ctx: &Context,
    request: &VerifyOwnership,
) -> Result<(StatusCode, Response<VerifyOwnership>)> {
    let Some(seed) = ctx.pending_seeds.lock().remove(&request.tag) else {
        warn!(tag = %request.tag, "verification without a pending challenge");
        return Ok((
            StatusCode::NOT_FOUND,
            StatusReply::error("no pending challenge for this tag"),
        ));
    };
    let content = match ctx.storage.read(&request.tag) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(tag = %request.tag, "verification of missing content");
            return Ok((
                StatusCode::NOT_FOUND,
                StatusReply::error("content not found"),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    match pow::prove_file(&content, &seed, ctx.block_size) {
        Ok(expected) if expected == request.proof => {
            info!(tag = %request.tag, "ownership verified");
            Ok((StatusCode::OK, StatusReply::new(status::VERIFIED)))
        }
        Ok(_) => {
            warn!(tag = %request.tag, "ownership verification failed");
            Ok((StatusCode::FORBIDDEN, StatusReply::new(status::FAILED)))
        }
        Err(err) => {
            warn!(tag = %request.tag, %err, "ownership cannot be verified");
            Ok((StatusCode::FORBIDDEN, StatusReply::new(status::FAILED)))
        }
    }
}
