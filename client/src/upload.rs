use {
    crate::{
        config::Config,
        term::set_status,
    },
    anyhow::Result,
    byte_unit::{Byte, UnitType},
    bytes::Bytes,
    ownproof_sdk::{Outcome, ProtocolController, Transition, client::Client},
    std::{path::Path, process::ExitCode},
    tokio::{sync::mpsc, task::block_in_place},
    tracing::{debug, error, info, warn},
};

/// Runs the protocol for one file. Returns a failure exit code if the run
/// ends in `Failed`; the reason has already been printed by then.
pub async fn upload(config: &Config, path: &Path) -> Result<ExitCode> {
    let content = Bytes::from(block_in_place(|| fs_err::read(path))?);
    let size = Byte::from_u64(u64::try_from(content.len())?);
    if size > config.warn_about_files_larger_than {
        warn!(
            "{} is large ({:.2})",
            path.display(),
            size.get_appropriate_unit(UnitType::Binary)
        );
    }

    let client = Client::new(config.server_url.clone(), config.request_timeout)?;
    debug!(server_url = %client.server_url(), size = content.len(), "starting run");
    let mut controller = ProtocolController::new(client, config.block_size);
    let presenter = tokio::spawn(present(controller.subscribe()));
    let result = controller.run(content).await;
    // Closes the channel so the presenter can finish.
    drop(controller);
    presenter.await?;

    Ok(match result {
        Ok(completion) => {
            info!("Tag: {}", completion.tag());
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    })
}

async fn present(mut transitions: mpsc::UnboundedReceiver<Transition>) {
    let status = set_status("Starting");
    while let Some(transition) = transitions.recv().await {
        match transition.outcome {
            None => status.set(format!("{}: {}", transition.to, transition.message)),
            Some(Outcome::Success) => {
                info!(outcome = ?Outcome::Success, "{}", transition.message);
            }
            Some(Outcome::Failure) => {
                error!("{}", transition.message);
            }
        }
    }
}
