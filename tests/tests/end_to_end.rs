#![expect(clippy::unwrap_used, clippy::panic, reason = "test")]

use {
    bytes::Bytes,
    ownproof::{
        cli::{Cli, Command},
        config::Config,
    },
    ownproof_protocol::{
        Proof, Seed,
        endpoints::{CheckFile, Duplicate, VerifyOwnership, status},
    },
    ownproof_sdk::{
        Completion, Outcome, ProtocolState, RunError,
        pow::{self, BlockSize, InsufficientBlocks},
        store::StoreError,
    },
    ownproof_tests::{TestServer, patterned_content},
    std::process::ExitCode,
};

async fn request_seed(server: &TestServer, content: &[u8]) -> Seed {
    let reply = server
        .client()
        .unwrap()
        .request(&CheckFile {
            tag: pow::tag(content),
        })
        .await
        .unwrap();
    match reply.decode() {
        Some(Duplicate::Exists(seed)) => seed,
        other => panic!("expected an existing file, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn new_file_is_uploaded_then_proven() {
    let server = TestServer::start().await.unwrap();
    let content = Bytes::from(patterned_content(3 * 4096 + 10));
    let tag = pow::tag(&content);

    let mut controller = server.controller().unwrap();
    let mut transitions = controller.subscribe();
    let completion = controller.run(content.clone()).await.unwrap();
    assert_eq!(completion, Completion::Uploaded { tag });
    assert_eq!(controller.state(), ProtocolState::Succeeded);

    let mut states = Vec::new();
    while let Ok(transition) = transitions.try_recv() {
        states.push(transition.to);
    }
    assert_eq!(
        states,
        [
            ProtocolState::Hashing,
            ProtocolState::CheckingDuplicate,
            ProtocolState::Uploading,
            ProtocolState::Succeeded,
        ]
    );

    let completion = controller.run(content).await.unwrap();
    assert!(matches!(
        completion,
        Completion::Verified { tag: verified, .. } if verified == tag
    ));
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stored_zero_file_is_verified() {
    let server = TestServer::start().await.unwrap();
    let content = Bytes::from(vec![0_u8; 8192]);
    let tag = pow::tag(&content);
    assert_eq!(
        tag.to_string(),
        "9f1dcbc35c350d6027f98be0f5c8b43b42ca52b7604459c0c42be3aa88913d47"
    );

    let mut controller = server.controller().unwrap();
    controller.run(content.clone()).await.unwrap();

    let seed = request_seed(&server, &content).await;
    let proof = pow::prove_file(&content, &seed, BlockSize::default()).unwrap();
    let reply = server
        .client()
        .unwrap()
        .verify_ownership(&VerifyOwnership { tag, proof })
        .await
        .unwrap();
    assert!(reply.is(status::VERIFIED));

    // Every run gets a fresh seed, so the controller still succeeds.
    let completion = controller.run(content).await.unwrap();
    let Completion::Verified { proof: second, .. } = completion else {
        panic!("expected verification, got {completion:?}");
    };
    assert_ne!(second, proof);
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_proof_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let content = Bytes::from(patterned_content(5 * 4096));
    let tag = pow::tag(&content);
    server
        .controller()
        .unwrap()
        .run(content.clone())
        .await
        .unwrap();

    request_seed(&server, &content).await;
    let reply = server
        .client()
        .unwrap()
        .verify_ownership(&VerifyOwnership {
            tag,
            proof: Proof(pow::tag(b"mismatch").0),
        })
        .await
        .unwrap();
    assert!(reply.is(status::FAILED));

    // A proof over a different block layout cannot match the server's.
    let mut controller = server.controller_with(BlockSize::new(8192).unwrap()).unwrap();
    let err = controller.run(content).await.unwrap_err();
    assert!(
        matches!(&err, RunError::VerificationRejected { status: answer } if answer == status::FAILED),
        "{err:?}"
    );
    assert_eq!(controller.state(), ProtocolState::Failed);
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn small_stored_file_cannot_be_proven() {
    let server = TestServer::start().await.unwrap();
    let content = Bytes::from(patterned_content(2000));

    let mut controller = server.controller().unwrap();
    assert!(matches!(
        controller.run(content.clone()).await.unwrap(),
        Completion::Uploaded { .. }
    ));

    let mut transitions = controller.subscribe();
    let err = controller.run(content.clone()).await.unwrap_err();
    assert!(
        matches!(
            err,
            RunError::InsufficientBlocks(InsufficientBlocks { blocks: 1 })
        ),
        "{err:?}"
    );
    let mut last = None;
    while let Ok(transition) = transitions.try_recv() {
        assert_ne!(transition.to, ProtocolState::Verifying);
        last = Some(transition);
    }
    let last = last.unwrap();
    assert_eq!(last.to, ProtocolState::Failed);
    assert_eq!(last.outcome, Some(Outcome::Failure));

    // The seed issued for the failed run is still pending, but no proof
    // of a single block exists.
    let seed = request_seed(&server, &content).await;
    assert!(pow::prove_file(&content, &seed, BlockSize::default()).is_err());
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_file_is_uploaded() {
    let server = TestServer::start().await.unwrap();
    let mut controller = server.controller().unwrap();
    let completion = controller.run(Bytes::new()).await.unwrap();
    assert_eq!(
        completion,
        Completion::Uploaded {
            tag: pow::tag(b"")
        }
    );
    assert_eq!(
        completion.tag().to_string(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(controller.state(), ProtocolState::Succeeded);

    let err = controller.run(Bytes::new()).await.unwrap_err();
    assert!(
        matches!(
            err,
            RunError::InsufficientBlocks(InsufficientBlocks { blocks: 0 })
        ),
        "{err:?}"
    );
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_body_without_length_is_accepted() {
    let server = TestServer::start().await.unwrap();
    let url = server
        .url()
        .join(&format!("/content/{}", pow::tag(b"")))
        .unwrap();
    let response = reqwest::Client::new()
        .put(url)
        .body(Vec::new())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let reply = server
        .client()
        .unwrap()
        .request(&CheckFile {
            tag: pow::tag(b""),
        })
        .await
        .unwrap();
    assert!(matches!(reply.decode(), Some(Duplicate::Exists(_))));
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn content_must_match_tag() {
    let server = TestServer::start().await.unwrap();
    let content = Bytes::from(patterned_content(10_000));
    let err = server
        .client()
        .unwrap()
        .upload_content(&pow::tag(b"other"), content)
        .await
        .unwrap_err();
    let StoreError::Transport(err) = err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(err.status().map(|code| code.as_u16()), Some(400));
    assert!(fs_err::read_dir(server.storage_path().join("tmp")).unwrap().next().is_none());
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_store_fails_run() {
    let server = TestServer::start().await.unwrap();
    let mut controller = server.controller().unwrap();
    server.stop().await.unwrap();

    let err = controller
        .run(Bytes::from(patterned_content(9000)))
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::NetworkFailure(_)), "{err:?}");
    assert_eq!(controller.state(), ProtocolState::Failed);
}

#[tokio::test(flavor = "multi_thread")]
async fn cli_upload_reports_exit_code() {
    let server = TestServer::start().await.unwrap();
    let config = Config::parse(&format!("{{ server_url: {:?} }}", server.url().as_str())).unwrap();

    let path = server.scratch_path("large.bin");
    fs_err::write(&path, patterned_content(3 * 4096)).unwrap();
    for _ in 0..2 {
        let cli = Cli {
            config: None,
            command: Command::Upload { path: path.clone() },
        };
        let code = ownproof::run(cli, Some(config.clone())).await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    let path = server.scratch_path("small.bin");
    fs_err::write(&path, patterned_content(100)).unwrap();
    let mut codes = Vec::new();
    for _ in 0..2 {
        let cli = Cli {
            config: None,
            command: Command::Upload { path: path.clone() },
        };
        codes.push(ownproof::run(cli, Some(config.clone())).await.unwrap());
    }
    assert_eq!(codes, [ExitCode::SUCCESS, ExitCode::FAILURE]);
    server.stop().await.unwrap();
}
