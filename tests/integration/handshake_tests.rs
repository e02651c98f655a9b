// tests/integration/handshake_tests.rs
use vasp_session_node::core::crypto::EcdsaSignService;
use vasp_session_node::core::messages::{Message, SessionReplyCode};
use vasp_session_node::network::listener::ListenerError;
use vasp_session_node::network::transport::Transport;

use crate::common::{Originator, TestContext, BENEFICIARY_CODE};

#[test_log::test(tokio::test)]
async fn test_handshake_establishes_shared_session() {
    let mut ctx = TestContext::new().await;
    let originator = Originator::registered(&ctx).await;

    let request = originator.send_session_request(&ctx.transport).await;
    let session = ctx.next_session().await.expect("No session created");
    let info = session.info();

    assert_eq!(info.id, request.session_id());
    assert_eq!(info.counterparty_topic, originator.topic_a);

    let beneficiary = ctx.app.contract_info("0x02");
    let shared = originator
        .handshake_key
        .generate_shared_secret_hex(&beneficiary.handshake_key)
        .unwrap();
    assert_eq!(info.shared_encryption_key, shared);

    let replies = originator.replies(&ctx.transport).await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].verify(&beneficiary.signing_key, &EcdsaSignService::new()));
    match &replies[0].message {
        Message::SessionReply(reply) => {
            assert_eq!(reply.header.session_id, request.session_id());
            assert_eq!(reply.handshake.topic_b, info.topic);
            assert_eq!(reply.code, SessionReplyCode::SessionAccepted);
            assert_eq!(reply.vasp.vasp_identity, beneficiary.vasp_identity);
        }
        other => panic!("Expected a session reply, got {:?}", other),
    }

    assert_eq!(ctx.app.listener().sessions_created(), 1);
    session.close().await;
    ctx.app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_forged_request_leaves_no_trace() {
    let mut ctx = TestContext::new().await;
    let originator = Originator::registered(&ctx).await;
    let impostor = Originator::new(&ctx.transport).await;
    let filters_before = ctx.transport.filter_count();

    // Claims the registered identity but is signed with another key.
    let request = originator.session_request();
    ctx.transport
        .publish(BENEFICIARY_CODE, impostor.seal(request))
        .await
        .unwrap();
    ctx.settle().await;

    assert_eq!(ctx.transport.pending(BENEFICIARY_CODE), 0);
    assert_eq!(ctx.app.listener().sessions_created(), 0);
    assert_eq!(ctx.transport.filter_count(), filters_before);
    assert_eq!(ctx.transport.sym_key_count(), 0);
    assert!(originator.replies(&ctx.transport).await.is_empty());
    assert!(ctx.sessions.try_recv().is_err());
    ctx.app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_originator_is_ignored() {
    let mut ctx = TestContext::new().await;
    let stranger = Originator::new(&ctx.transport).await;

    stranger.send_session_request(&ctx.transport).await;
    ctx.settle().await;

    assert_eq!(ctx.app.listener().sessions_created(), 0);
    assert!(ctx.sessions.try_recv().is_err());
    assert!(ctx.app.listener().is_listening());
    ctx.app.shutdown().await.unwrap();
}

#[test_log::test(tokio::test)]
async fn test_listener_recovers_from_transport_outage() {
    let mut ctx = TestContext::new().await;
    let originator = Originator::registered(&ctx).await;
    ctx.settle().await;

    ctx.transport.fail_with("relay restarting");
    ctx.settle().await;
    ctx.transport.restore();

    originator.send_session_request(&ctx.transport).await;
    let session = ctx.next_session().await.expect("Listener did not recover");

    assert_eq!(ctx.app.listener().sessions_created(), 1);
    session.close().await;
    ctx.app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_batch_is_processed_in_fetch_order() {
    let mut ctx = TestContext::new().await;
    let originator = Originator::registered(&ctx).await;

    let mut expected = Vec::new();
    for _ in 0..3 {
        expected.push(originator.send_session_request(&ctx.transport).await.session_id().to_string());
    }

    let mut created = Vec::new();
    for _ in 0..3 {
        let session = ctx.next_session().await.expect("Missing session");
        created.push(session.id().to_string());
        session.close().await;
    }

    assert_eq!(created, expected);
    ctx.app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_is_final() {
    let ctx = TestContext::new().await;

    ctx.app.shutdown().await.unwrap();
    ctx.app.shutdown().await.unwrap();

    assert!(!ctx.app.listener().is_listening());
    let restart = ctx
        .app
        .start(ctx.callbacks.clone())
        .map_err(|e| e.to_string());
    assert_eq!(restart, Err(format!("Listener error: {}", ListenerError::Disposed)));
}
