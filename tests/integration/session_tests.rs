// tests/integration/session_tests.rs
use vasp_session_node::core::entities::VirtualAssetsAccountNumber;
use vasp_session_node::core::messages::{
    TerminationMessage, TransferDispatchMessage, TransferRequestMessage, VirtualAsset,
};
use vasp_session_node::network::transport::Transport;

use crate::common::{Originator, TestContext, BENEFICIARY_CODE};

#[test_log::test(tokio::test)]
async fn test_transfer_flow_reaches_callbacks() {
    let mut ctx = TestContext::new().await;
    let originator = Originator::registered(&ctx).await;
    originator.send_session_request(&ctx.transport).await;
    let session = ctx.next_session().await.expect("No session created");
    let topic_b = session.info().topic.clone();
    let session_id = session.id().to_string();

    let beneficiary_vaan = VirtualAssetsAccountNumber::create(BENEFICIARY_CODE, "524ee3fb082809").unwrap();
    let messages = [
        originator.seal(TransferRequestMessage::create(
            session_id.clone(),
            VirtualAssetsAccountNumber::create("7dface61", "0102").unwrap(),
            beneficiary_vaan.clone(),
            VirtualAsset::Btc,
            0.25,
        )),
        originator.seal(TransferDispatchMessage::create(session_id.clone(), "0xabc", "0xsender")),
        originator.seal(TerminationMessage::create(session_id.clone())),
    ];
    for envelope in messages {
        ctx.transport.publish(&topic_b, envelope).await.unwrap();
    }

    assert_eq!(session.poll().await.unwrap(), 3);
    session.wait_idle().await;

    assert_eq!(
        *ctx.callbacks.events.lock(),
        vec![
            format!("{}:request:{}", session_id, beneficiary_vaan),
            format!("{}:dispatch:0xabc", session_id),
            format!("{}:terminated", session_id),
        ]
    );

    session.close().await;
    ctx.app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_session_rejects_messages_from_other_signers() {
    let mut ctx = TestContext::new().await;
    let originator = Originator::registered(&ctx).await;
    let impostor = Originator::new(&ctx.transport).await;
    originator.send_session_request(&ctx.transport).await;
    let session = ctx.next_session().await.expect("No session created");

    ctx.transport
        .publish(
            &session.info().topic,
            impostor.seal(TerminationMessage::create(session.id())),
        )
        .await
        .unwrap();

    assert_eq!(session.poll().await.unwrap(), 0);
    session.wait_idle().await;
    assert!(ctx.callbacks.events.lock().is_empty());

    session.close().await;
    ctx.app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_closed_session_drops_new_messages() {
    let mut ctx = TestContext::new().await;
    let originator = Originator::registered(&ctx).await;
    originator.send_session_request(&ctx.transport).await;
    let session = ctx.next_session().await.expect("No session created");

    session.close().await;
    assert!(session.receive(originator.seal(TerminationMessage::create(session.id()))));
    session.wait_idle().await;

    assert!(ctx.callbacks.events.lock().is_empty());
    ctx.app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_polled_sessions() {
    let mut ctx = TestContext::new().await;
    let originator = Originator::registered(&ctx).await;
    originator.send_session_request(&ctx.transport).await;
    let session = ctx.next_session().await.expect("No session created");

    let poller = ctx.app.session_poller().clone();
    poller.spawn(session.clone());
    assert_eq!(poller.active(), 1);

    tokio::time::timeout(std::time::Duration::from_secs(2), ctx.app.shutdown())
        .await
        .expect("shutdown returns")
        .unwrap();
    assert_eq!(poller.active(), 0);

    assert!(session.receive(originator.seal(TerminationMessage::create(session.id()))));
    session.wait_idle().await;
    assert!(ctx.callbacks.events.lock().is_empty());
}
