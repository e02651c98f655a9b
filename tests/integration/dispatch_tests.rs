// tests/integration/dispatch_tests.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vasp_session_node::core::messages::{Message, MessageKind, TerminationMessage};
use vasp_session_node::network::dispatch::{HandlerRegistry, MessageDispatchQueue};

use crate::common::{Originator, TestContext};

#[tokio::test]
async fn test_concurrent_producers_are_all_handled() {
    let ctx = TestContext::new().await;
    let originator = Originator::new(&ctx.transport).await;
    let request = originator.session_request();

    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let registry = HandlerRegistry::builder()
        .add_fn(MessageKind::SessionRequest, move |_message: Message| {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .build();
    let queue = Arc::new(MessageDispatchQueue::new(registry, &CancellationToken::new()));

    let producers: Vec<_> = (0..5)
        .map(|_| {
            let queue = queue.clone();
            let request = request.clone();
            tokio::spawn(async move { queue.enqueue(request) })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    tokio::time::timeout(Duration::from_secs(1), queue.wait())
        .await
        .expect("Queue did not drain");
    assert_eq!(counter.load(Ordering::SeqCst), 5);

    queue.enqueue(request);
    queue.wait().await;
    assert_eq!(counter.load(Ordering::SeqCst), 6);
    assert!(queue.is_running());

    queue.dispose().await;
    queue.enqueue(TerminationMessage::create("late"));
    assert!(queue.is_empty());
    ctx.app.shutdown().await.unwrap();
}
