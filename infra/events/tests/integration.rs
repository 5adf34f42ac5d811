use rollcall_events::*;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

#[derive(Clone, Debug, PartialEq, Eq)]
struct CheckIn(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
struct CourseDeleted(pub &'static str);

#[tokio::test]
async fn every_subscriber_receives_each_event() {
    let bus = EventBus::new();
    let mut first = bus.subscribe::<CheckIn>().unwrap();
    let mut second = bus.subscribe::<CheckIn>().unwrap();

    assert_eq!(bus.publish(CheckIn(7)).unwrap(), 2);

    assert_eq!(*first.recv().await.unwrap(), CheckIn(7));
    assert_eq!(*second.recv().await.unwrap(), CheckIn(7));
}

#[tokio::test]
async fn publishing_without_subscribers_is_not_an_error() {
    let bus = EventBus::new();
    assert_eq!(bus.publish(CheckIn(1)).unwrap(), 0);
    assert_eq!(bus.subscriber_count::<CheckIn>(), 0);
}

#[tokio::test]
async fn event_types_are_isolated() {
    let bus = EventBus::new();
    let mut check_ins = bus.subscribe::<CheckIn>().unwrap();
    let mut deletions = bus.subscribe::<CourseDeleted>().unwrap();

    bus.publish(CourseDeleted("c-1")).unwrap();
    bus.publish(CheckIn(3)).unwrap();

    assert_eq!(check_ins.recv().await.unwrap().0, 3);
    assert_eq!(deletions.recv().await.unwrap().0, "c-1");
}

#[tokio::test]
async fn lagging_receiver_skips_to_buffer_tail() {
    let bus = EventBus::new();
    let capacity = 2;
    let mut rx = bus.subscribe_with_capacity::<CheckIn>(capacity).unwrap();

    let total = 50;
    for i in 0..total {
        bus.publish(CheckIn(i)).unwrap();
    }

    assert!(matches!(rx.recv().await, Err(RecvError::Lagged(_))));
    let next = rx.recv().await.unwrap();
    assert_eq!(next.0, total - capacity);
}

#[tokio::test]
async fn ordering_is_preserved() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<CheckIn>().unwrap();

    for i in 0..100 {
        bus.publish(CheckIn(i)).unwrap();
    }
    for i in 0..100 {
        assert_eq!(rx.recv().await.unwrap().0, i);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_publishers_deliver_everything() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<CheckIn>().unwrap();

    let handles: Vec<_> = (0..2)
        .map(|worker| {
            let bus = bus.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    bus.publish(CheckIn(worker * 50 + i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let mut received = 0;
    while tokio::time::timeout(Duration::from_millis(100), rx.recv()).await.is_ok() {
        received += 1;
    }
    assert_eq!(received, 100);
}

#[tokio::test]
async fn shutdown_closes_receivers() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<CheckIn>().unwrap();

    assert_eq!(bus.shutdown(), 1);
    assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
}

#[test]
fn zero_capacity_is_rejected() {
    let bus = EventBus::new();
    let result = bus.subscribe_with_capacity::<CheckIn>(0);
    assert!(matches!(result, Err(EventBusError::InvalidCapacity { .. })));
}
