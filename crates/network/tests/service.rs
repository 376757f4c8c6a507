use std::{path::PathBuf, sync::Arc, time::Duration};

use blastoff_app::{
    core::{Color, DriverError, Error, OperationError, StripConfig},
    test_utils::{MemoryProbe, MemoryStrip},
    Controller,
};
use blastoff_network::{Client, Server, StateBroadcaster, SwitchBridge};
use tokio::{sync::oneshot, task::JoinHandle};

const TIMEOUT: Duration = Duration::from_secs(10);

struct Loopback {
    path: PathBuf,
    probe: MemoryProbe,
    controller: Arc<Controller<MemoryStrip>>,
    events: StateBroadcaster,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<std::io::Result<()>>,
}

impl Loopback {
    async fn client(&self) -> Client {
        Client::connect(&self.path)
            .await
            .expect("unable to establish client connection")
    }

    async fn stop_serving(&mut self) {
        self.shutdown.take().unwrap().send(()).unwrap();
        (&mut self.server).await.unwrap().unwrap();
    }

    async fn shutdown(mut self) {
        self.stop_serving().await;
        assert!(!self.path.exists());
    }
}

fn socket_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("blastoff-{}-{name}.sock", std::process::id()))
}

async fn create_loopback(name: &str) -> Loopback {
    let _ = env_logger::try_init();

    let backend = MemoryStrip::default();
    let probe = backend.probe();
    let events = StateBroadcaster::new();
    let config = StripConfig::new(60, 12).with_step_interval(Duration::from_millis(1));
    let controller = Arc::new(
        Controller::new(backend, config)
            .with_observer(events.clone())
            .with_render_failure_handler(|err| panic!("Unexpected render failure: {err}")),
    );

    let path = socket_path(name);
    let server = Server::bind(&path, controller.clone(), events.clone())
        .await
        .unwrap();
    let (tx, rx) = oneshot::channel();
    let server = tokio::spawn(server.serve(async move {
        let _ = rx.await;
    }));

    Loopback {
        path,
        probe,
        controller,
        events,
        shutdown: Some(tx),
        server,
    }
}

#[tokio::test]
async fn test_start_stop_status() {
    let loopback = create_loopback("start-stop").await;
    let mut client = loopback.client().await;

    assert!(!client.is_started().await.unwrap());
    client.start().await.unwrap();
    assert!(client.is_started().await.unwrap());
    // Repeated start is a successful no-op.
    client.start().await.unwrap();
    assert_eq!(loopback.probe.created(), 1);

    assert!(loopback.probe.wait_for_writes(3, TIMEOUT));
    client.stop().await.unwrap();
    client.stop().await.unwrap();
    assert!(!client.is_started().await.unwrap());
    assert_eq!(loopback.probe.last_frame(), Some(vec![Color::BLACK; 12]));
    assert_eq!(loopback.probe.releases(), 1);

    drop(client);
    loopback.shutdown().await;
}

#[tokio::test]
async fn test_operation_errors_are_delivered() {
    let loopback = create_loopback("errors").await;
    let mut client = loopback.client().await;

    loopback.probe.fail_init(true);
    assert_eq!(
        client.start().await,
        Err(Error::Operation(OperationError::Start(DriverError::Init)))
    );
    loopback.probe.fail_init(false);

    client.start().await.unwrap();
    loopback.probe.fail_blank(true);
    assert_eq!(
        client.stop().await,
        Err(Error::Operation(OperationError::Stop(DriverError::Render)))
    );
    assert!(client.is_started().await.unwrap());

    // The connection is still usable after an error reply.
    loopback.probe.fail_blank(false);
    client.stop().await.unwrap();
    assert!(!client.is_started().await.unwrap());

    drop(client);
    loopback.shutdown().await;
}

#[tokio::test]
async fn test_state_change_subscription() {
    let loopback = create_loopback("subscription").await;

    let mut subscription = loopback.client().await.subscribe().await.unwrap();
    assert!(!subscription.is_started());

    let mut client = loopback.client().await;
    client.start().await.unwrap();
    client.start().await.unwrap();
    client.stop().await.unwrap();

    let next = tokio::time::timeout(TIMEOUT, subscription.next_state());
    assert!(next.await.unwrap().unwrap());
    let next = tokio::time::timeout(TIMEOUT, subscription.next_state());
    assert!(!next.await.unwrap().unwrap());
    assert!(!subscription.is_started());

    drop(client);
    drop(subscription);
    loopback.shutdown().await;
}

#[tokio::test]
async fn test_switch_bridge() {
    let loopback = create_loopback("switch").await;
    let mut switch = SwitchBridge::new(loopback.client().await);

    assert!(!switch.is_on().await.unwrap());
    switch.set_on(true).await.unwrap();
    assert!(switch.is_on().await.unwrap());
    switch.set_on(false).await.unwrap();
    assert!(!switch.is_on().await.unwrap());
    assert_eq!(loopback.probe.releases(), 1);

    drop(switch);
    loopback.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_clients() {
    let loopback = create_loopback("concurrent").await;

    let mut tasks = Vec::new();
    for worker in 0..4_usize {
        let mut client = loopback.client().await;
        tasks.push(tokio::spawn(async move {
            for step in 0..10_usize {
                if (worker + step) % 2 == 0 {
                    client.start().await.unwrap();
                } else {
                    client.stop().await.unwrap();
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let mut client = loopback.client().await;
    client.stop().await.unwrap();
    assert_eq!(loopback.probe.misuses(), 0);
    assert_eq!(loopback.probe.active(), 0);

    drop(client);
    loopback.shutdown().await;
}

#[tokio::test]
async fn test_socket_in_use() {
    let loopback = create_loopback("in-use").await;

    let controller = Arc::new(Controller::new(MemoryStrip::default(), StripConfig::default()));
    let err = Server::bind(&loopback.path, controller, StateBroadcaster::new())
        .await
        .err()
        .expect("second service must not take over the socket");
    assert_eq!(err.kind(), std::io::ErrorKind::AddrInUse);

    loopback.shutdown().await;
}

#[tokio::test]
async fn test_no_start_after_daemon_shutdown() {
    let mut loopback = create_loopback("final-stop").await;
    let mut client = loopback.client().await;
    let mut late_client = loopback.client().await;

    client.start().await.unwrap();
    assert!(loopback.probe.wait_for_writes(3, TIMEOUT));

    // Same order as the daemon exit: stop serving, then stop the animation for good.
    loopback.stop_serving().await;
    loopback.controller.shutdown().unwrap();
    assert!(!loopback.controller.is_started());

    assert_eq!(late_client.start().await, Err(Error::Network));
    assert_eq!(client.is_started().await, Err(Error::Network));
    assert!(!loopback.controller.is_started());
    assert_eq!(loopback.controller.start(), Err(OperationError::Closed));
    assert_eq!(loopback.probe.active(), 0);
    assert_eq!(loopback.probe.last_frame(), Some(vec![Color::BLACK; 12]));
    assert!(!loopback.path.exists());
}

#[tokio::test]
async fn test_disconnected_subscriber_is_dropped() {
    let loopback = create_loopback("unsubscribe").await;

    let subscription = loopback.client().await.subscribe().await.unwrap();
    assert_eq!(loopback.events.subscribers(), 1);

    drop(subscription);
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while loopback.events.subscribers() > 0 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "subscription outlived its connection"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    loopback.shutdown().await;
}
