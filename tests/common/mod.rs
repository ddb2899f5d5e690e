#![allow(dead_code)]

use std::time::Duration;

use hive_actors::{Actor, Hive, HiveConfig, HiveHandle, HiveProxy, Message};
use tokio::{sync::mpsc, task::JoinHandle, time::timeout};

/// An actor that forwards every message it handles to a channel.
pub struct Recorder {
    proxy: HiveProxy,
    seen: mpsc::UnboundedSender<Message>,
}

impl Actor for Recorder {
    type Error = String;
    type Args = mpsc::UnboundedSender<Message>;

    fn create(proxy: HiveProxy, seen: Self::Args) -> Result<Self, Self::Error> {
        Ok(Self { proxy, seen })
    }

    async fn handle_message(&mut self, message: Message) -> Result<(), Self::Error> {
        if message.directive() == "retire" {
            let id = self.proxy.id().clone();
            return self.proxy.remove_actor(&id).map_err(|err| err.to_string());
        }

        self.seen
            .send(message)
            .map_err(|_| "test receiver dropped".to_string())
    }
}

pub fn config() -> HiveConfig {
    HiveConfig::default()
        .with_worker_poll_timeout(Duration::from_millis(50))
        .with_dispatch_poll_timeout(Duration::from_millis(50))
}

pub fn start(config: HiveConfig) -> (HiveHandle, JoinHandle<()>) {
    let hive = Hive::new(config).expect("valid hive config");
    let handle = hive.handle();
    (handle, tokio::spawn(hive.run()))
}

pub async fn stop(hive: HiveHandle, running: JoinHandle<()>) {
    hive.stop();
    timeout(Duration::from_secs(5), running)
        .await
        .expect("hive did not stop in time")
        .expect("hive task panicked");
}

/// Receive exactly `count` messages, failing the test if they take too long.
pub async fn collect<T>(receiver: &mut mpsc::UnboundedReceiver<T>, count: usize) -> Vec<T> {
    let mut received = Vec::with_capacity(count);
    while received.len() < count {
        let item = timeout(Duration::from_secs(5), receiver.recv())
            .await
            .expect("timed out waiting for messages")
            .expect("channel closed");
        received.push(item);
    }

    received
}

/// Check that nothing else arrives within a short window.
///
/// A closed channel counts as quiet: it means the actor holding the sender has been dropped.
pub async fn assert_quiet<T>(receiver: &mut mpsc::UnboundedReceiver<T>) {
    let result = timeout(Duration::from_millis(250), receiver.recv()).await;
    assert!(!matches!(result, Ok(Some(_))), "unexpected extra message");
}

pub fn number(message: &Message) -> usize {
    *message
        .body()
        .downcast_ref::<usize>()
        .expect("body should be a number")
}
