mod common;

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use common::{assert_quiet, collect, config, number, start, stop, Recorder};
use hive_actors::{Actor, ActorId, HiveProxy, Message, SliceLimit};
use test_log::test;
use tokio::sync::mpsc;

/// Records which actor handled each message, taking a little time over each one.
struct Slow {
    proxy: HiveProxy,
    log: mpsc::UnboundedSender<ActorId>,
}

impl Actor for Slow {
    type Error = String;
    type Args = mpsc::UnboundedSender<ActorId>;

    fn create(proxy: HiveProxy, log: Self::Args) -> Result<Self, Self::Error> {
        Ok(Self { proxy, log })
    }

    async fn handle_message(&mut self, _: Message) -> Result<(), Self::Error> {
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.log
            .send(self.proxy.id().clone())
            .map_err(|_| "log dropped".to_string())
    }
}

#[derive(Clone, Default)]
struct Overlap {
    busy: Arc<AtomicBool>,
    overlaps: Arc<AtomicUsize>,
    handled: Arc<AtomicUsize>,
}

/// Detects two handler invocations for the same actor running at once.
struct Exclusive {
    overlap: Overlap,
}

impl Actor for Exclusive {
    type Error = String;
    type Args = Overlap;

    fn create(_: HiveProxy, overlap: Self::Args) -> Result<Self, Self::Error> {
        Ok(Self { overlap })
    }

    async fn handle_message(&mut self, _: Message) -> Result<(), Self::Error> {
        if self.overlap.busy.swap(true, Ordering::SeqCst) {
            self.overlap.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        tokio::task::yield_now().await;
        self.overlap.busy.store(false, Ordering::SeqCst);
        self.overlap.handled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn seven_pings_are_each_handled_once_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let (hive, running) = start(
        config()
            .with_num_workers(1)
            .with_max_messages_per_slice(SliceLimit::Bounded(5)),
    );
    let (seen, mut received) = mpsc::unbounded_channel();
    let echo = hive.create_actor_with_id::<Recorder>("Echo-x1", seen)?;

    for n in 0..7usize {
        hive.send_message(Message::build(echo.clone(), "ping").from("Caller-y1").body(n))?;
    }

    let messages = collect(&mut received, 7).await;
    assert_eq!(
        messages.iter().map(number).collect::<Vec<_>>(),
        (0..7).collect::<Vec<_>>()
    );
    assert_quiet(&mut received).await;

    stop(hive, running).await;
    Ok(())
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn a_busy_actor_does_not_starve_others() -> Result<(), Box<dyn std::error::Error>> {
    let (hive, running) = start(
        config()
            .with_num_workers(1)
            .with_max_messages_per_slice(SliceLimit::Bounded(5)),
    );
    let (log, mut handled) = mpsc::unbounded_channel();
    let busy = hive.create_actor::<Slow>(log.clone())?;
    let quiet = hive.create_actor::<Slow>(log)?;

    for _ in 0..20 {
        hive.send_message(Message::build(busy.clone(), "work"))?;
    }
    hive.send_message(Message::build(quiet.clone(), "work"))?;

    let order = collect(&mut handled, 21).await;
    let position = order
        .iter()
        .position(|id| id == &quiet)
        .expect("quiet actor was handled");

    // With one worker the quiet actor waits for at most a couple of the busy actor's slices.
    assert!(position <= 10, "quiet actor handled at position {position}");

    stop(hive, running).await;
    Ok(())
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn idle_actors_are_readmitted_by_new_messages() -> Result<(), Box<dyn std::error::Error>> {
    let (hive, running) = start(config().with_num_workers(2));
    let (seen, mut received) = mpsc::unbounded_channel();
    let echo = hive.create_actor::<Recorder>(seen)?;

    for n in 0..3usize {
        hive.send_message(Message::build(echo.clone(), "ping").body(n))?;
    }
    collect(&mut received, 3).await;
    assert_quiet(&mut received).await;

    for n in 3..5usize {
        hive.send_message(Message::build(echo.clone(), "ping").body(n))?;
    }
    let later = collect(&mut received, 2).await;
    assert_eq!(later.iter().map(number).collect::<Vec<_>>(), vec![3, 4]);

    stop(hive, running).await;
    Ok(())
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn an_actor_is_never_handled_twice_at_once() -> Result<(), Box<dyn std::error::Error>> {
    let (hive, running) = start(
        config()
            .with_num_workers(4)
            .with_max_messages_per_slice(SliceLimit::Bounded(2)),
    );
    let overlap = Overlap::default();
    let target = hive.create_actor::<Exclusive>(overlap.clone())?;

    let senders = (0..4)
        .map(|_| {
            let hive = hive.clone();
            let target = target.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    hive.send_message(Message::build(target.clone(), "poke"))
                        .expect("hive is running");
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect::<Vec<_>>();

    for sender in senders {
        sender.await?;
    }

    tokio::time::timeout(Duration::from_secs(5), async {
        while overlap.handled.load(Ordering::SeqCst) < 200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;

    assert_eq!(overlap.overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(overlap.handled.load(Ordering::SeqCst), 200);

    stop(hive, running).await;
    Ok(())
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn unbounded_slices_still_deliver_everything() -> Result<(), Box<dyn std::error::Error>> {
    let (hive, running) =
        start(config().with_max_messages_per_slice(SliceLimit::Unbounded));
    let (seen, mut received) = mpsc::unbounded_channel();
    let echo = hive.create_actor::<Recorder>(seen)?;

    for n in 0..40usize {
        hive.send_message(Message::build(echo.clone(), "ping").body(n))?;
    }

    let messages = collect(&mut received, 40).await;
    assert_eq!(
        messages.iter().map(number).collect::<Vec<_>>(),
        (0..40).collect::<Vec<_>>()
    );

    stop(hive, running).await;
    Ok(())
}
