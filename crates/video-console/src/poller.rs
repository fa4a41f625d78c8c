//! Asynchronous video status poller.
//!
//! A poller repeatedly fetches one video's status on a fixed cadence and
//! sends every observation to the owning controller. The loop stops after
//! the first terminal observation, which is still delivered, or after the
//! first transport error. At most one poll task is alive per
//! [`StatusPoller`]; starting a new one aborts the previous task, and each
//! start is stamped with a fresh generation so late events from a
//! superseded task can be recognised and dropped.

use crate::api::{ApiError, VideoApi};
use shared::Video;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum PollEventKind {
    Update(Video),
    Failed(ApiError),
}

/// One observation made by a poll task
#[derive(Debug)]
pub struct PollEvent {
    pub generation: u64,
    pub video_id: i64,
    pub kind: PollEventKind,
}

impl PollEvent {
    /// Whether this is the last event its task will send
    pub fn is_final(&self) -> bool {
        match &self.kind {
            PollEventKind::Update(video) => video.status.is_terminal(),
            PollEventKind::Failed(_) => true,
        }
    }
}

/// Handle to a running poll task; dropping it aborts the task
#[derive(Debug)]
pub struct PollHandle {
    generation: u64,
    video_id: i64,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn video_id(&self) -> i64 {
        self.video_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct StatusPoller {
    api: Arc<dyn VideoApi>,
    interval: Duration,
    events: UnboundedSender<PollEvent>,
    active: Option<PollHandle>,
    last_generation: u64,
}

impl StatusPoller {
    /// Create a poller and the receiving end of its event channel
    pub fn new(api: Arc<dyn VideoApi>, interval: Duration) -> (Self, UnboundedReceiver<PollEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let poller = Self {
            api,
            interval,
            events,
            active: None,
            last_generation: 0,
        };
        (poller, receiver)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling `video_id`, superseding any running task
    pub fn start(&mut self, video_id: i64) -> &PollHandle {
        self.cancel();

        self.last_generation += 1;
        let generation = self.last_generation;
        info!(
            video_id = video_id,
            generation = generation,
            interval_ms = self.interval.as_millis() as u64,
            "Starting status poller"
        );

        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.api),
            self.events.clone(),
            video_id,
            generation,
            self.interval,
        ));

        self.active.insert(PollHandle {
            generation,
            video_id,
            task,
        })
    }

    /// Stop the running task, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            debug!(
                video_id = handle.video_id,
                generation = handle.generation,
                "Cancelling status poller"
            );
            handle.cancel();
        }
    }

    pub fn active(&self) -> Option<&PollHandle> {
        self.active.as_ref()
    }

    pub fn is_polling(&self) -> bool {
        self.active.is_some()
    }

    /// Decide whether an event belongs to the running task.
    ///
    /// Events from superseded or cancelled tasks are rejected. A final event
    /// of the running task releases its handle.
    pub fn accept(&mut self, event: &PollEvent) -> bool {
        let is_current = self
            .active
            .as_ref()
            .is_some_and(|handle| handle.generation == event.generation);

        if !is_current {
            debug!(
                video_id = event.video_id,
                generation = event.generation,
                "Discarding event from superseded poller"
            );
            return false;
        }

        if event.is_final() {
            self.active = None;
        }
        true
    }
}

async fn poll_loop(
    api: Arc<dyn VideoApi>,
    events: UnboundedSender<PollEvent>,
    video_id: i64,
    generation: u64,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // The first tick completes immediately.
        ticker.tick().await;

        let kind = match api.get_video_status(video_id).await {
            Ok(video) => {
                debug!(video_id = video_id, status = %video.status, "Polled video status");
                PollEventKind::Update(video)
            }
            Err(err) => {
                warn!(video_id = video_id, error = %err, "Status poll failed");
                PollEventKind::Failed(err)
            }
        };

        let event = PollEvent {
            generation,
            video_id,
            kind,
        };
        let done = event.is_final();

        if events.send(event).is_err() {
            debug!(video_id = video_id, "Poll event receiver dropped");
            break;
        }
        if done {
            info!(video_id = video_id, generation = generation, "Status poller finished");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{server_error, video, FakeApi};
    use shared::VideoStatus;

    fn poller_for(api: &Arc<FakeApi>) -> (StatusPoller, UnboundedReceiver<PollEvent>) {
        let api: Arc<dyn VideoApi> = api.clone();
        StatusPoller::new(api, Duration::from_secs(3))
    }

    fn status_of(event: &PollEvent) -> Option<VideoStatus> {
        match &event.kind {
            PollEventKind::Update(v) => Some(v.status),
            PollEventKind::Failed(_) => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_observation_is_delivered_then_polling_stops() {
        let api = Arc::new(FakeApi::default());
        api.script_status(
            7,
            vec![
                Ok(video(7, VideoStatus::Processing, 0)),
                Ok(video(7, VideoStatus::GeneratingQuiz, 0)),
                Ok(video(7, VideoStatus::Completed, 0)),
            ],
        );
        let (mut poller, mut rx) = poller_for(&api);
        poller.start(7);

        let mut seen = Vec::new();
        loop {
            let event = rx.recv().await.unwrap();
            assert!(poller.accept(&event));
            seen.push(status_of(&event));
            if event.is_final() {
                break;
            }
        }

        assert_eq!(
            seen,
            vec![
                Some(VideoStatus::Processing),
                Some(VideoStatus::GeneratingQuiz),
                Some(VideoStatus::Completed)
            ]
        );
        assert!(!poller.is_polling());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.status_calls_for(7), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_follow_the_interval() {
        let api = Arc::new(FakeApi::default());
        api.script_status(
            3,
            vec![
                Ok(video(3, VideoStatus::Processing, 0)),
                Ok(video(3, VideoStatus::Processing, 0)),
                Ok(video(3, VideoStatus::Failed, 0)),
            ],
        );
        let (mut poller, mut rx) = poller_for(&api);
        let started = tokio::time::Instant::now();
        poller.start(3);

        rx.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        rx.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        let last = rx.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(6));
        assert_eq!(status_of(&last), Some(VideoStatus::Failed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_tears_down_the_poller() {
        let api = Arc::new(FakeApi::default());
        api.script_status(
            5,
            vec![
                Ok(video(5, VideoStatus::Processing, 0)),
                Err(server_error(500, "database is locked")),
                Ok(video(5, VideoStatus::Processing, 0)),
            ],
        );
        let (mut poller, mut rx) = poller_for(&api);
        poller.start(5);

        let first = rx.recv().await.unwrap();
        assert!(poller.accept(&first));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second.kind, PollEventKind::Failed(_)));
        assert!(poller.accept(&second));
        assert!(!poller.is_polling());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.status_calls_for(5), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_supersedes_previous_task() {
        let api = Arc::new(FakeApi::default());
        api.delay_status(1, Duration::from_secs(2));
        api.script_status(1, vec![Ok(video(1, VideoStatus::Completed, 0))]);
        api.script_status(2, vec![Ok(video(2, VideoStatus::Completed, 0))]);

        let (mut poller, mut rx) = poller_for(&api);
        let first_generation = poller.start(1).generation();
        // Let the first request go out before switching.
        tokio::task::yield_now().await;
        let second_generation = poller.start(2).generation();
        assert!(second_generation > first_generation);
        assert_eq!(poller.active().map(|h| h.video_id()), Some(2));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.video_id, 2);
        assert!(poller.accept(&event));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err(), "aborted task must not deliver");
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_from_old_generation_are_rejected() {
        let api = Arc::new(FakeApi::default());
        let (mut poller, _rx) = poller_for(&api);
        let old = poller.start(1).generation();
        poller.start(2);

        let stale = PollEvent {
            generation: old,
            video_id: 1,
            kind: PollEventKind::Update(video(1, VideoStatus::Completed, 0)),
        };
        assert!(!poller.accept(&stale));
        assert!(poller.is_polling());
    }
}
