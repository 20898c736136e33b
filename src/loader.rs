//! Asynchronous view refresh.
//!
//! A load runs a provider call on a worker task while a second task animates
//! the target widget's title and enforces the deadline. Neither task touches
//! widget state: every mutation travels through the [`UiQueue`] and is applied
//! by the event loop that owns the state.

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tracing::{debug, warn};

pub const LOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const SPINNER_INTERVAL: Duration = Duration::from_millis(100);
pub const SPINNER_FRAMES: [&str; 8] = [" ⠋", " ⠙", " ⠹", " ⠸", " ⠼", " ⠴", " ⠦", " ⠧"];
pub const TIMED_OUT_TITLE: &str = "Timed out";

pub type UiUpdate<S> = Box<dyn FnOnce(&mut S) + Send>;
pub type UiReceiver<S> = mpsc::UnboundedReceiver<UiUpdate<S>>;

/// Sending half of the render-thread queue.
pub struct UiQueue<S> {
    tx: mpsc::UnboundedSender<UiUpdate<S>>,
}

impl<S> Clone for UiQueue<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> UiQueue<S> {
    pub fn channel() -> (Self, UiReceiver<S>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Schedules `update` to run on the render thread. Returns `false` once
    /// the event loop is gone.
    pub fn update<F>(&self, update: F) -> bool
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.tx.send(Box::new(update)).is_ok()
    }
}

/// Applies every queued update to `state`, returning how many ran.
pub fn drain<S>(rx: &mut UiReceiver<S>, state: &mut S) -> usize {
    let mut applied = 0;
    while let Ok(update) = rx.try_recv() {
        update(state);
        applied += 1;
    }
    applied
}

/// What the loader needs from the state that owns the widgets.
pub trait WidgetHost: 'static {
    type WidgetId: Copy + Debug + Send + 'static;

    fn set_widget_title(&mut self, id: Self::WidgetId, title: String);

    fn load_started(&mut self, _id: Self::WidgetId) {}

    fn load_finished(&mut self, _id: Self::WidgetId, _outcome: LoadOutcome) {}
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LoadOutcome {
    Applied,
    TimedOut,
}

pub struct Loader<S> {
    queue: UiQueue<S>,
    timeout: Duration,
}

impl<S> Clone for Loader<S> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S: WidgetHost> Loader<S> {
    pub fn new(queue: UiQueue<S>, timeout: Duration) -> Self {
        Self { queue, timeout }
    }

    /// Starts one load against `widget`.
    ///
    /// `current_title` is the widget title as seen on the render thread right
    /// now. `fetch` must not touch widget state; a fetch worker that dies
    /// without a value is treated as an empty result. `apply` runs on the
    /// render thread exactly once if the value arrives before the deadline,
    /// and never otherwise.
    pub fn load<T, F, A>(
        &self,
        widget: S::WidgetId,
        current_title: &str,
        fetch: F,
        apply: A,
    ) -> JoinHandle<LoadOutcome>
    where
        T: Default + Send + 'static,
        F: Future<Output = T> + Send + 'static,
        A: FnOnce(&mut S, T) + Send + 'static,
    {
        let original_title = strip_spinner(current_title).to_string();
        let deadline = Instant::now() + self.timeout;
        let queue = self.queue.clone();
        queue.update(move |state: &mut S| state.load_started(widget));

        let (result_tx, mut result_rx) = oneshot::channel::<T>();
        let fetch_worker = tokio::spawn(async move {
            let value = fetch.await;
            // The receiver is gone once the deadline has won.
            let _ = result_tx.send(value);
        });

        tokio::spawn(async move {
            let mut ticker = interval(SPINNER_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let expired = sleep_until(deadline);
            tokio::pin!(expired);
            let mut frame = 0usize;

            loop {
                tokio::select! {
                    biased;
                    received = &mut result_rx => {
                        let value = received.unwrap_or_else(|_| {
                            warn!(?widget, "fetch worker ended without a result");
                            T::default()
                        });
                        debug!(?widget, "load committed");
                        queue.update(move |state: &mut S| {
                            state.set_widget_title(widget, original_title);
                            apply(state, value);
                            state.load_finished(widget, LoadOutcome::Applied);
                        });
                        break LoadOutcome::Applied;
                    }
                    _ = &mut expired => {
                        fetch_worker.abort();
                        warn!(?widget, "load timed out");
                        queue.update(move |state: &mut S| {
                            state.set_widget_title(widget, TIMED_OUT_TITLE.to_string());
                            state.load_finished(widget, LoadOutcome::TimedOut);
                        });
                        break LoadOutcome::TimedOut;
                    }
                    _ = ticker.tick() => {
                        let title = spinner_title(&original_title, frame);
                        frame = frame.wrapping_add(1);
                        queue.update(move |state: &mut S| state.set_widget_title(widget, title));
                    }
                }
            }
        })
    }
}

pub fn spinner_title(title: &str, frame: usize) -> String {
    format!("{title}{}", SPINNER_FRAMES[frame % SPINNER_FRAMES.len()])
}

/// Drops a spinner suffix left behind by a load that is still animating.
pub fn strip_spinner(title: &str) -> &str {
    SPINNER_FRAMES
        .iter()
        .find_map(|frame| title.strip_suffix(frame))
        .unwrap_or(title)
}

#[cfg(test)]
fn has_spinner(title: &str) -> bool {
    strip_spinner(title).len() != title.len()
}
