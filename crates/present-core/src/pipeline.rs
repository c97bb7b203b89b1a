//! Output pipeline applied to every execution.
//!
//! Raw output flows through [`limit`] and then [`batch`] before it is tagged
//! with the execution id and queued for the client:
//!
//! ```ignore
//! let events = batch(limit(raw, config.limit, switch), config.window);
//! ```
//!
//! Both stages pass the `end` event through unconditionally and terminate
//! right after it.

use std::{collections::VecDeque, time::Duration};

use futures::{
    Stream, StreamExt,
    stream::{self, BoxStream},
};
use tokio::time::{self, Instant};

use crate::{Kind, KillSwitch, Message};

/// Maximum number of output events delivered per execution.
pub const MESSAGE_LIMIT: usize = 1000;

/// Output arriving within this window is coalesced into one event.
pub const BATCH_WINDOW: Duration = Duration::from_millis(10);

/// Pipeline tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Output events passed before the process is killed.
    pub limit: usize,
    /// Coalescing window.
    pub window: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limit: MESSAGE_LIMIT,
            window: BATCH_WINDOW,
        }
    }
}

struct Limiter {
    upstream: BoxStream<'static, Message>,
    cap: usize,
    passed: usize,
    switch: KillSwitch,
}

impl Limiter {
    async fn next_event(&mut self) -> Option<Message> {
        while let Some(msg) = self.upstream.next().await {
            if msg.kind == Kind::End {
                return Some(msg);
            }
            if self.passed < self.cap {
                self.passed += 1;
                return Some(msg);
            }
            if self.passed == self.cap {
                tracing::debug!(cap = self.cap, "Output limit reached, killing process");
                // Only a request: the kill completes once this stream has
                // drained, so waiting for it here would deadlock.
                self.switch.trigger();
                self.passed += 1;
            }
        }
        None
    }
}

/// Pass at most `cap` output events, then trigger `switch` and drop the rest.
///
/// The `end` event is always forwarded and closes the stream.
pub fn limit<S>(upstream: S, cap: usize, switch: KillSwitch) -> impl Stream<Item = Message> + Send
where
    S: Stream<Item = Message> + Send + 'static,
{
    let limiter = Limiter {
        upstream: upstream.boxed(),
        cap,
        passed: 0,
        switch,
    };
    stream::unfold(Some(limiter), |state| async move {
        let mut limiter = state?;
        let msg = limiter.next_event().await?;
        let next = (msg.kind != Kind::End).then_some(limiter);
        Some((msg, next))
    })
}

enum Step {
    Event(Option<Message>),
    Expired,
}

struct Batcher {
    upstream: BoxStream<'static, Message>,
    window: Duration,
    pending: Option<(Kind, String)>,
    deadline: Option<Instant>,
    ready: VecDeque<Message>,
    finished: bool,
}

impl Batcher {
    fn flush(&mut self) {
        self.deadline = None;
        if let Some((kind, body)) = self.pending.take() {
            if !body.is_empty() {
                self.ready.push_back(Message::new(kind, body));
            }
        }
    }

    fn push(&mut self, msg: Message) {
        match &mut self.pending {
            Some((kind, body)) if *kind == msg.kind => body.push_str(&msg.body),
            _ => {
                self.flush();
                self.deadline = Some(Instant::now() + self.window);
                self.pending = Some((msg.kind, msg.body));
            }
        }
    }

    async fn next_batch(&mut self) -> Option<Message> {
        loop {
            if let Some(msg) = self.ready.pop_front() {
                return Some(msg);
            }
            if self.finished {
                return None;
            }

            let step = match self.deadline {
                Some(deadline) => tokio::select! {
                    next = self.upstream.next() => Step::Event(next),
                    () = time::sleep_until(deadline) => Step::Expired,
                },
                None => Step::Event(self.upstream.next().await),
            };

            match step {
                Step::Expired => self.flush(),
                Step::Event(None) => {
                    self.flush();
                    self.finished = true;
                }
                Step::Event(Some(msg)) if msg.kind == Kind::End => {
                    self.flush();
                    self.ready.push_back(msg);
                    self.finished = true;
                }
                Step::Event(Some(msg)) => self.push(msg),
            }
        }
    }
}

/// Coalesce consecutive same-kind events.
///
/// A run is flushed when the kind changes, when `window` has elapsed since its
/// first event, or when the upstream closes. `end` flushes, is forwarded, and
/// closes the stream.
pub fn batch<S>(upstream: S, window: Duration) -> impl Stream<Item = Message> + Send
where
    S: Stream<Item = Message> + Send + 'static,
{
    let batcher = Batcher {
        upstream: upstream.boxed(),
        window,
        pending: None,
        deadline: None,
        ready: VecDeque::new(),
        finished: false,
    };
    stream::unfold(batcher, |mut batcher| async move {
        let msg = batcher.next_batch().await?;
        Some((msg, batcher))
    })
}
