use std::collections::VecDeque;

use crate::*;

/// An animation-bearing event waiting for its turn in the queue.
#[derive(Clone, Debug, PartialEq)]
pub enum QueuedJob {
    Processed(ProcessedAction),
    Callback(ActionCallback),
}

impl QueuedJob {
    pub fn label(&self) -> String {
        match self {
            Self::Processed(event) => format!("processed {:?}", event.action.kind),
            Self::Callback(callback) => format!("callback #{}", callback.id),
        }
    }

    /// Builds the animation against the board rendered right now.
    pub fn animation(&self, rendered: &Board, timings: &AnimationTimings) -> Result<Animation> {
        match self {
            Self::Processed(event) => Animation::for_action(&event.action, rendered, timings),
            Self::Callback(callback) => Ok(Animation::for_callback(callback, timings)),
        }
    }

    pub fn context(&self) -> &GameContext {
        match self {
            Self::Processed(event) => &event.updated_context,
            Self::Callback(callback) => &callback.updated_context,
        }
    }
}

/// What the queue drives while draining.
pub trait DrainTarget {
    fn animation_for(&self, job: &QueuedJob) -> Result<Animation>;

    fn apply_effect(&mut self, effect: &Effect) -> Result<()>;

    /// Reconciles the board once the job's animation completed. `arrival` is the stamp the job was enqueued with.
    fn settle(&mut self, job: QueuedJob, arrival: Arrival);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DrainPoll {
    /// Nothing queued and no drain in progress.
    Idle,
    /// The in-flight job waits on a delay until the given time.
    Sleeping(Millis),
    /// The queue just ran empty, reported once per drain cycle.
    Drained,
}

#[derive(Debug)]
struct InFlight {
    job: QueuedJob,
    arrival: Arrival,
    player: AnimationPlayer,
}

/// FIFO of animation jobs with a single consumer: one job animates at a time, in arrival order.
#[derive(Debug, Default)]
pub struct ActionQueue {
    pending: VecDeque<(Arrival, QueuedJob)>,
    in_flight: Option<InFlight>,
    draining: bool,
    cancel: CancelToken,
    completed: u64,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job. Returns true when this starts a new drain cycle.
    pub fn enqueue(&mut self, job: QueuedJob, arrival: Arrival) -> bool {
        log::debug!("enqueue {} ({} pending)", job.label(), self.pending.len());
        self.pending.push_back((arrival, job));
        if self.draining {
            false
        } else {
            self.draining = true;
            true
        }
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Jobs animated and settled since creation.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Marks the consumer as gone. Running delays still elapse but nothing reaches the target anymore.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.in_flight
            .as_ref()
            .map(|in_flight| in_flight.player.resume_at())
    }

    /// Advances the drain up to `now`.
    ///
    /// Finished jobs are settled in order and the next one starts within the same call, so a run of zero-delay jobs
    /// drains at once.
    pub fn poll<T: DrainTarget>(&mut self, now: Millis, target: &mut T) -> DrainPoll {
        loop {
            if self.in_flight.is_none() {
                let Some((arrival, job)) = self.pending.pop_front() else {
                    return self.finish_drain();
                };
                self.in_flight = Some(self.start(job, arrival, now, target));
            }

            let Some(in_flight) = self.in_flight.as_mut() else {
                continue;
            };

            match in_flight
                .player
                .poll(now, |effect| target.apply_effect(effect))
            {
                PlayerPoll::Sleeping(deadline) => return DrainPoll::Sleeping(deadline),
                PlayerPoll::Finished => {
                    if let Some(InFlight { job, arrival, .. }) = self.in_flight.take() {
                        self.completed += 1;
                        if self.cancel.is_cancelled() {
                            log::debug!("dropping settle of {} after cancel", job.label());
                        } else {
                            log::trace!("settle {}", job.label());
                            target.settle(job, arrival);
                        }
                    }
                }
            }
        }
    }

    fn start<T: DrainTarget>(&self, job: QueuedJob, arrival: Arrival, now: Millis, target: &T) -> InFlight {
        let animation = target.animation_for(&job).unwrap_or_else(|err| {
            log::error!("could not animate {}: {}", job.label(), err);
            Animation::empty()
        });
        log::trace!("animate {} ({} ms)", job.label(), animation.total_delay());
        InFlight {
            player: AnimationPlayer::start(animation, now, self.cancel.clone()),
            job,
            arrival,
        }
    }

    fn finish_drain(&mut self) -> DrainPoll {
        if std::mem::take(&mut self.draining) {
            log::debug!("animation finished");
            DrainPoll::Drained
        } else {
            DrainPoll::Idle
        }
    }
}
