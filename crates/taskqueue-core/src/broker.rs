//! The central *Broker* value: owns every piece of broker state and is
//! passed explicitly into HTTP handlers rather than reached through
//! process-wide globals.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use taskqueue_shared::config::BrokerConfig;
use taskqueue_shared::errors::RegistryError;
use taskqueue_shared::mail::{Email, MailGateway};
use taskqueue_shared::registry::ModelRegistry;
use taskqueue_shared::task::Task;
use taskqueue_shared::templates::{ConfirmContext, TemplateRenderer};
use tracing::{info, warn};

use crate::confirmation_map::ConfirmationMap;
use crate::errors::{BadId, ConfirmOutcome};
use crate::id_allocator::IdAllocator;
use crate::previously_confirmed::PreviouslyConfirmed;
use crate::task_queue::TaskQueue;

/// What a worker gets back from a poll.
#[derive(Debug)]
pub enum PollOutcome {
    Task(Task),
    EmptyQueue,
}

/// Where the retry budget's boundary falls for a given trigger path.
///
/// A worker-reported failure (`worker_failed_task`) retires a task as soon
/// as `failureCount` *reaches* `maxJobFailures`; the expiry loop's timeout
/// hit only retires once `failureCount` *exceeds* it. The two paths are
/// otherwise identical, hence sharing `retire_or_recycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetireThreshold {
    AtLeast,
    Exceeds,
}

/// Owns every piece of broker state and exposes one method per HTTP
/// endpoint's business logic; handlers are thin, stateless wrappers over
/// this.
pub struct Broker {
    id_allocator: IdAllocator,
    confirmation_map: ConfirmationMap,
    task_queue: TaskQueue,
    previously_confirmed: PreviouslyConfirmed,
    registry: Arc<dyn ModelRegistry>,
    mail: Arc<dyn MailGateway>,
    renderer: Arc<TemplateRenderer>,
    config: BrokerConfig,
    last_worker_checkin_at: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Broker {
    pub fn new(
        config: BrokerConfig,
        registry: Arc<dyn ModelRegistry>,
        mail: Arc<dyn MailGateway>,
        renderer: Arc<TemplateRenderer>,
    ) -> Self {
        let previously_confirmed = PreviouslyConfirmed::new(config.previously_confirmed_capacity);
        Self {
            id_allocator: IdAllocator::new(),
            confirmation_map: ConfirmationMap::new(),
            task_queue: TaskQueue::new(),
            previously_confirmed,
            registry,
            mail,
            renderer,
            config,
            last_worker_checkin_at: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    // ---- front-end / client endpoints ----------------------------------

    /// `POST /client_model_create`: decode the submitted payload, assign a
    /// task id, stash it pending confirmation, and queue a confirmation
    /// email. Returns the encoded task dict and the confirmation code.
    pub fn submit(&self, raw: &serde_json::Value) -> Result<(serde_json::Value, String), RegistryError> {
        let payload = self.registry.decode(raw)?;
        let id = self.id_allocator.next();
        let task = Task::new(id, payload);
        let encoded = task.encode();

        let code = self.confirmation_map.put(task.clone(), self.config.confirm_timeout());

        let (subject, body) = self.renderer.render_confirm(&ConfirmContext {
            code: code.clone(),
            task_id: id,
            email_address: encoded["emailAddress"].as_str().unwrap_or_default().to_string(),
            expire_seconds: self.config.confirm_timeout_secs,
        });
        info!(task_id = id, %code, "generated confirmation request");
        self.mail.send(Email::new(task.email_address(), subject, body));

        Ok((encoded, code))
    }

    /// `GET /client_queue_has_workers`: true iff some worker endpoint has
    /// been touched within the configured keep-alive timeout.
    pub fn has_workers(&self) -> bool {
        let guard = self.last_worker_checkin_at.lock().unwrap_or_else(|e| e.into_inner());
        match *guard {
            Some(at) => at.elapsed() < self.config.keep_alive_timeout(),
            None => false,
        }
    }

    /// `GET /client_confirm/{code}`: move a pending request from the
    /// confirmation map into the ready queue.
    pub fn confirm(&self, code: &str) -> ConfirmOutcome {
        // Sweep first so the miss path below sees a near-up-to-date picture.
        self.confirmation_map.sweep();

        match self.confirmation_map.take(code) {
            Some(task) => {
                self.previously_confirmed.mark(code);
                info!(task_id = task.id, "confirmation redeemed");
                self.task_queue.enqueue_ready(task);
                ConfirmOutcome::Confirmed
            }
            None if self.previously_confirmed.contains(code) => ConfirmOutcome::AlreadyConfirmed,
            None => ConfirmOutcome::NotFound,
        }
    }

    // ---- worker endpoints -------------------------------------------------

    pub fn touch_worker_checkin(&self) {
        *self.last_worker_checkin_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
    }

    /// `GET /worker_work_task`: hand the caller the head of the ready queue.
    pub fn poll(&self) -> PollOutcome {
        self.touch_worker_checkin();
        match self.task_queue.poll() {
            Some(task) => {
                info!(task_id = task.id, "task handed to worker");
                PollOutcome::Task(task)
            }
            None => PollOutcome::EmptyQueue,
        }
    }

    /// `GET /worker_keep_alive_task/{id}`: refresh a processing task's
    /// liveness clock.
    pub fn heartbeat(&self, id: u64) -> Result<(), BadId> {
        self.touch_worker_checkin();
        self.task_queue.touch_processing(id).map_err(|_| BadId(id))
    }

    /// `GET /worker_has_task/{id}`.
    pub fn has_task(&self, id: u64) -> bool {
        self.touch_worker_checkin();
        self.task_queue.has_processing(id)
    }

    /// `GET /worker_succeed_task/{id}`: the task is done; drop it entirely.
    pub fn succeed(&self, id: u64) -> Result<(), BadId> {
        self.touch_worker_checkin();
        self.task_queue.pull_processing(id).map(|task| {
            info!(task_id = task.id, "task succeeded");
        }).map_err(|_| BadId(id))
    }

    /// `GET /worker_failed_task/{id}`: increment the failure count, then
    /// either recycle with a new id or escalate to a failure email. Unlike
    /// the expiry loop, a worker-reported failure retires the task as soon
    /// as `failureCount` *reaches* `maxJobFailures`, not only once it
    /// exceeds it.
    pub fn fail(&self, id: u64) -> Result<(), BadId> {
        self.touch_worker_checkin();
        let task = self.task_queue.pull_processing(id).map_err(|_| BadId(id))?;
        warn!(task_id = task.id, failure_count = task.failure_count + 1, "worker reported failure");
        self.retire_or_recycle(task, task.failure_count + 1, RetireThreshold::AtLeast);
        Ok(())
    }

    // ---- internal: shared retire/recycle policy ---------------------------

    /// Either send the failure email and drop the task, or assign it a
    /// fresh id and re-enqueue it as ready. Used by both `fail` and the
    /// expiry loop, which differ only in where the retry budget's boundary
    /// falls: a worker-reported failure retires at `failureCount >=
    /// maxJobFailures`, an expiry hit only once `failureCount >
    /// maxJobFailures`.
    pub(crate) fn retire_or_recycle(&self, task: Task, failure_count: u32, threshold: RetireThreshold) {
        let exhausted = match threshold {
            RetireThreshold::AtLeast => failure_count >= self.config.max_job_failures,
            RetireThreshold::Exceeds => failure_count > self.config.max_job_failures,
        };
        if exhausted {
            warn!(task_id = task.id, failure_count, "exhausted retry budget, sending failure email");
            self.mail.send(task.failure_email(failure_count));
        } else {
            let new_id = self.id_allocator.next();
            let recycled = task.recycled_with_id(new_id, failure_count);
            info!(old_task_id = task.id, new_task_id = new_id, failure_count, "recycling task into ready queue");
            self.task_queue.enqueue_ready(recycled);
        }
    }

    pub(crate) fn pull_stale_processing(&self, cutoff: std::time::SystemTime) -> Vec<Task> {
        self.task_queue.pull_stale_processing(cutoff)
    }

    pub(crate) fn sweep_confirmations(&self) {
        self.confirmation_map.sweep();
    }

    pub(crate) fn keep_alive_timeout(&self) -> Duration {
        self.config.keep_alive_timeout()
    }
}
