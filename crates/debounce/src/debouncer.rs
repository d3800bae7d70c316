use crate::state::{DebouncePhase, DebounceState};
use log::{debug, trace};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    pub quiet_period: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(300),
        }
    }
}

impl DebounceConfig {
    pub const fn from_millis(ms: u64) -> Self {
        Self {
            quiet_period: Duration::from_millis(ms),
        }
    }
}

/// Async latest-wins debouncer.
///
/// The initial value is available immediately through [`Debouncer::current`]
/// and every subscriber. Each [`Debouncer::push`] restarts the quiet period;
/// only the value that survives a full quiet period is published.
/// [`Debouncer::replace`] publishes at once and discards whatever was pending.
///
/// Dropping the last handle (or calling [`Debouncer::shutdown`]) aborts the
/// driver task, so a pending timer never fires afterwards.
pub struct Debouncer<T> {
    inner: Arc<DebouncerInner<T>>,
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct DebouncerInner<T> {
    command_tx: mpsc::UnboundedSender<DebounceCommand<T>>,
    output_rx: watch::Receiver<T>,
    publisher: Arc<Publisher<T>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

enum DebounceCommand<T> {
    Input {
        value: T,
        at: Instant,
        generation: u64,
    },
    /// Drop a pending input pushed before generation `before`.
    Cancel { before: u64 },
    Shutdown,
}

/// Output side shared by the handle and the driver task.
///
/// Every [`Debouncer::replace`] starts a new generation; inputs pushed in an
/// older generation are never published.
struct Publisher<T> {
    state: Mutex<PublishState<T>>,
    emissions: AtomicU64,
}

struct PublishState<T> {
    generation: u64,
    output_tx: Option<watch::Sender<T>>,
}

impl<T> Publisher<T> {
    fn lock(&self) -> MutexGuard<'_, PublishState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn publish(&self, generation: u64, value: T) {
        let state = self.lock();
        if state.generation != generation {
            trace!("debounced value from generation {generation} dropped");
            return;
        }
        if let Some(output_tx) = &state.output_tx {
            self.emissions.fetch_add(1, Ordering::AcqRel);
            output_tx.send_replace(value);
        }
    }

    /// Returns the new generation, or `None` once closed.
    fn replace(&self, value: T) -> Option<u64> {
        let mut state = self.lock();
        let output_tx = state.output_tx.as_ref()?;
        self.emissions.fetch_add(1, Ordering::AcqRel);
        output_tx.send_replace(value);
        state.generation += 1;
        Some(state.generation)
    }

    fn close(&self) {
        self.lock().output_tx = None;
    }
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawn the driver task on the current tokio runtime.
    pub fn start(initial: T, config: DebounceConfig) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = watch::channel(initial);
        let publisher = Arc::new(Publisher {
            state: Mutex::new(PublishState {
                generation: 0,
                output_tx: Some(output_tx),
            }),
            emissions: AtomicU64::new(0),
        });

        let task = tokio::spawn(run_debounce_loop(config, command_rx, publisher.clone()));

        Self {
            inner: Arc::new(DebouncerInner {
                command_tx,
                output_rx,
                publisher,
                task: Mutex::new(Some(task)),
            }),
        }
    }

    /// Feed a new input. The quiet period restarts from now.
    ///
    /// Inputs after shutdown are ignored.
    pub fn push(&self, value: T) {
        let command = DebounceCommand::Input {
            value,
            at: Instant::now(),
            generation: self.inner.publisher.generation(),
        };
        if self.inner.command_tx.send(command).is_err() {
            trace!("debouncer input ignored after shutdown");
        }
    }

    /// Publish `value` now. Any input still inside its quiet period is
    /// discarded and will not be published later.
    ///
    /// Ignored after shutdown.
    pub fn replace(&self, value: T) {
        let Some(before) = self.inner.publisher.replace(value) else {
            trace!("debouncer replace ignored after shutdown");
            return;
        };
        let _ = self.inner.command_tx.send(DebounceCommand::Cancel { before });
    }

    /// Most recently settled value (the initial value until the first emission).
    #[must_use]
    pub fn current(&self) -> T {
        self.inner.output_rx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.output_rx.clone()
    }

    /// Number of published values, not counting the initial value.
    #[must_use]
    pub fn emissions(&self) -> u64 {
        self.inner.publisher.emissions.load(Ordering::Acquire)
    }

    /// Cancel any pending value and stop the driver task.
    pub fn shutdown(&self) {
        let _ = self.inner.command_tx.send(DebounceCommand::Shutdown);
        self.inner.stop();
    }
}

impl<T> DebouncerInner<T> {
    fn stop(&self) {
        self.publisher.close();
        let mut guard = match self.task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(task) = guard.take() {
            task.abort();
        }
    }
}

impl<T> Drop for DebouncerInner<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_debounce_loop<T>(
    config: DebounceConfig,
    mut command_rx: mpsc::UnboundedReceiver<DebounceCommand<T>>,
    publisher: Arc<Publisher<T>>,
) where
    T: Send + Sync + 'static,
{
    let mut state = DebounceState::new(config.quiet_period);
    let emit = |(generation, value): (u64, T)| publisher.publish(generation, value);

    loop {
        let next_deadline = state.next_deadline();

        tokio::select! {
            command = command_rx.recv() => match command {
                Some(DebounceCommand::Input { value, at, generation }) => {
                    if let Some(settled) = state.input((generation, value), at) {
                        emit(settled);
                    }
                }
                Some(DebounceCommand::Cancel { before }) => {
                    let stale = matches!(
                        state.phase(),
                        DebouncePhase::Pending { value: (generation, _), .. } if *generation < before
                    );
                    if stale && state.cancel().is_some() {
                        debug!("pending debounced value replaced");
                    }
                }
                Some(DebounceCommand::Shutdown) | None => {
                    if state.cancel().is_some() {
                        debug!("debouncer shut down with a pending value; dropped");
                    }
                    break;
                }
            },
            () = async {
                if let Some(deadline) = next_deadline {
                    time::sleep_until(deadline).await;
                }
            }, if next_deadline.is_some() => {
                if let Some(settled) = state.poll(Instant::now()) {
                    emit(settled);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn initial_value_is_available_immediately() {
        let debouncer = Debouncer::start("initial", DebounceConfig::from_millis(300));
        assert_eq!(debouncer.current(), "initial");
        assert_eq!(debouncer.emissions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn value_changes_only_after_quiet_period() {
        let debouncer = Debouncer::start("initial", DebounceConfig::from_millis(300));
        let mut rx = debouncer.subscribe();

        let start = Instant::now();
        debouncer.push("updated");
        assert_eq!(debouncer.current(), "initial");

        rx.changed().await.expect("debouncer alive");
        assert_eq!(*rx.borrow(), "updated");
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn respects_longer_quiet_period() {
        let debouncer = Debouncer::start("initial", DebounceConfig::from_millis(500));
        let mut rx = debouncer.subscribe();

        debouncer.push("updated");
        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(debouncer.current(), "initial");

        rx.changed().await.expect("debouncer alive");
        assert_eq!(debouncer.current(), "updated");
    }

    #[tokio::test(start_paused = true)]
    async fn non_string_payloads() {
        let debouncer = Debouncer::start(0_u32, DebounceConfig::default());
        let mut rx = debouncer.subscribe();
        assert_eq!(debouncer.current(), 0);

        debouncer.push(42);
        rx.changed().await.expect("debouncer alive");
        assert_eq!(debouncer.current(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn shared_payloads_keep_identity() {
        let first = Arc::new(vec!["John".to_string()]);
        let second = Arc::new(vec!["Jane".to_string()]);

        let debouncer = Debouncer::start(first.clone(), DebounceConfig::default());
        assert!(Arc::ptr_eq(&debouncer.current(), &first));

        let mut rx = debouncer.subscribe();
        debouncer.push(second.clone());
        rx.changed().await.expect("debouncer alive");
        assert!(Arc::ptr_eq(&debouncer.current(), &second));
    }
}
