//! A process-wide model hosted by a background thread.
//!
//! The model only exists inside a compilation run, so the bootstrap starts a
//! run that does no real compiling, takes the model when the run hands it to
//! its listener, and keeps the listener parked until the runtime is closed.

use std::{
    fmt,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use log::{debug, info, warn};
use mirra_model::{
    SharedModel,
    compiler::{Compilation, CompileOptions},
};
use parking_lot::{Condvar, Mutex};
use tokio::sync::oneshot;

use crate::{
    config::RuntimeConfig,
    domain::{Domain, ModelDomain},
    error::{LangError, LangResult},
};

static RUNTIME: LazyLock<Runtime> = LazyLock::new(|| Runtime::new(RuntimeConfig::default()));

/// The process-wide runtime model, started on first use.
pub fn get() -> LangResult<RuntimeHandle> {
    RUNTIME.get()
}

/// Discards the process-wide runtime model. The next [`get`] starts over.
pub fn close() {
    RUNTIME.close()
}

/// A live model published by one initialization of a [`Runtime`].
///
/// A handle stays usable after the runtime that published it is closed.
#[derive(Clone)]
pub struct RuntimeHandle {
    generation: u64,
    domain: Arc<ModelDomain>,
}

impl RuntimeHandle {
    /// The initialization cycle this handle came from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn domain(&self) -> Arc<dyn Domain> {
        self.domain.clone()
    }

    pub fn model(&self) -> &SharedModel {
        self.domain.model()
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("generation", &self.generation)
            .field("domain", &self.domain)
            .finish()
    }
}

/// Single-flight supplier of a runtime model.
pub struct Runtime {
    config: RuntimeConfig,
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<State>,
    ready: Condvar,
    generation: AtomicU64,
}

enum State {
    Uninitialized,
    Initializing { generation: u64, worker: Worker },
    Ready { handle: RuntimeHandle, worker: Worker },
    /// Kept until the runtime is closed.
    Failed {
        generation: u64,
        error: LangError,
        worker: Worker,
    },
}

#[derive(Default)]
struct Worker {
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    /// Releases the parked task and waits for its thread to finish.
    fn stop(mut self) {
        drop(self.shutdown.take());
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("runtime task panicked");
        }
    }
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(State::Uninitialized),
                ready: Condvar::new(),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The most recently started initialization cycle, 0 before the first.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    /// Returns the published model, starting the background task if no
    /// initialization is in flight. Callers arriving while one is in flight
    /// wait for its outcome.
    pub fn get(&self) -> LangResult<RuntimeHandle> {
        let timeout = self.config.init_timeout();
        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        let mut state = self.shared.state.lock();
        loop {
            match &*state {
                State::Ready { handle, .. } => return Ok(handle.clone()),
                State::Failed { error, .. } => return Err(error.clone()),
                State::Uninitialized => {
                    let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
                    let worker = self.launch(generation)?;
                    *state = State::Initializing { generation, worker };
                }
                State::Initializing { .. } => match (deadline, timeout) {
                    (Some(deadline), Some(timeout)) => {
                        if self.shared.ready.wait_until(&mut state, deadline).timed_out()
                            && matches!(*state, State::Initializing { .. })
                        {
                            return Err(LangError::Timeout(timeout));
                        }
                    }
                    _ => self.shared.ready.wait(&mut state),
                },
            }
        }
    }

    /// Discards the published model or pending initialization and lets the
    /// background task finish.
    pub fn close(&self) {
        let previous = std::mem::replace(&mut *self.shared.state.lock(), State::Uninitialized);
        self.shared.ready.notify_all();

        let worker = match previous {
            State::Uninitialized => return,
            State::Initializing { generation, worker } | State::Failed { generation, worker, .. } => {
                info!("closing runtime model generation {generation}");
                worker
            }
            State::Ready { handle, worker } => {
                info!("closing runtime model generation {}", handle.generation);
                worker
            }
        };
        worker.stop();
    }

    fn launch(&self, generation: u64) -> LangResult<Worker> {
        info!("starting runtime model generation {generation}");
        let (shutdown, parked) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        let options = self.config.compile.clone();

        let thread = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || host(&shared, generation, options, parked))
            .map_err(|err| LangError::TaskExited(err.to_string()))?;

        Ok(Worker {
            shutdown: Some(shutdown),
            thread: Some(thread),
        })
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("generation", &self.generation())
            .finish()
    }
}

/// Body of the background thread.
fn host(shared: &Shared, generation: u64, options: CompileOptions, parked: oneshot::Receiver<()>) {
    let mut guard = PublishGuard {
        shared,
        generation,
        published: false,
    };
    let mut parked = Some(parked);

    let result = Compilation::new(options).run(&mut |model: &SharedModel| {
        let domain = Arc::new(ModelDomain::runtime(model.clone()));
        guard.publish(Ok(RuntimeHandle { generation, domain }));
        if let Some(parked) = parked.take() {
            // Returns once `close` drops the sender.
            let _ = parked.blocking_recv();
        }
    });

    match result {
        Ok(summary) => debug!(
            "runtime model generation {generation} released after entering {} types",
            summary.entered
        ),
        Err(error) => guard.publish(Err(LangError::Initialization(Arc::new(error)))),
    }
}

/// Publishes the outcome of one generation exactly once. Dropped without
/// publishing, it reports that the task exited.
struct PublishGuard<'a> {
    shared: &'a Shared,
    generation: u64,
    published: bool,
}

impl PublishGuard<'_> {
    fn publish(&mut self, result: LangResult<RuntimeHandle>) {
        if self.published {
            return;
        }
        self.published = true;

        let mut state = self.shared.state.lock();
        *state = match std::mem::replace(&mut *state, State::Uninitialized) {
            State::Initializing { generation, worker } if generation == self.generation => {
                match result {
                    Ok(handle) => {
                        info!("runtime model generation {generation} ready");
                        State::Ready { handle, worker }
                    }
                    Err(error) => {
                        warn!("runtime model generation {generation} failed: {error}");
                        State::Failed {
                            generation,
                            error,
                            worker,
                        }
                    }
                }
            }
            current => {
                warn!(
                    "discarding outcome of stale runtime model generation {}",
                    self.generation
                );
                current
            }
        };
        drop(state);
        self.shared.ready.notify_all();
    }
}

impl Drop for PublishGuard<'_> {
    fn drop(&mut self) {
        if !self.published {
            self.publish(Err(LangError::TaskExited(format!(
                "generation {} ended without a model",
                self.generation
            ))));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mirra_model::{decl::{CompilationUnit, TypeDecl}, error::CompileError};

    use super::*;
    use crate::test::element;

    fn runtime() -> Arc<Runtime> {
        Arc::new(Runtime::new(RuntimeConfig::default()))
    }

    #[test]
    fn concurrent_callers_share_one_initialization() {
        let runtime = runtime();
        let handles: Vec<RuntimeHandle> = (0..8)
            .map(|_| {
                let runtime = Arc::clone(&runtime);
                thread::spawn(move || runtime.get())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|thread| thread.join().unwrap().unwrap())
            .collect();

        assert_eq!(runtime.generation(), 1);
        for handle in &handles {
            assert_eq!(handle.generation(), 1);
            assert!(handle.domain().same(&*handles[0].domain()));
        }
        runtime.close();
    }

    #[test]
    fn close_restarts_the_sequence() {
        let runtime = runtime();
        let first = runtime.get().unwrap();
        assert_eq!(runtime.get().unwrap().generation(), first.generation());

        runtime.close();
        let second = runtime.get().unwrap();

        assert_eq!(second.generation(), first.generation() + 1);
        assert!(!second.domain().same(&*first.domain()));
        // A stale handle keeps its model.
        let string = element(&first.domain(), "lang.String");
        assert_eq!(string.qualified_name(), "lang.String");
        runtime.close();
        runtime.close();
    }

    #[test]
    fn published_domains_are_describable() {
        let runtime = runtime();
        let domain = runtime.get().unwrap().domain();

        assert!(domain.describe().is_some());
        assert!(domain.type_element("util.List").is_some());
    }

    #[test]
    fn failures_are_kept_until_close() {
        let mut config = RuntimeConfig::default();
        config.compile.units = vec![
            CompilationUnit::new("app").with(TypeDecl::class("A")),
            CompilationUnit::new("app").with(TypeDecl::class("A")),
        ];
        let runtime = Runtime::new(config);

        let Err(LangError::Initialization(error)) = runtime.get() else {
            panic!("expected an initialization failure");
        };
        assert!(matches!(&*error, CompileError::Enter { .. }));
        assert!(matches!(runtime.get(), Err(LangError::Initialization(_))));
        assert_eq!(runtime.generation(), 1);

        runtime.close();
        assert!(runtime.get().is_err());
        assert_eq!(runtime.generation(), 2);
    }

    #[test]
    fn waiting_callers_time_out() {
        let runtime = Runtime::new(RuntimeConfig {
            init_timeout_ms: Some(20),
            ..RuntimeConfig::default()
        });
        *runtime.shared.state.lock() = State::Initializing {
            generation: 1,
            worker: Worker::default(),
        };

        assert!(matches!(
            runtime.get(),
            Err(LangError::Timeout(timeout)) if timeout == Duration::from_millis(20)
        ));
        runtime.close();
    }

    #[test]
    fn a_task_that_exits_silently_fails_its_generation() {
        let runtime = Runtime::new(RuntimeConfig::default());
        *runtime.shared.state.lock() = State::Initializing {
            generation: 3,
            worker: Worker::default(),
        };

        drop(PublishGuard {
            shared: &runtime.shared,
            generation: 3,
            published: false,
        });

        assert!(matches!(runtime.get(), Err(LangError::TaskExited(_))));
    }

    #[test]
    fn stale_outcomes_are_discarded() {
        let runtime = Runtime::new(RuntimeConfig::default());
        *runtime.shared.state.lock() = State::Initializing {
            generation: 2,
            worker: Worker::default(),
        };

        PublishGuard {
            shared: &runtime.shared,
            generation: 1,
            published: false,
        }
        .publish(Err(LangError::invalid("late")));

        assert!(matches!(
            &*runtime.shared.state.lock(),
            State::Initializing { generation: 2, .. }
        ));
        runtime.close();
    }
}
