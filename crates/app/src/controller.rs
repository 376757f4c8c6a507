//! Animation lifecycle state machine.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use blastoff_core::{DriverError, DriverFactory, OperationError, StripConfig, StripDriver};

use crate::{lock, AnimationEngine, StateObserver, RENDER_FAILURE_EXIT_CODE};

/// Callback invoked when the strip fails in the middle of the animation.
pub type RenderFailureHandler = Arc<dyn Fn(DriverError) + Send + Sync>;

/// Returns a render failure handler that terminates the whole process.
///
/// The state of a strip that failed mid-frame is unknown, so the service gives up and
/// leaves the restart to the process supervisor.
pub fn abort_process() -> RenderFailureHandler {
    Arc::new(exit_on_render_failure)
}

fn exit_on_render_failure(err: DriverError) {
    log::error!("LED strip failed during the animation, terminating: {err}");
    std::process::exit(RENDER_FAILURE_EXIT_CODE);
}

/// Animation lifecycle state.
///
/// The running state owns the only engine instance, so there is never an engine while
/// the animation is stopped.
pub enum LifecycleState<D: StripDriver> {
    Stopped,
    Running(AnimationEngine<D>),
}

impl<D: StripDriver> LifecycleState<D> {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

/// Serializes start, stop and status requests from any number of callers.
///
/// Each transition holds the state lock for its whole duration, including the driver
/// initialization and teardown, while the render loop itself runs outside of it.
pub struct Controller<F: DriverFactory> {
    factory: F,
    config: StripConfig,
    state: Mutex<LifecycleState<F::Driver>>,
    /// Set by `shutdown`, only accessed with the state lock held.
    closed: AtomicBool,
    observer: Box<dyn StateObserver>,
    on_render_failure: RenderFailureHandler,
}

impl<F: DriverFactory> Controller<F> {
    /// Creates a stopped controller.
    ///
    /// By default nobody is notified about the state changes and a render failure
    /// terminates the process.
    pub fn new(factory: F, config: StripConfig) -> Self {
        Self {
            factory,
            config,
            state: Mutex::new(LifecycleState::Stopped),
            closed: AtomicBool::new(false),
            observer: Box::new(()),
            on_render_failure: abort_process(),
        }
    }

    /// Sets the state change observer.
    #[must_use]
    pub fn with_observer(mut self, observer: impl StateObserver) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Sets the render failure policy.
    #[must_use]
    pub fn with_render_failure_handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(DriverError) + Send + Sync + 'static,
    {
        self.on_render_failure = Arc::new(handler);
        self
    }

    pub fn config(&self) -> StripConfig {
        self.config
    }

    /// Starts the animation, does nothing if it is already running.
    pub fn start(&self) -> Result<(), OperationError> {
        let mut state = lock(&self.state);
        if self.closed.load(Ordering::Relaxed) {
            log::warn!("Start called after the controller has been shut down.");
            return Err(OperationError::Closed);
        }
        if state.is_running() {
            log::trace!("Start called but animation already running.");
            return Ok(());
        }

        let mut engine = AnimationEngine::create(&self.factory, self.config).map_err(|err| {
            log::error!("Cannot initialize LED strip driver: {err}");
            OperationError::Start(err)
        })?;
        engine.setup().map_err(|err| {
            log::error!("Cannot set up animation engine: {err}");
            OperationError::Start(err)
        })?;
        engine
            .run(self.on_render_failure.clone())
            .map_err(OperationError::Start)?;

        *state = LifecycleState::Running(engine);
        log::info!("Animation started");
        self.observer.state_changed(true);
        Ok(())
    }

    /// Stops the animation and blanks the strip, does nothing if it is already stopped.
    ///
    /// If the strip cannot be blanked the animation stays in the running state, so the
    /// caller may retry.
    pub fn stop(&self) -> Result<(), OperationError> {
        let mut state = lock(&self.state);
        self.stop_locked(&mut state)
    }

    /// Stops the animation and refuses any further start requests.
    ///
    /// Every start request served after this call fails with [`OperationError::Closed`],
    /// so the strip stays blank once this call succeeds.
    pub fn shutdown(&self) -> Result<(), OperationError> {
        let mut state = lock(&self.state);
        self.closed.store(true, Ordering::Relaxed);
        log::debug!("Shutting down the animation controller");
        self.stop_locked(&mut state)
    }

    fn stop_locked(&self, state: &mut LifecycleState<F::Driver>) -> Result<(), OperationError> {
        let LifecycleState::Running(engine) = state else {
            log::trace!("Stop called but animation is not running.");
            return Ok(());
        };

        engine.stop().map_err(|err| {
            log::error!("Error when cleaning up the animation: {err}");
            OperationError::Stop(err)
        })?;

        *state = LifecycleState::Stopped;
        log::info!("Animation stopped");
        self.observer.state_changed(false);
        Ok(())
    }

    /// Returns true if the animation is running.
    pub fn is_started(&self) -> bool {
        lock(&self.state).is_running()
    }
}
