use std::sync::Arc;

/// Receives lifecycle state change notifications.
///
/// The controller invokes observers while holding its state lock, so notifications
/// arrive in the same order as the transitions. Implementations must not call back
/// into the controller.
pub trait StateObserver: Send + Sync + 'static {
    fn state_changed(&self, running: bool);
}

impl StateObserver for () {
    fn state_changed(&self, _running: bool) {}
}

impl<T: ?Sized + StateObserver> StateObserver for Arc<T> {
    fn state_changed(&self, running: bool) {
        T::state_changed(self, running);
    }
}

impl<T: ?Sized + StateObserver> StateObserver for Box<T> {
    fn state_changed(&self, running: bool) {
        T::state_changed(self, running);
    }
}
