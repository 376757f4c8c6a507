use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Single-fire cancellation signal shared between an engine and its render loop.
///
/// Once fired the token stays fired, there is no way to reset it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal.
    ///
    /// Returns `true` if this call fired it and `false` if it was already fired.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    /// Non-blocking check of the signal state.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_one_shot() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());

        assert!(token.cancel());
        assert!(observer.is_cancelled());
        // Firing an already fired token does nothing.
        assert!(!token.cancel());
        assert!(!observer.cancel());
        assert!(token.is_cancelled());
    }
}
