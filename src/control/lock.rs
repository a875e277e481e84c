//! One-way arming latch.

use tracing::info;

/// Latches once the craft has been armed and stays latched until reboot.
///
/// There is no way to clear it.
///
/// # Examples
///
/// ```
/// use vtx_control::control::lock::ArmingLock;
///
/// let mut lock = ArmingLock::new();
/// assert!(!lock.observe(false));
/// assert!(lock.observe(true));
/// assert!(lock.observe(false)); // disarming does not unlock
/// ```
#[derive(Debug, Default)]
pub struct ArmingLock {
    locked: bool,
}

impl ArmingLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the current arming state and returns whether changes are locked.
    ///
    /// An armed observation locks immediately, including for the caller.
    pub fn observe(&mut self, armed: bool) -> bool {
        if armed && !self.locked {
            self.locked = true;
            info!("Craft armed, VTX changes locked until reboot");
        }
        self.locked
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unlocked() {
        let lock = ArmingLock::new();
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_disarmed_never_locks() {
        let mut lock = ArmingLock::new();
        for _ in 0..100 {
            assert!(!lock.observe(false));
        }
    }

    #[test]
    fn test_lock_is_monotonic() {
        let mut lock = ArmingLock::new();
        lock.observe(true);
        for armed in [false, true, false, false] {
            assert!(lock.observe(armed));
            assert!(lock.is_locked());
        }
    }
}
