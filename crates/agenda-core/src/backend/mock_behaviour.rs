//! Tweaks that make a [`LocalBackend`](super::LocalBackend) fail on purpose, so
//! tests can exercise the controller's error paths.

use tracing::debug;

use crate::error::{BackendError, BackendResult};

/// How a backend behaves during a given test.
///
/// For an operation to fail _n_ times after _m_ initial successes, set its
/// field to `(m, n)`.
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// When true every operation is allowed
    pub is_suspended: bool,

    pub select_behaviour: (u32, u32),
    pub insert_behaviour: (u32, u32),
    pub update_behaviour: (u32, u32),
    pub delete_behaviour: (u32, u32),
    pub auth_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails at once, `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            select_behaviour: (0, n_fails),
            insert_behaviour: (0, n_fails),
            update_behaviour: (0, n_fails),
            delete_behaviour: (0, n_fails),
            auth_behaviour: (0, n_fails),
        }
    }

    /// Only writes (insert/update/delete) fail, `n_fails` times each
    pub fn fail_writes(n_fails: u32) -> Self {
        Self {
            insert_behaviour: (0, n_fails),
            update_behaviour: (0, n_fails),
            delete_behaviour: (0, n_fails),
            ..Self::default()
        }
    }

    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }

    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_select(&mut self) -> BackendResult<()> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.select_behaviour, "select")
    }

    pub fn can_insert(&mut self) -> BackendResult<()> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.insert_behaviour, "insert")
    }

    pub fn can_update(&mut self) -> BackendResult<()> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.update_behaviour, "update")
    }

    pub fn can_delete(&mut self) -> BackendResult<()> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.delete_behaviour, "delete")
    }

    pub fn can_authenticate(&mut self) -> BackendResult<()> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.auth_behaviour, "auth")
    }
}

/// Ok when the value is `(1+, _)` or `(_, 0)`; otherwise decrement and fail.
fn decrement(value: &mut (u32, u32), descr: &str) -> BackendResult<()> {
    if value.0 > 0 {
        value.0 -= 1;
        debug!(operation = descr, remaining = ?value, "mock behaviour: allowing");
        return Ok(());
    }
    if value.1 > 0 {
        value.1 -= 1;
        debug!(operation = descr, remaining = ?value, "mock behaviour: failing");
        return Err(BackendError::Rejected(format!(
            "mocked {descr} failure ({} left)",
            value.1
        )));
    }
    Ok(())
}
