//! Configuration lock, compute lock, and the compute-in-progress flag.
//!
//! Mutations call [`ConcurrencyGuard::mutate`], which fails fast with 409
//! while a compute holds a [`ComputeTicket`]. The flag is checked both before
//! and after waiting for the configuration lock, so a mutation queued behind
//! a compute snapshot cannot slip in. Reads and the compute's own bookkeeping
//! use [`ConcurrencyGuard::lock`] and are never rejected.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};

use crate::error::ApiError;

pub const CONFIG_LOCKED: &str = "configuration locked during compute";

pub struct ConcurrencyGuard<T> {
    config: Mutex<T>,
    compute: Mutex<()>,
    in_progress: AtomicBool,
}

/// Held for the duration of one compute. Dropping it clears the
/// in-progress flag, whether the compute succeeded or not.
pub struct ComputeTicket<'a> {
    _serial: MutexGuard<'a, ()>,
    flag: &'a AtomicBool,
}

impl Drop for ComputeTicket<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl<T> ConcurrencyGuard<T> {
    pub fn new(value: T) -> Self {
        ConcurrencyGuard {
            config: Mutex::new(value),
            compute: Mutex::new(()),
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn is_computing(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Configuration lock for reads, never rejected.
    pub async fn lock(&self) -> MutexGuard<'_, T> {
        self.config.lock().await
    }

    /// Configuration lock for a mutation.
    pub async fn mutate(&self) -> Result<MutexGuard<'_, T>, ApiError> {
        if self.is_computing() {
            return Err(ApiError::Conflict(CONFIG_LOCKED.to_string()));
        }
        let guard = self.config.lock().await;
        if self.is_computing() {
            return Err(ApiError::Conflict(CONFIG_LOCKED.to_string()));
        }
        Ok(guard)
    }

    /// Waits for earlier computes, then marks a compute as running.
    pub async fn begin_compute(&self) -> ComputeTicket<'_> {
        let serial = self.compute.lock().await;
        self.in_progress.store(true, Ordering::SeqCst);
        ComputeTicket {
            _serial: serial,
            flag: &self.in_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn mutation_rejected_while_ticket_held() {
        let guard = ConcurrencyGuard::new(0u32);
        let ticket = guard.begin_compute().await;
        assert!(guard.is_computing());

        let err = guard.mutate().await.err().unwrap();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(*guard.lock().await, 0);

        drop(ticket);
        assert!(!guard.is_computing());
        *guard.mutate().await.unwrap() += 1;
        assert_eq!(*guard.lock().await, 1);
    }

    #[tokio::test]
    async fn flag_cleared_when_compute_fails() {
        async fn failing(guard: &ConcurrencyGuard<()>) -> Result<(), ApiError> {
            let _ticket = guard.begin_compute().await;
            Err(ApiError::InternalError("evaluator failed".into()))
        }
        let guard = ConcurrencyGuard::new(());
        assert!(failing(&guard).await.is_err());
        assert!(!guard.is_computing());
        assert!(guard.mutate().await.is_ok());
    }

    #[tokio::test]
    async fn mutation_waiting_on_lock_rechecks_flag() {
        use std::sync::Arc;

        let guard = Arc::new(ConcurrencyGuard::new(0u32));
        let held = guard.lock().await;

        let waiter = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move { guard.mutate().await.map(|_| ()) })
        };
        tokio::task::yield_now().await;
        let ticket = guard.begin_compute().await;
        drop(held);

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(ApiError::Conflict(_))));
        drop(ticket);
    }
}
