use std::sync::{Arc, Mutex, RwLock};

use log::debug;
use serde::Serialize;
use thiserror::Error;

/// Cumulative `(epsilon, delta)` spent against an accountant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetRecord {
    pub epsilon: f64,
    pub delta: f64,
}

impl BudgetRecord {
    pub const ZERO: BudgetRecord = BudgetRecord {
        epsilon: 0.0,
        delta: 0.0,
    };
}

/// Error returned when interacting with a [`BudgetAccountant`].
#[derive(Error, Debug)]
pub enum BudgetError {
    #[error(
        "privacy budget exceeded: requested (ε={requested_epsilon}, \
         δ={requested_delta}), remaining (ε={remaining_epsilon}, \
         δ={remaining_delta})"
    )]
    Exceeded {
        requested_epsilon: f64,
        requested_delta: f64,
        remaining_epsilon: f64,
        remaining_delta: f64,
    },

    #[error("spend must be non-negative and finite, got (ε={0}, δ={1})")]
    InvalidSpend(f64, f64),
}

/// Ledger tracking cumulative privacy spend across mechanism invocations.
///
/// The record is kept behind a mutex so one accountant can be shared
/// (via [`Arc`]) by concurrent histogram calls. `check` is a fast
/// non-mutating pre-flight; `spend` re-validates under the lock before
/// committing, so two callers that both passed `check` can never jointly
/// exceed the capacity: the later `spend` fails and the record is
/// untouched.
#[derive(Debug)]
pub struct BudgetAccountant {
    epsilon_capacity: f64,
    delta_capacity: f64,
    spent: Mutex<BudgetRecord>,
}

static DEFAULT_ACCOUNTANT: RwLock<Option<Arc<BudgetAccountant>>> =
    RwLock::new(None);

impl BudgetAccountant {
    /// New accountant with the given total capacity.
    pub fn new(epsilon_capacity: f64, delta_capacity: f64) -> Self {
        Self {
            epsilon_capacity,
            delta_capacity,
            spent: Mutex::new(BudgetRecord::ZERO),
        }
    }

    /// Accountant that never rejects a spend.
    pub fn unlimited() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY)
    }

    /// Fails if spending `(epsilon, delta)` would exceed the remaining
    /// budget. Does not modify the record.
    pub fn check(&self, epsilon: f64, delta: f64) -> Result<(), BudgetError> {
        validate_spend(epsilon, delta)?;
        let spent = self.spent.lock().expect("accountant lock poisoned");
        self.check_locked(&spent, epsilon, delta)
    }

    /// Commits the spend, or fails with [`BudgetError::Exceeded`] leaving
    /// the record unchanged.
    pub fn spend(&self, epsilon: f64, delta: f64) -> Result<(), BudgetError> {
        validate_spend(epsilon, delta)?;
        let mut spent = self.spent.lock().expect("accountant lock poisoned");
        self.check_locked(&spent, epsilon, delta)?;
        spent.epsilon += epsilon;
        spent.delta += delta;
        debug!(
            "Budget spend committed: (ε={epsilon}, δ={delta}), total now \
             (ε={}, δ={})",
            spent.epsilon, spent.delta
        );
        Ok(())
    }

    /// Cumulative spend so far.
    pub fn spent(&self) -> BudgetRecord {
        *self.spent.lock().expect("accountant lock poisoned")
    }

    /// Budget still available.
    pub fn remaining(&self) -> BudgetRecord {
        let spent = self.spent.lock().expect("accountant lock poisoned");
        BudgetRecord {
            epsilon: self.epsilon_capacity - spent.epsilon,
            delta: self.delta_capacity - spent.delta,
        }
    }

    /// Installs `accountant` as the process-wide default used by
    /// [`BudgetAccountant::resolve`] when no explicit handle is given.
    pub fn install_default(accountant: Arc<BudgetAccountant>) {
        let mut default =
            DEFAULT_ACCOUNTANT.write().expect("default lock poisoned");
        *default = Some(accountant);
    }

    /// Removes the installed default, if any.
    pub fn reset_default() {
        let mut default =
            DEFAULT_ACCOUNTANT.write().expect("default lock poisoned");
        *default = None;
    }

    /// Resolves an optional handle: the explicit one if given, else the
    /// installed default, else a fresh unlimited accountant.
    pub fn resolve(explicit: Option<Arc<BudgetAccountant>>) -> Arc<BudgetAccountant> {
        if let Some(accountant) = explicit {
            return accountant;
        }
        let default =
            DEFAULT_ACCOUNTANT.read().expect("default lock poisoned");
        match &*default {
            Some(accountant) => Arc::clone(accountant),
            None => Arc::new(BudgetAccountant::unlimited()),
        }
    }

    fn check_locked(
        &self,
        spent: &BudgetRecord,
        epsilon: f64,
        delta: f64,
    ) -> Result<(), BudgetError> {
        let remaining_epsilon = self.epsilon_capacity - spent.epsilon;
        let remaining_delta = self.delta_capacity - spent.delta;
        if epsilon > remaining_epsilon || delta > remaining_delta {
            return Err(BudgetError::Exceeded {
                requested_epsilon: epsilon,
                requested_delta: delta,
                remaining_epsilon,
                remaining_delta,
            });
        }
        Ok(())
    }
}

fn validate_spend(epsilon: f64, delta: f64) -> Result<(), BudgetError> {
    if epsilon.is_nan() || epsilon < 0.0 || delta.is_nan() || delta < 0.0 {
        return Err(BudgetError::InvalidSpend(epsilon, delta));
    }
    Ok(())
}
