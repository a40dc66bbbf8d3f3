//! Byte budget for tiles held between fetch and write.
//!
//! A fetch reserves an estimated size before it starts and keeps that
//! reservation until its tile is written. When the payload arrives the
//! reservation is resized in place: excess is released, a shortfall is taken
//! from the free budget. A shortfall the budget cannot cover right away is
//! booked as overdraft instead of waited for, and no new fetch starts until
//! every overdraft is paid back.

use parking_lot::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Ledger {
    reserved: u64,
    overdraft: u64,
}

pub(crate) struct ByteBudget {
    capacity: u64,
    ledger: Mutex<Ledger>,
    released: Notify,
}

impl ByteBudget {
    pub(crate) fn new(bytes: u64) -> Self {
        Self {
            capacity: bytes.max(1),
            ledger: Mutex::new(Ledger::default()),
            released: Notify::new(),
        }
    }

    pub(crate) fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes currently reserved or overdrawn.
    pub(crate) fn in_flight(&self) -> u64 {
        let ledger = self.ledger.lock();
        ledger.reserved + ledger.overdraft
    }

    /// Waits until no overdraft is outstanding and `bytes` (capped at the
    /// whole budget) fit, then reserves them.
    pub(crate) async fn reserve(&self, bytes: u64) -> BudgetHold<'_> {
        let wanted = bytes.clamp(1, self.capacity);
        loop {
            let released = self.released.notified();
            {
                let mut ledger = self.ledger.lock();
                if ledger.overdraft == 0 && ledger.reserved + wanted <= self.capacity {
                    ledger.reserved += wanted;
                    return BudgetHold {
                        budget: self,
                        held: wanted,
                        overdraft: 0,
                    };
                }
            }
            released.await;
        }
    }
}

/// Budget held by one tile until dropped.
pub(crate) struct BudgetHold<'a> {
    budget: &'a ByteBudget,
    held: u64,
    overdraft: u64,
}

impl BudgetHold<'_> {
    /// Resizes the hold to the payload size without waiting.
    pub(crate) fn settle(&mut self, actual: u64) {
        let mut ledger = self.budget.ledger.lock();
        if actual < self.held {
            ledger.reserved -= self.held - actual;
            self.held = actual;
            drop(ledger);
            self.budget.released.notify_waiters();
        } else if actual > self.held {
            let shortfall = actual - self.held;
            let free = self.budget.capacity.saturating_sub(ledger.reserved);
            let taken = shortfall.min(free);
            ledger.reserved += taken;
            self.held += taken;

            let uncovered = shortfall - taken;
            ledger.overdraft += uncovered;
            self.overdraft += uncovered;
        }
    }

    #[cfg(test)]
    fn overdraft(&self) -> u64 {
        self.overdraft
    }
}

impl Drop for BudgetHold<'_> {
    fn drop(&mut self) {
        {
            let mut ledger = self.budget.ledger.lock();
            ledger.reserved -= self.held;
            ledger.overdraft -= self.overdraft;
        }
        self.budget.released.notify_waiters();
    }
}
