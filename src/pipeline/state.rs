use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use super::CycleStatus;
use crate::binding::AssignmentTable;

/// State shared between the cycle worker, slot triggers and any display.
#[derive(Debug)]
pub struct PipelineState {
    /// Current table. Replaced as a whole, never mutated in place.
    table: RwLock<Arc<AssignmentTable>>,
    status: Mutex<CycleStatus>,
    /// Binding summary lines of the current table
    summary: Mutex<Vec<String>>,
    cycle_running: AtomicBool,
    pointer_loop: AtomicBool,
    /// Cleared by the global stop signal
    running: Arc<AtomicBool>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            table: RwLock::new(Arc::new(AssignmentTable::new())),
            status: Mutex::new(CycleStatus::Idle),
            summary: Mutex::new(Vec::new()),
            cycle_running: AtomicBool::new(false),
            pointer_loop: AtomicBool::new(false),
            running: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table as of now. Readers keep their snapshot even if a cycle
    /// publishes a new one meanwhile.
    pub fn snapshot(&self) -> Arc<AssignmentTable> {
        match self.table.read() {
            Ok(table) => Arc::clone(&table),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swaps in the table of a finished cycle.
    pub fn publish(&self, table: AssignmentTable, summary: Vec<String>) {
        let table = Arc::new(table);
        match self.table.write() {
            Ok(mut current) => *current = table,
            Err(poisoned) => *poisoned.into_inner() = table,
        }
        if let Ok(mut s) = self.summary.lock() {
            *s = summary;
        }
    }

    pub fn status(&self) -> CycleStatus {
        self.status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub(crate) fn set_status(&self, status: CycleStatus) {
        if let Ok(mut s) = self.status.lock() {
            *s = status;
        }
    }

    pub fn summary(&self) -> Vec<String> {
        self.summary
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Claims the cycle slot. Returns `None` if a cycle is already running.
    pub(crate) fn try_begin_cycle(self: &Arc<Self>) -> Option<CycleClaim> {
        if self.cycle_running.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(CycleClaim {
            state: Arc::clone(self),
        })
    }

    pub fn is_cycle_running(&self) -> bool {
        self.cycle_running.load(Ordering::SeqCst)
    }

    /// True for the first caller only; the centering loop runs once per process.
    pub(crate) fn claim_pointer_loop(&self) -> bool {
        !self.pointer_loop.swap(true, Ordering::SeqCst)
    }

    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// A running recognition cycle. Dropping it, also during a panic, lets the
/// next trigger start a cycle.
#[derive(Debug)]
pub struct CycleClaim {
    state: Arc<PipelineState>,
}

impl Drop for CycleClaim {
    fn drop(&mut self) {
        self.state.cycle_running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{Binding, SlotId};

    #[test]
    fn test_snapshot_survives_publish() {
        let state = PipelineState::new();
        let before = state.snapshot();

        let mut table = AssignmentTable::new();
        table.set(SlotId::Reinforce, Binding::new("增援", "wsdaw"));
        state.publish(table, vec!["增援 [0] (↑↓→←↑)".to_string()]);

        assert!(before.is_empty());
        assert_eq!(state.snapshot().bound_count(), 1);
        assert_eq!(state.summary().len(), 1);
    }

    #[test]
    fn test_single_cycle_claim() {
        let state = Arc::new(PipelineState::new());
        let claim = state.try_begin_cycle().unwrap();
        assert!(state.try_begin_cycle().is_none());
        assert!(state.is_cycle_running());
        drop(claim);
        assert!(!state.is_cycle_running());
        assert!(state.try_begin_cycle().is_some());
    }

    #[test]
    fn test_claim_released_when_worker_panics() {
        let state = Arc::new(PipelineState::new());
        let claim = state.try_begin_cycle().unwrap();

        let worker = std::thread::spawn(move || {
            let _claim = claim;
            panic!("cycle worker failed");
        });
        assert!(worker.join().is_err());

        assert!(!state.is_cycle_running());
        assert!(state.try_begin_cycle().is_some());
    }

    #[test]
    fn test_stop_clears_shared_flag() {
        let state = PipelineState::new();
        let flag = state.running_flag();
        state.stop();
        assert!(!flag.load(Ordering::SeqCst));
    }
}
