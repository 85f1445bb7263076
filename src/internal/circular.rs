//! Circular dependency detection infrastructure.

use std::cell::RefCell;
use std::sync::Arc;

use crate::error::{DiError, DiResult};

pub(crate) const MAX_DEPTH: usize = 1024;

// Thread-local stack of records whose factories are currently running
thread_local! {
    static MATERIALIZING: RefCell<Vec<(usize, Arc<str>)>> = const { RefCell::new(Vec::new()) };
}

/// Guard for one record on the thread-local materialization stack.
///
/// Records are identified by address, so the same creator registered in a
/// parent and a child scope counts as two distinct entries.
pub(crate) struct MaterializeGuard {
    record: usize,
}

impl MaterializeGuard {
    pub(crate) fn enter(record: usize, label: Arc<str>) -> DiResult<Self> {
        MATERIALIZING.with(|stack| {
            let mut stack = stack.borrow_mut();

            // Circular detection BEFORE pushing the new record
            if stack.iter().any(|(addr, _)| *addr == record) {
                let mut path: Vec<String> = stack
                    .iter()
                    .skip_while(|(addr, _)| *addr != record)
                    .map(|(_, label)| label.to_string())
                    .collect();
                path.push(label.to_string());
                return Err(DiError::Circular(path));
            }

            if stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push((record, label));
            Ok(Self { record })
        })
    }
}

impl Drop for MaterializeGuard {
    fn drop(&mut self) {
        MATERIALIZING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some((last, _)) = stack.pop() {
                debug_assert_eq!(last, self.record);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reentering_a_record_reports_the_cycle() {
        let _a = MaterializeGuard::enter(1, "a".into()).unwrap();
        let _b = MaterializeGuard::enter(2, "b".into()).unwrap();

        match MaterializeGuard::enter(1, "a".into()) {
            Err(DiError::Circular(path)) => assert_eq!(path, vec!["a", "b", "a"]),
            _ => panic!("expected a circular error"),
        }
    }

    #[test]
    fn guard_pops_on_drop() {
        {
            let _a = MaterializeGuard::enter(7, "seven".into()).unwrap();
        }
        assert!(MaterializeGuard::enter(7, "seven".into()).is_ok());
    }
}
