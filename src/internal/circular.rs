//! Circular resolution detection.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Identity of the provider driving a resolution.
pub(crate) type Owner = usize;

// (provider, contract) pairs being materialized on this thread, outermost first
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<(Owner, Key)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a contract as being materialized by one provider on the current thread.
///
/// Re-entering the same contract of the same provider would otherwise
/// deadlock on its descriptor lock, so it fails with [`DiError::Circular`]
/// instead. Another provider resolving the same contract has its own
/// descriptors and is not a cycle. The frame pops itself on drop, including
/// during unwinding.
pub(crate) struct ResolutionFrame {
    entry: (Owner, Key),
}

impl ResolutionFrame {
    pub(crate) fn enter(owner: Owner, key: Key, max_depth: usize) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let entry = (owner, key);

            if let Some(start) = stack.iter().position(|e| *e == entry) {
                let mut path: Vec<&'static str> = stack[start..]
                    .iter()
                    .filter(|(o, _)| *o == owner)
                    .map(|(_, k)| k.display_name())
                    .collect();
                path.push(key.display_name());
                return Err(DiError::Circular(path));
            }

            if stack.len() >= max_depth {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push(entry);
            Ok(Self { entry })
        })
    }
}

impl Drop for ResolutionFrame {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped, Some(self.entry));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    #[test]
    fn frames_pop_in_order() {
        let a = ResolutionFrame::enter(1, Key::of::<A>(), 8).unwrap();
        let b = ResolutionFrame::enter(1, Key::of::<B>(), 8).unwrap();
        drop(b);
        drop(a);
        assert!(ResolutionFrame::enter(1, Key::of::<A>(), 8).is_ok());
    }

    #[test]
    fn reentry_reports_cycle_from_first_occurrence() {
        let _a = ResolutionFrame::enter(1, Key::of::<A>(), 8).unwrap();
        let _b = ResolutionFrame::enter(1, Key::of::<B>(), 8).unwrap();
        match ResolutionFrame::enter(1, Key::of::<A>(), 8) {
            Err(DiError::Circular(path)) => {
                assert_eq!(path.len(), 3);
                assert!(path[0].ends_with("::A"));
                assert!(path[1].ends_with("::B"));
                assert!(path[2].ends_with("::A"));
            }
            _ => panic!("expected a cycle"),
        }
    }

    #[test]
    fn same_contract_of_another_owner_is_not_a_cycle() {
        let _outer = ResolutionFrame::enter(1, Key::of::<A>(), 8).unwrap();
        let _inner = ResolutionFrame::enter(2, Key::of::<A>(), 8).unwrap();
        assert!(matches!(
            ResolutionFrame::enter(2, Key::of::<A>(), 8),
            Err(DiError::Circular(_))
        ));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let _a = ResolutionFrame::enter(1, Key::of::<A>(), 1).unwrap();
        assert!(matches!(
            ResolutionFrame::enter(1, Key::of::<B>(), 1),
            Err(DiError::DepthExceeded(1))
        ));
    }
}
