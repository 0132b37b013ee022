//! Property-based tests for the command queue against a `VecDeque` model.

use std::collections::VecDeque;

use gamebot_core::{CommandElement, CommandQueue, JoystickReport};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Push(u16),
    Pop,
    Reset,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u16>().prop_map(Op::Push),
        3 => Just(Op::Pop),
        1 => Just(Op::Reset),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Strict FIFO order, never more than seven elements, no partial state.
    #[test]
    fn prop_queue_matches_model(ops in proptest::collection::vec(op_strategy(), 0..100)) {
        let mut queue: CommandQueue = CommandQueue::new();
        let mut model: VecDeque<u16> = VecDeque::new();

        for op in ops {
            match op {
                Op::Push(duration_ms) => match queue.push() {
                    Some(slot) => {
                        prop_assert!(model.len() < 7);
                        prop_assert_eq!(*slot, CommandElement::neutral());
                        slot.duration_ms = duration_ms;
                        model.push_back(duration_ms);
                    }
                    None => {
                        prop_assert_eq!(model.len(), 7);
                    }
                },
                Op::Pop => {
                    let popped = queue.pop();
                    prop_assert_eq!(popped.map(|e| e.duration_ms), model.pop_front());
                    if let Some(element) = popped {
                        prop_assert_eq!(element.report, JoystickReport::neutral());
                    }
                }
                Op::Reset => {
                    queue.reset();
                    model.clear();
                }
            }
            prop_assert_eq!(queue.len(), model.len());
            prop_assert_eq!(queue.free(), 7 - model.len());
        }
    }
}
