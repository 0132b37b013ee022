//! Property-based tests for the byte ring against a simple queue model.

use std::collections::VecDeque;

use gamebot_proto::{RingBuffer, OVERFLOW_SENTINEL};
use proptest::prelude::*;

const N: usize = 32;

#[derive(Debug, Clone)]
enum Op {
    Push(u8),
    Pop,
    Peek(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u8>().prop_map(Op::Push),
        2 => Just(Op::Pop),
        1 => (0..N).prop_map(Op::Peek),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// The ring behaves like a FIFO that keeps one slot free and marks the
    /// point of saturation with the sentinel byte.
    #[test]
    fn prop_ring_matches_model(ops in proptest::collection::vec(op_strategy(), 0..200)) {
        let mut ring: RingBuffer<N> = RingBuffer::new();
        let mut model: VecDeque<u8> = VecDeque::new();

        for op in ops {
            match op {
                Op::Push(byte) => {
                    ring.push(byte);
                    match N - 1 - model.len() {
                        0 => {}
                        1 => model.push_back(OVERFLOW_SENTINEL),
                        _ => model.push_back(byte),
                    }
                }
                Op::Pop => {
                    let expected = model.pop_front().unwrap_or(0);
                    prop_assert_eq!(ring.pop(), expected);
                }
                Op::Peek(offset) => {
                    let expected = model.get(offset).copied().unwrap_or(0);
                    prop_assert_eq!(ring.peek(offset), expected);
                }
            }

            prop_assert!(ring.used() <= N - 1);
            prop_assert_eq!(ring.used(), model.len());
            prop_assert_eq!(ring.free(), N - 1 - model.len());
        }
    }
}
