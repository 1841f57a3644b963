//! Property tests: the history plugin behaves like a pair of stacks

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use proptest::prelude::*;
use reactive_store_runtime::{HistoryConfig, HistoryStatus, StateCell, StateHistory};

#[derive(Debug, Clone)]
enum Op {
    Set(u32),
    Undo,
    Redo,
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u32>().prop_map(Op::Set),
        2 => Just(Op::Undo),
        2 => Just(Op::Redo),
        1 => Just(Op::Reset),
    ]
}

/// Plain stacks the plugin must agree with
#[derive(Debug, Default)]
struct Model {
    past: Vec<u32>,
    present: u32,
    future: Vec<u32>,
}

impl Model {
    fn apply(&mut self, op: &Op, max_age: Option<usize>) {
        match *op {
            Op::Set(value) => {
                self.past.push(self.present);
                self.present = value;
                self.future.clear();
                if let Some(max) = max_age {
                    let excess = self.past.len().saturating_sub(max);
                    self.past.drain(..excess);
                }
            },
            Op::Undo => {
                if let Some(previous) = self.past.pop() {
                    self.future.push(self.present);
                    self.present = previous;
                }
            },
            Op::Redo => {
                if let Some(next) = self.future.pop() {
                    self.past.push(self.present);
                    self.present = next;
                }
            },
            Op::Reset => *self = Self::default(),
        }
    }
}

fn check(ops: &[Op], max_age: Option<usize>) -> Result<(), TestCaseError> {
    let config = max_age.map_or_else(HistoryConfig::default, |max| HistoryConfig::default().with_max_age(max));
    let cell = StateCell::new(0_u32);
    let history = StateHistory::attach(&cell, config);
    let mut model = Model::default();

    for op in ops {
        tokio_test::block_on(async {
            match *op {
                Op::Set(value) => {
                    cell.apply(|n| *n = value).await;
                },
                Op::Undo => {
                    history.undo().await;
                },
                Op::Redo => {
                    history.redo().await;
                },
                Op::Reset => cell.reset().await,
            }
        });
        model.apply(op, max_age);

        prop_assert_eq!(*cell.snapshot(), model.present);
        prop_assert_eq!(
            history.status(),
            HistoryStatus {
                past: model.past.len(),
                future: model.future.len(),
            }
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn unbounded_history_matches_stacks(ops in prop::collection::vec(op(), 0..40)) {
        check(&ops, None)?;
    }

    #[test]
    fn bounded_history_matches_trimmed_stacks(
        ops in prop::collection::vec(op(), 0..40),
        max_age in 1..5_usize,
    ) {
        check(&ops, Some(max_age))?;
    }
}
