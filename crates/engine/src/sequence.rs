//! The step sequence — an ordered catalog of named steps.
//!
//! The sequence is data, not a hardcoded switch: the processor only ever
//! asks "which handler sits at this ordinal, and is the next ordinal the
//! terminal one".  Adding a step means adding a slot here; the control loop
//! does not change.

use std::sync::Arc;

use crate::steps::{CreateUsersStep, DeleteUsersStep, InitialStep, ListUsersStep, StepHandler};

/// One slot in the sequence.  The terminal slot carries no handler.
pub struct StepSlot {
    pub name: &'static str,
    pub handler: Option<Arc<dyn StepHandler>>,
}

/// Ordered list of steps; the slot index is the step ordinal persisted in
/// the operation record.
pub struct StepSequence {
    slots: Vec<StepSlot>,
}

impl StepSequence {
    /// The standard sequence:
    /// `INITIAL → LIST_USERS → DELETE_USERS → CREATE_USERS → COMPLETED`.
    pub fn standard() -> Self {
        Self {
            slots: vec![
                StepSlot {
                    name: "INITIAL",
                    handler: Some(Arc::new(InitialStep)),
                },
                StepSlot {
                    name: "LIST_USERS",
                    handler: Some(Arc::new(ListUsersStep)),
                },
                StepSlot {
                    name: "DELETE_USERS",
                    handler: Some(Arc::new(DeleteUsersStep)),
                },
                StepSlot {
                    name: "CREATE_USERS",
                    handler: Some(Arc::new(CreateUsersStep)),
                },
                StepSlot {
                    name: "COMPLETED",
                    handler: None,
                },
            ],
        }
    }

    /// Build a sequence from explicit slots (tests use this to exercise the
    /// processor without real handlers).
    pub fn from_slots(slots: Vec<StepSlot>) -> Self {
        Self { slots }
    }

    /// Ordinal a new operation starts at.
    pub fn initial_step(&self) -> i32 {
        0
    }

    /// Ordinal of the terminal slot.  Also the `total_steps` value reported
    /// by status checks.
    pub fn terminal_step(&self) -> i32 {
        self.slots.len() as i32 - 1
    }

    /// Look up a slot by ordinal.  `None` for out-of-range ordinals.
    pub fn slot(&self, step: i32) -> Option<&StepSlot> {
        usize::try_from(step).ok().and_then(|i| self.slots.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_sequence_shape() {
        let seq = StepSequence::standard();
        assert_eq!(seq.initial_step(), 0);
        assert_eq!(seq.terminal_step(), 4);

        let names: Vec<&str> = (0..=4).map(|i| seq.slot(i).unwrap().name).collect();
        assert_eq!(
            names,
            vec!["INITIAL", "LIST_USERS", "DELETE_USERS", "CREATE_USERS", "COMPLETED"]
        );
    }

    #[test]
    fn terminal_slot_has_no_handler() {
        let seq = StepSequence::standard();
        assert!(seq.slot(4).unwrap().handler.is_none());
        for i in 0..4 {
            assert!(seq.slot(i).unwrap().handler.is_some());
        }
    }

    #[test]
    fn out_of_range_ordinals_are_unregistered() {
        let seq = StepSequence::standard();
        assert!(seq.slot(-1).is_none());
        assert!(seq.slot(99).is_none());
    }
}
