use crate::lifecycle::{OrderState, StateRecord};
use chrono::{DateTime, Utc};

/// The ordered state records of one order.
///
/// The initial record is held apart from the rest, so a history can never be empty and
/// the initial record can never be popped.
#[derive(Debug, Clone)]
pub struct OrderHistory {
    initial: StateRecord,
    transitions: Vec<StateRecord>,
}

impl OrderHistory {
    pub fn new(state: OrderState, timestamp: DateTime<Utc>) -> Self {
        Self {
            initial: StateRecord {
                state,
                timestamp,
                sequence_number: 1,
                note: None,
            },
            transitions: Vec::new(),
        }
    }

    pub fn initial(&self) -> &StateRecord {
        &self.initial
    }

    pub fn current(&self) -> &StateRecord {
        self.transitions.last().unwrap_or(&self.initial)
    }

    /// Number of records, including the initial one.
    pub fn record_count(&self) -> usize {
        1 + self.transitions.len()
    }

    /// Number of transitions taken since the initial state.
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Appends a record without consulting the transition table.
    pub(crate) fn append(
        &mut self,
        state: OrderState,
        timestamp: DateTime<Utc>,
        note: Option<String>,
    ) -> &StateRecord {
        let sequence_number = self.current().sequence_number + 1;
        self.transitions.push(StateRecord {
            state,
            timestamp,
            sequence_number,
            note,
        });
        self.current()
    }

    /// Removes the latest record unless it is the initial one.
    pub(crate) fn rollback(&mut self) -> Option<StateRecord> {
        self.transitions.pop()
    }

    pub fn records(&self) -> impl Iterator<Item = &StateRecord> {
        std::iter::once(&self.initial).chain(self.transitions.iter())
    }

    pub fn to_vec(&self) -> Vec<StateRecord> {
        self.records().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers_follow_appends_and_rollbacks() {
        let now = Utc::now();
        let mut history = OrderHistory::new(OrderState::Pending, now);
        assert_eq!(history.current().sequence_number, 1);

        history.append(OrderState::InTransit, now, None);
        assert_eq!(history.current().sequence_number, 2);

        let rolled = history.rollback().unwrap();
        assert_eq!(rolled.state, OrderState::InTransit);
        assert_eq!(history.record_count(), 1);
        assert!(history.rollback().is_none());
        assert_eq!(history.current(), history.initial());

        history.append(OrderState::Cancelled, now, Some("customer request".into()));
        let seqs: Vec<_> = history.records().map(|r| r.sequence_number).collect();
        assert_eq!(seqs, vec![1, 2]);
    }
}
