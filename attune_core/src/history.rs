// attune_core/src/history.rs

//! Rolling windows of past states for models conditioned on history.
//!
//! A history state is one flat vector: the newest state occupies the first
//! slice and each older state sits one slice further back.

use crate::error::{AttuneError, AttuneResult};
use crate::types::{State, StateBatch};

fn check_lengths(history: usize, state: usize) -> AttuneResult<()> {
    if state == 0 || history < state || history % state != 0 {
        return Err(AttuneError::InvalidHistoryLength { history, state });
    }
    Ok(())
}

/// Makes `new_state` the first slice of `history`, shifting every retained
/// slice back by one and dropping the oldest. The caller's buffer is untouched.
pub fn push_history(new_state: &State, history: &State) -> AttuneResult<State> {
    let l = new_state.len();
    let n = history.len();
    check_lengths(n, l)?;

    let mut data = State::zeros(n);
    data.rows_mut(l, n - l).copy_from(&history.rows(0, n - l));
    data.rows_mut(0, l).copy_from(new_state);
    Ok(data)
}

/// Row-wise `push_history` over a batch. Row `i` of `new_states` is pushed
/// into row `i` of `histories`.
pub fn push_history_batch(new_states: &StateBatch, histories: &StateBatch) -> AttuneResult<StateBatch> {
    if new_states.nrows() != histories.nrows() {
        return Err(AttuneError::DimensionMismatch {
            context: "history batch rows",
            expected: histories.nrows(),
            found: new_states.nrows(),
        });
    }
    let l = new_states.ncols();
    let n = histories.ncols();
    check_lengths(n, l)?;

    let mut data = StateBatch::zeros(histories.nrows(), n);
    data.columns_mut(l, n - l)
        .copy_from(&histories.columns(0, n - l));
    data.columns_mut(0, l).copy_from(new_states);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{dmatrix, dvector};

    #[test]
    fn test_push_places_new_state_first() {
        let history = dvector![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let new_state = dvector![7.0, 8.0];
        let pushed = push_history(&new_state, &history).unwrap();
        assert_eq!(pushed, dvector![7.0, 8.0, 1.0, 2.0, 3.0, 4.0]);
        // The original buffer is not mutated.
        assert_eq!(history, dvector![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_two_pushes_keep_length_and_order() {
        let history = State::zeros(9);
        let s = dvector![1.0, 1.0, 1.0];
        let s2 = dvector![2.0, 2.0, 2.0];
        let pushed = push_history(&s2, &push_history(&s, &history).unwrap()).unwrap();
        assert_eq!(pushed.len(), history.len());
        assert_eq!(pushed, dvector![2.0, 2.0, 2.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_single_slice_history_is_replaced() {
        let pushed = push_history(&dvector![3.0, 4.0], &dvector![1.0, 2.0]).unwrap();
        assert_eq!(pushed, dvector![3.0, 4.0]);
    }

    #[test]
    fn test_non_multiple_history_fails() {
        let err = push_history(&dvector![1.0, 2.0], &dvector![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            AttuneError::InvalidHistoryLength {
                history: 3,
                state: 2
            }
        );
        assert!(push_history(&State::zeros(0), &dvector![1.0]).is_err());
        assert!(push_history(&dvector![1.0, 2.0], &State::zeros(0)).is_err());
    }

    #[test]
    fn test_batch_push_shifts_each_row() {
        let histories = dmatrix![1.0, 2.0, 3.0, 4.0; 5.0, 6.0, 7.0, 8.0];
        let new_states = dmatrix![9.0, 9.5; 0.0, 0.5];
        let pushed = push_history_batch(&new_states, &histories).unwrap();
        assert_eq!(pushed, dmatrix![9.0, 9.5, 1.0, 2.0; 0.0, 0.5, 5.0, 6.0]);
    }
}
