// attune_core/src/types.rs

use nalgebra::{DMatrix, DVector};
use std::ops::Neg;

// --- Core Type Aliases ---
pub type State = DVector<f64>;
pub type Action = DVector<f64>;

/// A batch of states, one state per row.
pub type StateBatch = DMatrix<f64>;
/// A batch of actions, one action per row.
pub type ActionBatch = DMatrix<f64>;

// --- Scored Quantities ---
// The tuning path minimizes a cost, the MPC path maximizes a reward.
// They are kept as distinct types related only through negation.

/// A scalar to be minimized.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Cost(pub f64);

/// A scalar to be maximized.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Reward(pub f64);

impl Cost {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Reward {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<Cost> for Reward {
    fn from(cost: Cost) -> Self {
        Reward(-cost.0)
    }
}

impl From<Reward> for Cost {
    fn from(reward: Reward) -> Self {
        Cost(-reward.0)
    }
}

impl Neg for Cost {
    type Output = Reward;

    fn neg(self) -> Reward {
        Reward::from(self)
    }
}

impl std::ops::Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost(0.0), |acc, c| acc + c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_and_reward_are_negations() {
        let reward: Reward = Cost(2.5).into();
        assert_eq!(reward, Reward(-2.5));
        assert_eq!(Cost::from(reward), Cost(2.5));
        assert_eq!(-Cost(1.0), Reward(-1.0));
    }

    #[test]
    fn test_costs_sum() {
        let total: Cost = vec![Cost(1.0), Cost(0.5), Cost(0.25)].into_iter().sum();
        assert_eq!(total, Cost(1.75));
    }
}
