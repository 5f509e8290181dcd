use serde::{Deserialize, Serialize};

use super::traits::Agent;
use crate::env::passes::{Action, CATEGORIES, Observation};

/// Tabular action values over a coarse view of the program: how many passes
/// have run (clamped to `horizon`) and which instruction category dominates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    horizon: u32,
    n_actions: usize,
    q: Vec<f64>,
}

impl QTable {
    pub fn new(horizon: u32, n_actions: usize) -> Self {
        let n_states = (horizon as usize + 1) * CATEGORIES;
        Self {
            horizon,
            n_actions,
            q: vec![0.0; n_states * n_actions],
        }
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    pub fn state_index(&self, obs: &Observation) -> usize {
        let step = obs.steps.min(self.horizon) as usize;
        let dominant = obs
            .counts
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
            .map_or(0, |(i, _)| i);
        step * CATEGORIES + dominant
    }

    pub fn value(&self, state: usize, action: Action) -> f64 {
        self.q[state * self.n_actions + action]
    }

    /// Greedy action; ties go to the lowest index.
    pub fn best_action(&self, state: usize) -> Action {
        let mut best_action = 0;
        let mut best_q = f64::NEG_INFINITY;
        for action in 0..self.n_actions {
            let q = self.value(state, action);
            if q > best_q {
                best_q = q;
                best_action = action;
            }
        }
        best_action
    }

    pub fn max_value(&self, state: usize) -> f64 {
        self.value(state, self.best_action(state))
    }

    /// Move Q(s, a) toward `target` by step size `alpha`.
    pub fn update(&mut self, state: usize, action: Action, alpha: f64, target: f64) {
        let idx = state * self.n_actions + action;
        self.q[idx] += alpha * (target - self.q[idx]);
    }
}

/// Exploration-free policy over a frozen [`QTable`].
#[derive(Debug, Clone)]
pub struct GreedyPolicy {
    table: QTable,
}

impl GreedyPolicy {
    pub fn new(table: QTable) -> Self {
        Self { table }
    }
}

impl Agent<Observation, Action> for GreedyPolicy {
    fn compute_action(&self, obs: &Observation) -> Action {
        self.table.best_action(self.table.state_index(obs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(steps: u32, dominant: usize) -> Observation {
        let mut counts = [1; CATEGORIES];
        counts[dominant] = 100;
        Observation { counts, steps }
    }

    #[test]
    fn test_state_index_clamps_steps() {
        let table = QTable::new(3, 4);
        assert_eq!(table.state_index(&obs(0, 2)), 2);
        assert_eq!(table.state_index(&obs(1, 0)), CATEGORIES);
        assert_eq!(table.state_index(&obs(9, 1)), 3 * CATEGORIES + 1);
    }

    #[test]
    fn test_state_index_ties_pick_lowest_category() {
        let table = QTable::new(1, 2);
        let flat = Observation {
            counts: [5; CATEGORIES],
            steps: 0,
        };
        assert_eq!(table.state_index(&flat), 0);
    }

    #[test]
    fn test_update_moves_toward_target() {
        let mut table = QTable::new(1, 3);
        table.update(0, 2, 0.5, 10.0);
        assert_eq!(table.value(0, 2), 5.0);
        assert_eq!(table.best_action(0), 2);
        assert_eq!(table.max_value(0), 5.0);
    }

    #[test]
    fn test_untrained_policy_picks_first_action() {
        let policy = GreedyPolicy::new(QTable::new(2, 5));
        assert_eq!(policy.compute_action(&obs(0, 3)), 0);
    }
}
