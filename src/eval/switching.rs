//! Reward-regression switching between two fixed action sequences.
//!
//! The policy walks the active sequence cyclically. Whenever a step's reward
//! is strictly lower than the previous step's, it flips to the other
//! sequence and restarts its index. With only one sequence configured the
//! flip (index reset included) does nothing.
//!
//! Each benchmark starts at index 0. The active sequence always carries into
//! the next benchmark; the previous reward does too unless the scope is
//! [`RegressionScope::PerEpisode`].

use serde::{Deserialize, Serialize};

use super::errors::EvalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Active {
    A,
    B,
}

impl Active {
    fn other(self) -> Self {
        match self {
            Active::A => Active::B,
            Active::B => Active::A,
        }
    }
}

/// Whether the last reward of one benchmark may trigger a switch on the
/// first step of the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegressionScope {
    #[default]
    AcrossBenchmarks,
    PerEpisode,
}

/// One required and one optional candidate sequence, both non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePair<A> {
    a: Vec<A>,
    b: Option<Vec<A>>,
}

impl<A> SequencePair<A> {
    pub fn new(a: Vec<A>, b: Option<Vec<A>>) -> Result<Self, EvalError> {
        if a.is_empty() {
            return Err(EvalError::EmptySequence("A"));
        }
        if b.as_ref().is_some_and(Vec::is_empty) {
            return Err(EvalError::EmptySequence("B"));
        }
        Ok(Self { a, b })
    }

    pub fn single(a: Vec<A>) -> Result<Self, EvalError> {
        Self::new(a, None)
    }

    pub fn get(&self, which: Active) -> &[A] {
        match (which, &self.b) {
            (Active::B, Some(b)) => b,
            _ => &self.a,
        }
    }

    pub fn has_b(&self) -> bool {
        self.b.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SwitchingPolicy<'s, A> {
    sequences: &'s SequencePair<A>,
    scope: RegressionScope,
    active: Active,
    step_index: usize,
    previous_reward: Option<f64>,
}

impl<'s, A> SwitchingPolicy<'s, A> {
    pub fn new(sequences: &'s SequencePair<A>, scope: RegressionScope) -> Self {
        Self {
            sequences,
            scope,
            active: Active::A,
            step_index: 0,
            previous_reward: None,
        }
    }

    pub fn active(&self) -> Active {
        self.active
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn previous_reward(&self) -> Option<f64> {
        self.previous_reward
    }

    /// Called before the first step on each benchmark.
    pub fn begin_episode(&mut self) {
        self.step_index = 0;
        if self.scope == RegressionScope::PerEpisode {
            self.previous_reward = None;
        }
    }

    pub fn next_action(&self) -> &'s A {
        &self.sequences.get(self.active)[self.step_index]
    }

    /// Feed the reward of the action just applied. Returns whether the
    /// policy switched sequences.
    pub fn observe(&mut self, reward: f64) -> bool {
        let regressed = self.previous_reward.is_some_and(|prev| reward < prev);
        let switched = regressed && self.sequences.has_b();
        if switched {
            self.active = self.active.other();
            self.step_index = 0;
        }
        self.step_index = (self.step_index + 1) % self.sequences.get(self.active).len();
        self.previous_reward = Some(reward);
        switched
    }
}
