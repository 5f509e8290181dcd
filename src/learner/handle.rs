use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use super::traits::Agent;

/// A shareable reference to a trained agent. Returned by training and passed
/// explicitly to whatever evaluates it.
pub struct AgentHandle<O, A> {
    id: Uuid,
    agent: Arc<dyn Agent<O, A>>,
}

impl<O, A> AgentHandle<O, A> {
    pub fn new(agent: impl Agent<O, A> + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent: Arc::new(agent),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl<O, A> Clone for AgentHandle<O, A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            agent: self.agent.clone(),
        }
    }
}

impl<O, A> fmt::Debug for AgentHandle<O, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle")
            .field("id", &self.id)
            .field("action_type", &std::any::type_name::<A>())
            .finish()
    }
}

impl<O, A> Agent<O, A> for AgentHandle<O, A> {
    fn compute_action(&self, obs: &O) -> A {
        self.agent.compute_action(obs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl Agent<u32, u32> for Doubler {
        fn compute_action(&self, obs: &u32) -> u32 {
            obs * 2
        }
    }

    #[test]
    fn test_handle_delegates() {
        let handle = AgentHandle::new(Doubler);
        assert_eq!(handle.compute_action(&21), 42);
    }

    #[test]
    fn test_clone_shares_identity() {
        let handle = AgentHandle::new(Doubler);
        let other = handle.clone();
        assert_eq!(handle.id(), other.id());
        assert_ne!(handle.id(), AgentHandle::new(Doubler).id());
    }
}
