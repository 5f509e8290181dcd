use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use super::{Env, EnvError};

/// Scoped ownership of one environment. The environment is closed when the
/// session is dropped, whether the caller finished normally or bailed out.
pub struct Session<E: Env> {
    env: Option<E>,
}

impl<E: Env> Session<E> {
    pub fn new(env: E) -> Self {
        debug!("environment session opened");
        Self { env: Some(env) }
    }

    /// Close explicitly and surface the error instead of logging it.
    pub fn close(mut self) -> Result<(), EnvError> {
        match self.env.take() {
            Some(mut env) => {
                debug!("environment session closed");
                env.close()
            }
            None => Ok(()),
        }
    }
}

impl<E: Env> Deref for Session<E> {
    type Target = E;

    fn deref(&self) -> &E {
        // Only `close` and `drop` take the env out, and both consume the session.
        self.env.as_ref().unwrap_or_else(|| unreachable!("session used after close"))
    }
}

impl<E: Env> DerefMut for Session<E> {
    fn deref_mut(&mut self) -> &mut E {
        self.env.as_mut().unwrap_or_else(|| unreachable!("session used after close"))
    }
}

impl<E: Env> Drop for Session<E> {
    fn drop(&mut self) {
        if let Some(mut env) = self.env.take() {
            if let Err(err) = env.close() {
                warn!(%err, "failed to close environment session");
            } else {
                debug!("environment session closed");
            }
        }
    }
}
