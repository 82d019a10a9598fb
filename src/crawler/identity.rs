//! Client identity rotation
//!
//! The pool is owned by the pipeline and lent to every fetch, which draws a
//! fresh user agent per attempt.

use rand::seq::SliceRandom;

/// A fixed set of user-agent strings to rotate through
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Creates a pool from configured agents
    ///
    /// Returns `None` if `agents` is empty.
    pub fn new(agents: Vec<String>) -> Option<Self> {
        if agents.is_empty() {
            None
        } else {
            Some(Self { agents })
        }
    }

    /// Picks a user agent uniformly at random
    pub fn pick(&self) -> &str {
        self.agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or_default()
    }
}
