//! Circuit breaker — per-named-gate failure isolation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub monitoring_period: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        CircuitBreakerConfig {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            monitoring_period: Duration::from_secs(60),
        }
    }
}

struct Gate {
    config: CircuitBreakerConfig,
    state: CircuitState,
    failure_count: u32,
    half_open_successes: u32,
    last_failure_at: Option<Instant>,
}

impl Gate {
    fn new(config: CircuitBreakerConfig) -> Self {
        Gate { config, state: CircuitState::Closed, failure_count: 0, half_open_successes: 0, last_failure_at: None }
    }

    fn before_call(&mut self) -> Result<()> {
        if self.state == CircuitState::Open {
            let elapsed = self.last_failure_at.map(|t| t.elapsed()).unwrap_or(Duration::MAX);
            if elapsed >= self.config.recovery_timeout {
                self.state = CircuitState::HalfOpen;
                self.half_open_successes = 0;
            } else {
                return Err(Error::CircuitOpen(String::new()));
            }
        }
        Ok(())
    }

    fn on_success(&mut self) {
        match self.state {
            CircuitState::Closed => {
                self.failure_count = self.failure_count.saturating_sub(1);
            }
            CircuitState::HalfOpen => {
                self.half_open_successes += 1;
                if self.half_open_successes >= 3 {
                    self.state = CircuitState::Closed;
                    self.failure_count = 0;
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&mut self) {
        self.last_failure_at = Some(Instant::now());
        match self.state {
            CircuitState::Closed => {
                self.failure_count += 1;
                if self.failure_count >= self.config.failure_threshold {
                    self.state = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                self.state = CircuitState::Open;
                self.half_open_successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    fn reset(&mut self) {
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.half_open_successes = 0;
        self.last_failure_at = None;
    }
}

/// Registry of named circuit breaker gates, shared by clone.
#[derive(Clone)]
pub struct CircuitBreaker {
    gates: Arc<Mutex<HashMap<String, Gate>>>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        CircuitBreaker { gates: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Run `operation` through the named gate, using `config` to create
    /// the gate on first use.
    pub async fn call<F, Fut, T>(&self, name: &str, config: CircuitBreakerConfig, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        {
            let mut gates = self.gates.lock().await;
            let gate = gates.entry(name.to_string()).or_insert_with(|| Gate::new(config));
            if gate.before_call().is_err() {
                warn!(gate = name, "circuit open, rejecting call");
                return Err(Error::CircuitOpen(name.to_string()));
            }
        }

        match operation().await {
            Ok(value) => {
                let mut gates = self.gates.lock().await;
                if let Some(gate) = gates.get_mut(name) {
                    gate.on_success();
                }
                Ok(value)
            }
            Err(err) => {
                let mut gates = self.gates.lock().await;
                if let Some(gate) = gates.get_mut(name) {
                    gate.on_failure();
                }
                Err(err)
            }
        }
    }

    pub async fn state(&self, name: &str) -> Option<CircuitState> {
        self.gates.lock().await.get(name).map(|g| g.state)
    }

    /// Forcibly reset one named gate, or every gate when `name` is `None`.
    pub async fn reset(&self, name: Option<&str>) {
        let mut gates = self.gates.lock().await;
        match name {
            Some(name) => {
                if let Some(gate) = gates.get_mut(name) {
                    gate.reset();
                }
            }
            None => {
                for gate in gates.values_mut() {
                    gate.reset();
                }
            }
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
