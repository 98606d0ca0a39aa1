//! Retry policy as an explicit state machine.
//!
//! ```text
//! Attempt(n) --Success--------------> Deserialize(n) --Parsed------> Done(n)
//!            --RetryableTransport---> Attempt(n+1)   (n < max, sleep)
//!            --RetryableTransport---> Failed(Transport)  (n == max)
//!            --PermanentTransport---> Failed(Http)
//! Deserialize(n) --ParseFailed------> Failed(Parse)
//! ```
//!
//! The transition function is pure; the client performs the side effects.

use std::time::Duration;

use crate::transport::{HttpResponse, TransportError};

/// How a failed fetch is categorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Transient link failure that outlasted the retry ceiling.
    Transport,
    /// Non-OK status or a transport fault that retrying will not fix.
    Http,
    /// Malformed or oversized payload.
    Parse,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Http => "http",
            FailureKind::Parse => "parse",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    RetryableTransport,
    PermanentTransport,
}

/// Classify the result of one HTTP attempt.
pub fn classify(result: &Result<HttpResponse, TransportError>) -> Classification {
    match result {
        Ok(res) if res.is_ok() => Classification::Success,
        Ok(_) => Classification::PermanentTransport,
        Err(e) if e.is_retryable() => Classification::RetryableTransport,
        Err(_) => Classification::PermanentTransport,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// About to issue attempt `n` (1-based).
    Attempt(u32),
    /// Attempt `n` returned OK; the body is being deserialized.
    Deserialize(u32),
    Failed { kind: FailureKind, attempts: u32 },
    Done(u32),
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Failed { .. } | State::Done(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Response(Classification),
    Parsed,
    ParseFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Sleep(Duration),
}

/// Fixed retry ceiling and fixed inter-attempt delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` below one is treated as one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn start(&self) -> State {
        State::Attempt(1)
    }

    pub fn transition(&self, state: State, event: Event) -> (State, Effect) {
        use Classification::*;

        match (state, event) {
            (State::Attempt(n), Event::Response(Success)) => (State::Deserialize(n), Effect::None),
            (State::Attempt(n), Event::Response(RetryableTransport)) if n < self.max_attempts => {
                (State::Attempt(n + 1), Effect::Sleep(self.delay))
            }
            (State::Attempt(n), Event::Response(RetryableTransport)) => {
                (State::Failed { kind: FailureKind::Transport, attempts: n }, Effect::None)
            }
            (State::Attempt(n), Event::Response(PermanentTransport)) => {
                (State::Failed { kind: FailureKind::Http, attempts: n }, Effect::None)
            }
            (State::Deserialize(n), Event::Parsed) => (State::Done(n), Effect::None),
            (State::Deserialize(n), Event::ParseFailed) => {
                (State::Failed { kind: FailureKind::Parse, attempts: n }, Effect::None)
            }
            // Terminal states absorb everything; mismatched events leave the state alone.
            (state, _) => (state, Effect::None),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(250);

    fn run(policy: &RetryPolicy, responses: &[Classification], parsed: bool) -> (State, Vec<Effect>) {
        let mut state = policy.start();
        let mut effects = Vec::new();
        let mut responses = responses.iter();

        while !state.is_terminal() {
            let event = match state {
                State::Attempt(_) => Event::Response(*responses.next().expect("script exhausted")),
                State::Deserialize(_) if parsed => Event::Parsed,
                State::Deserialize(_) => Event::ParseFailed,
                _ => unreachable!(),
            };
            let (next, effect) = policy.transition(state, event);
            effects.push(effect);
            state = next;
        }

        (state, effects)
    }

    #[test]
    fn retries_transient_then_succeeds() {
        use Classification::*;
        let policy = RetryPolicy::new(3, DELAY);

        let (state, effects) = run(&policy, &[RetryableTransport, RetryableTransport, Success], true);

        assert_eq!(state, State::Done(3));
        assert_eq!(effects.iter().filter(|e| **e == Effect::Sleep(DELAY)).count(), 2);
    }

    #[test]
    fn transient_failures_exhaust_ceiling() {
        use Classification::*;
        let policy = RetryPolicy::new(2, DELAY);

        let (state, effects) = run(&policy, &[RetryableTransport, RetryableTransport], true);

        assert_eq!(state, State::Failed { kind: FailureKind::Transport, attempts: 2 });
        // No sleep after the last attempt.
        assert_eq!(effects, vec![Effect::Sleep(DELAY), Effect::None]);
    }

    #[test]
    fn permanent_failure_is_not_retried() {
        let policy = RetryPolicy::new(5, DELAY);

        let (state, _) = run(&policy, &[Classification::PermanentTransport], true);

        assert_eq!(state, State::Failed { kind: FailureKind::Http, attempts: 1 });
    }

    #[test]
    fn parse_failure_is_terminal() {
        use Classification::*;
        let policy = RetryPolicy::new(3, DELAY);

        let (state, _) = run(&policy, &[RetryableTransport, Success], false);

        assert_eq!(state, State::Failed { kind: FailureKind::Parse, attempts: 2 });
    }

    #[test]
    fn terminal_states_absorb_events() {
        let policy = RetryPolicy::default();
        let done = State::Done(1);

        assert_eq!(policy.transition(done, Event::ParseFailed), (done, Effect::None));
        assert_eq!(
            policy.transition(done, Event::Response(Classification::RetryableTransport)),
            (done, Effect::None)
        );
    }

    #[test]
    fn zero_ceiling_still_makes_one_attempt() {
        let policy = RetryPolicy::new(0, DELAY);
        assert_eq!(policy.max_attempts(), 1);

        let (state, _) = run(&policy, &[Classification::RetryableTransport], true);
        assert_eq!(state, State::Failed { kind: FailureKind::Transport, attempts: 1 });
    }

    #[test]
    fn classify_maps_results() {
        assert_eq!(classify(&Ok(HttpResponse::ok("{}"))), Classification::Success);
        assert_eq!(
            classify(&Ok(HttpResponse { status: 404, body: String::new() })),
            Classification::PermanentTransport
        );
        assert_eq!(
            classify(&Err(TransportError::ReadTimeout)),
            Classification::RetryableTransport
        );
        assert_eq!(
            classify(&Err(TransportError::NoHttpServer)),
            Classification::PermanentTransport
        );
    }
}
