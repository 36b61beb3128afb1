use crate::challenge::Challenge;

/// A freshly started flow: the opaque session token the client must
/// echo on every submit, plus the first challenge to answer.
#[derive(Debug, Clone, PartialEq)]
pub struct StartOutcome {
    pub token: String,
    pub challenge: Challenge,
}

/// Result of a successful submit round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// More work to do: answer this challenge next. Re-issued challenges
    /// carry `response_errors` from the failed attempt.
    Challenge(Challenge),
    /// The plan is exhausted; the session is `Completed`.
    Completed { redirect: Option<String> },
}
