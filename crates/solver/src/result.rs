/// Answer from the Horn solver for one reachability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    /// The queried relation is reachable (the assertion can fail).
    Satisfiable,
    /// The queried relation is unreachable (the assertion is proved safe).
    Unsatisfiable,
    /// No solver could decide the query (timeout, resource limit, theory
    /// incompleteness).
    Unknown,
    /// Two solvers in the portfolio gave contradicting definitive answers.
    /// Results might not be sound.
    Conflicting,
    /// Every solver invocation failed (process or parse error).
    Error,
}

impl CheckResult {
    /// Returns `true` if the result is `Satisfiable`.
    pub fn is_sat(&self) -> bool {
        matches!(self, CheckResult::Satisfiable)
    }

    /// Returns `true` if the result is `Unsatisfiable`.
    pub fn is_unsat(&self) -> bool {
        matches!(self, CheckResult::Unsatisfiable)
    }

    /// Returns `true` for `Satisfiable` or `Unsatisfiable`.
    pub fn is_definitive(&self) -> bool {
        self.is_sat() || self.is_unsat()
    }
}
