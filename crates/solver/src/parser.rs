use crate::error::SolverError;

/// Raw verdict printed by a solver on its first output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAnswer {
    Sat,
    Unsat,
    Unknown(String),
}

/// Parse a solver's stdout into a [`RawAnswer`].
///
/// Expected output format: the first non-empty line is `sat`, `unsat`, or
/// `unknown`. Anything else (parser errors, missing binaries in scripts,
/// Eldarica warnings on stderr with an empty stdout) is a parse error.
pub fn parse_answer(stdout: &str, stderr: &str) -> Result<RawAnswer, SolverError> {
    let stdout = stdout.trim();

    if stdout.is_empty() {
        // Check stderr for clues
        if stderr.contains("timeout") {
            return Ok(RawAnswer::Unknown("timeout".to_string()));
        }
        return Err(SolverError::ParseError(format!(
            "Empty solver output. stderr: {stderr}"
        )));
    }

    // Find the first meaningful line (sat/unsat/unknown)
    let first_line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    match first_line {
        "sat" => Ok(RawAnswer::Sat),
        "unsat" => Ok(RawAnswer::Unsat),
        "unknown" => Ok(RawAnswer::Unknown(extract_unknown_reason(stdout, stderr))),
        "timeout" => Ok(RawAnswer::Unknown("timeout".to_string())),
        _ => Err(SolverError::ParseError(format!(
            "Unexpected solver output: {first_line}"
        ))),
    }
}

/// Extract the reason string for an "unknown" result.
fn extract_unknown_reason(stdout: &str, stderr: &str) -> String {
    // Z3 sometimes prints the reason after "unknown"
    let after_unknown = stdout
        .lines()
        .skip_while(|line| line.trim() != "unknown")
        .skip(1)
        .map(str::trim)
        .find(|line| !line.is_empty());

    if let Some(reason) = after_unknown {
        // Clean up parenthesized reasons like "(timeout)"
        reason
            .trim_start_matches('(')
            .trim_end_matches(')')
            .to_string()
    } else if !stderr.is_empty() {
        stderr.trim().to_string()
    } else {
        "unknown".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sat() {
        assert_eq!(parse_answer("sat\n", "").unwrap(), RawAnswer::Sat);
    }

    #[test]
    fn parses_unsat() {
        assert_eq!(parse_answer("unsat\n", "").unwrap(), RawAnswer::Unsat);
    }

    #[test]
    fn parses_unknown_with_reason() {
        let answer = parse_answer("unknown\n(incomplete)\n", "").unwrap();
        assert_eq!(answer, RawAnswer::Unknown("incomplete".to_string()));
    }

    #[test]
    fn parses_unknown_without_reason() {
        let answer = parse_answer("unknown\n", "").unwrap();
        assert_eq!(answer, RawAnswer::Unknown("unknown".to_string()));
    }

    #[test]
    fn skips_leading_blank_lines() {
        assert_eq!(parse_answer("\n\n  unsat\n", "").unwrap(), RawAnswer::Unsat);
    }

    #[test]
    fn timeout_line_is_unknown() {
        assert_eq!(
            parse_answer("timeout\n", "").unwrap(),
            RawAnswer::Unknown("timeout".to_string())
        );
    }

    #[test]
    fn empty_output_with_timeout_stderr() {
        assert_eq!(
            parse_answer("", "timeout reached").unwrap(),
            RawAnswer::Unknown("timeout".to_string())
        );
    }

    #[test]
    fn empty_output_is_parse_error() {
        assert!(matches!(
            parse_answer("", "fatal: something"),
            Err(SolverError::ParseError(_))
        ));
    }

    #[test]
    fn garbage_output_is_parse_error() {
        assert!(matches!(
            parse_answer("(error \"line 3: unknown sort\")", ""),
            Err(SolverError::ParseError(_))
        ));
    }
}
