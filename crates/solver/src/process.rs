use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::parser::{parse_answer, RawAnswer};

/// Generic CLI-based CHC solver interface.
///
/// Communicates with any SMT-LIB2 compatible Horn solver (Z3, Eldarica,
/// CVC5) by spawning it as a subprocess and piping SMT-LIB2 text.
#[derive(Debug)]
pub struct CliSolver {
    config: SolverConfig,
}

impl CliSolver {
    /// Create a new `CliSolver` with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Get the solver kind.
    pub fn kind(&self) -> crate::config::SolverKind {
        self.config.kind
    }

    /// Run the solver on a raw SMT-LIB2 script and parse its verdict.
    pub fn run(&self, smtlib: &str) -> Result<RawAnswer, SolverError> {
        self.config.validate()?;

        let args = self.config.build_args();
        let solver_name = self.config.kind.to_string();

        // Spawn solver process
        let mut child = Command::new(&self.config.solver_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SolverError::ProcessError(format!("Failed to start {solver_name}: {e}"))
            })?;

        // Write SMT-LIB to stdin and close it so the solver sees EOF
        {
            let mut stdin = child.stdin.take().ok_or_else(|| {
                SolverError::ProcessError(format!("Failed to open {solver_name} stdin"))
            })?;
            stdin.write_all(smtlib.as_bytes()).map_err(|e| {
                SolverError::ProcessError(format!("Failed to write to {solver_name} stdin: {e}"))
            })?;
            // stdin is dropped here, closing the pipe and signaling EOF to the solver
        }

        // If a timeout is configured, enforce it at the OS level via a background
        // thread. A solver's internal timeout flag is a heuristic: it can be
        // ignored on hard Horn problems, and without an OS-level timeout the
        // calling thread blocks in wait_with_output() indefinitely.
        let timeout_ms = self.config.timeout_ms;
        if timeout_ms > 0 {
            // Capture the OS PID before moving `child` into the background
            // thread so the process can be killed by PID when the OS-level
            // timeout fires.
            let child_pid = child.id();

            let (tx, rx) = mpsc::channel();
            let handle = std::thread::spawn(move || {
                let result = child.wait_with_output();
                // Send result; ignore send error if receiver timed out and dropped
                let _ = tx.send(result);
            });

            // Give the solver 3x its configured timeout so its own timeout can
            // fire first, with a 10 second floor for tiny limits.
            let os_timeout_ms = (timeout_ms * 3).max(10_000);
            match rx.recv_timeout(Duration::from_millis(os_timeout_ms)) {
                Ok(wait_result) => {
                    let output = wait_result.map_err(|e| {
                        SolverError::ProcessError(format!("Failed to wait for {solver_name}: {e}"))
                    })?;
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    let _ = handle.join();
                    parse_answer(&stdout, &stderr)
                }
                Err(_) => {
                    // OS-level timeout expired. Kill the solver process by PID;
                    // the background thread unblocks once the child exits.
                    kill_process(child_pid);
                    let _ = handle.join();
                    Ok(RawAnswer::Unknown(format!(
                        "OS-level timeout: {solver_name} killed after {os_timeout_ms}ms"
                    )))
                }
            }
        } else {
            let output = child.wait_with_output().map_err(|e| {
                SolverError::ProcessError(format!("Failed to wait for {solver_name}: {e}"))
            })?;

            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            parse_answer(&stdout, &stderr)
        }
    }
}

/// Kill a solver process by PID, for timeouts its own flag did not honor.
/// Failure is ignored: killing an already-exited process is a no-op.
fn kill_process(pid: u32) {
    #[cfg(unix)]
    {
        // Safety: plain FFI call. The pid comes from a child we spawned;
        // ESRCH on an already-dead process is harmless.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGKILL);
        }
    }
    #[cfg(windows)]
    {
        use windows_sys::Win32::Foundation::CloseHandle;
        use windows_sys::Win32::System::Threading::{
            OpenProcess, TerminateProcess, PROCESS_TERMINATE,
        };
        // Safety: the handle is validated before use and closed after.
        unsafe {
            let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
            if handle != 0 {
                TerminateProcess(handle, 1);
                CloseHandle(handle);
            }
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        // No kill primitive here; the orphan is left to the OS.
        let _ = pid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverKind;
    use std::path::PathBuf;

    #[test]
    fn run_with_missing_binary_fails() {
        let solver = CliSolver::new(SolverConfig::new(
            SolverKind::Z3,
            PathBuf::from("/nonexistent/z3"),
        ));
        let err = solver.run("(check-sat)\n").unwrap_err();
        assert!(matches!(err, SolverError::NotFound(..)));
    }

    #[test]
    fn config_accessors() {
        let solver = CliSolver::new(
            SolverConfig::new(SolverKind::Eldarica, PathBuf::from("/usr/bin/eld"))
                .with_timeout(2500),
        );
        assert_eq!(solver.kind(), SolverKind::Eldarica);
        assert_eq!(solver.config().timeout_ms, 2500);
    }
}
