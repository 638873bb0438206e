use lakestar::error::EtlError;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Captured backtrace wrapper to avoid thiserror's unstable feature detection.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type of the runner binary.
///
/// Wraps [`EtlError`] for pipeline failures and adds variants for the setup around a run.
#[derive(Debug)]
pub enum RunnerError {
    /// Pipeline error.
    Etl(EtlError),
    /// Configuration or telemetry setup error.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// I/O error outside of the pipeline, e.g. while writing the metrics snapshot.
    Io(std::io::Error, CapturedBacktrace),
}

impl RunnerError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            RunnerError::Etl(_) => "pipeline error",
            RunnerError::Config(_, _) => "configuration error",
            RunnerError::Io(_, _) => "i/o error",
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            RunnerError::Etl(err) => err.backtrace(),
            RunnerError::Config(_, cb) => Some(&cb.0),
            RunnerError::Io(_, cb) => Some(&cb.0),
        }
    }

    /// Creates a configuration error from any error source.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        RunnerError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a user-oriented report for terminal output.
    ///
    /// Aggregated pipeline errors already list every failure in their display form, so the cause
    /// chain is only walked for single errors.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("lakestar run failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        if !matches!(self, RunnerError::Etl(err) if err.errors().is_some()) {
            let mut source = Error::source(self);
            let mut idx = 1usize;
            while let Some(err) = source {
                out.push_str(&format!("cause {idx}: {err}\n"));
                source = err.source();
                idx += 1;
            }
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::Etl(err) => write!(f, "{err}"),
            RunnerError::Config(source, _) => write!(f, "configuration error: {source}"),
            RunnerError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for RunnerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RunnerError::Etl(err) => err.source(),
            RunnerError::Config(source, _) => Some(source.as_ref()),
            RunnerError::Io(source, _) => Some(source),
        }
    }
}

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        RunnerError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<EtlError> for RunnerError {
    fn from(err: EtlError) -> Self {
        RunnerError::Etl(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakestar::error::ErrorKind;
    use lakestar::etl_error;
    use lakestar_config::shared::ValidationError;

    #[test]
    fn config_errors_report_their_cause() {
        let err = RunnerError::config(ValidationError::EmptyField("pipeline.input_root"));

        let report = err.render_report();

        assert_eq!(err.category(), "configuration error");
        assert!(report.starts_with("lakestar run failed\n"));
        assert!(report.contains("cause 1: `pipeline.input_root` cannot be empty"));
    }

    #[test]
    fn aggregated_pipeline_errors_list_every_failure() {
        let errors = vec![
            etl_error!(ErrorKind::WriteFailure, "Table write failed", "items"),
            etl_error!(ErrorKind::WriteFailure, "Table write failed", "events"),
        ];
        let err = RunnerError::from(EtlError::from(errors));

        let report = err.render_report();

        assert_eq!(err.category(), "pipeline error");
        assert!(report.contains("items"));
        assert!(report.contains("events"));
        assert!(!report.contains("cause 1"));
    }
}
