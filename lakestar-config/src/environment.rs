use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Variable naming the environment whose override file is layered over `base`.
pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

/// Runtime environment of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

/// `APP_ENVIRONMENT` named neither `dev` nor `prod`.
#[derive(Debug, Error)]
#[error("unsupported environment `{0}`, expected `dev` or `prod`")]
pub struct UnknownEnvironment(String);

impl Environment {
    /// Reads [`ENVIRONMENT_VAR`]. An unset variable selects [`Environment::Dev`].
    pub fn from_env() -> Result<Self, UnknownEnvironment> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Stem of the override file, `prod` for `prod.yaml`.
    pub fn file_stem(self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(UnknownEnvironment(value.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!(" production ".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "staging".parse::<Environment>().unwrap_err();

        assert!(err.to_string().contains("`staging`"));
    }
}
