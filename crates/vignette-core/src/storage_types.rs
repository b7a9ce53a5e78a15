use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Asset store backend types
///
/// Defined in core because it's used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Postgres => write!(f, "postgres"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backends_case_insensitively() {
        assert_eq!("LOCAL".parse::<StorageBackend>().unwrap(), StorageBackend::Local);
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("postgresql".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert!("s3".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn displays_lowercase_names() {
        assert_eq!(StorageBackend::Postgres.to_string(), "postgres");
        assert_eq!(StorageBackend::Local.to_string(), "local");
    }
}
