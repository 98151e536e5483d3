use std::fmt;

#[derive(Debug)]
pub enum AppError {
    FileAccess(String),
    ColumnIndex(String),
    ParseError(String),
    ValidationError(String),
    ConfigError(String),
    SecurityError(String),
    DatabaseError(String),
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::FileAccess(msg) => write!(f, "File access error: {}", msg),
            AppError::ColumnIndex(msg) => write!(f, "Column index error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::SecurityError(msg) => write!(f, "Security error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes_variant() {
        let err = AppError::FileAccess("missing.csv".to_string());
        assert_eq!(err.to_string(), "File access error: missing.csv");

        let err = AppError::ColumnIndex("row 3".to_string());
        assert_eq!(err.to_string(), "Column index error: row 3");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::IoError(ref msg) if msg == "boom"));
    }
}
