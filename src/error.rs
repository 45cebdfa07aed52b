use thiserror::Error;

/// Why a picked file was refused. The display text is shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a file")]
    NoFile,

    #[error("Please select a CSV file")]
    NotCsv,

    #[error("File size must be less than {}", format_limit(.limit))]
    TooLarge { size: u64, limit: u64 },
}

/// Upload limit in the largest unit that divides it exactly.
fn format_limit(limit: &u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    match *limit {
        0 => "0 bytes".to_string(),
        l if l % MIB == 0 => format!("{}MB", l / MIB),
        l if l % KIB == 0 => format!("{}KB", l / KIB),
        l => format!("{} bytes", l),
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Non-2xx response, unreadable body, or transport failure.
    #[error("{0}")]
    Request(String),
}

pub const FALLBACK_PROCESS_ERROR: &str = "Failed to process file";
pub const FALLBACK_GENERATE_ERROR: &str = "Failed to generate map";
pub const FALLBACK_REQUEST_ERROR: &str = "An error occurred while processing your request";

impl ClientError {
    /// Request error carrying `message`, or the generic text when it is blank.
    pub fn request(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            ClientError::Request(FALLBACK_REQUEST_ERROR.to_string())
        } else {
            ClientError::Request(message)
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::request(err.to_string())
    }
}
