//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use visioncop_core::VisionError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Verification flagged a candidate (red severity) under `--strict`.
/// Maps to EX_DATAERR from sysexits.h.
pub const VERIFICATION_FLAGGED: i32 = 65;

/// Cannot open or decode an input image.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Cannot read or write the index file.
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Represents an exit code with optional error context.
#[derive(Debug, PartialEq, Eq)]
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Index file problems first: they wrap core errors too
        let code = if message.contains("index file") {
            IO_ERROR
        } else if let Some(vision) = err.chain().find_map(|e| e.downcast_ref::<VisionError>()) {
            match vision {
                VisionError::Decode { .. } | VisionError::Io { .. } | VisionError::Embedding(_) => {
                    INPUT_ERROR
                }
                VisionError::Store(_) | VisionError::Serialization(_) => IO_ERROR,
                VisionError::InvalidInput(_) => USAGE_ERROR,
                VisionError::Metadata(_) => GENERAL_ERROR,
            }
        } else if message.contains("Failed to read")
            || message.contains("No supported images")
            || message.contains("Not in the index")
        {
            INPUT_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_decode_error_is_input_error() {
        let err: anyhow::Result<()> = Err(VisionError::Decode {
            name: "x.jpg".into(),
            reason: "bad marker".into(),
        })
        .context("Failed to load query");
        assert_eq!(ExitCode::from_anyhow(&err.unwrap_err()).code, INPUT_ERROR);
    }

    #[test]
    fn test_index_file_error_is_io_error() {
        let err: anyhow::Result<()> = Err(VisionError::Serialization("eof".into()))
            .context("Failed to open index file visioncop-index.cbor");
        assert_eq!(ExitCode::from_anyhow(&err.unwrap_err()).code, IO_ERROR);
    }

    #[test]
    fn test_unknown_index_entry_is_input_error() {
        let err = anyhow::anyhow!("Not in the index: /tmp/gone.png");
        assert_eq!(ExitCode::from_anyhow(&err).code, INPUT_ERROR);
    }

    #[test]
    fn test_unknown_error_is_general() {
        let err = anyhow::anyhow!("something odd");
        let exit = ExitCode::from_anyhow(&err);
        assert_eq!(exit.code, GENERAL_ERROR);
        assert_eq!(exit.message.as_deref(), Some("something odd"));
    }
}
