use std::fmt;

/// The main error type for the daltonlens crate
#[derive(Debug)]
pub enum DaltonlensError {
    /// Error occurred while reading or decoding an image
    ImageDecode(image::ImageError),

    /// Error occurred while writing or encoding an image
    ImageEncode(image::ImageError),

    /// Error occurred during I/O operations (file read/write)
    Io(std::io::Error),

    /// Malformed or inconsistent process configuration
    Config(String),

    /// No GPU adapter on this system, or the crate was built without `gpu`
    GpuUnavailable,

    /// Device creation, submission or readback failed
    Gpu(String),
}

impl fmt::Display for DaltonlensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaltonlensError::ImageDecode(e) => write!(f, "Image decode error: {}", e),
            DaltonlensError::ImageEncode(e) => write!(f, "Image encode error: {}", e),
            DaltonlensError::Io(e) => write!(f, "I/O error: {}", e),
            DaltonlensError::Config(msg) => write!(f, "Config error: {}", msg),
            DaltonlensError::GpuUnavailable => write!(f, "No GPU adapter available"),
            DaltonlensError::Gpu(msg) => write!(f, "GPU error: {}", msg),
        }
    }
}

impl std::error::Error for DaltonlensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DaltonlensError::ImageDecode(e) | DaltonlensError::ImageEncode(e) => Some(e),
            DaltonlensError::Io(e) => Some(e),
            _ => None,
        }
    }
}

// From implementations for automatic conversion from common error types

impl From<image::ImageError> for DaltonlensError {
    fn from(err: image::ImageError) -> Self {
        // Distinguish between decode and encode errors based on the error kind
        match &err {
            image::ImageError::Encoding(_) => DaltonlensError::ImageEncode(err),
            _ => DaltonlensError::ImageDecode(err),
        }
    }
}

impl From<std::io::Error> for DaltonlensError {
    fn from(err: std::io::Error) -> Self {
        DaltonlensError::Io(err)
    }
}

impl From<json::Error> for DaltonlensError {
    fn from(err: json::Error) -> Self {
        DaltonlensError::Config(err.to_string())
    }
}

// Convenience type alias for Results using DaltonlensError
pub type Result<T = ()> = std::result::Result<T, DaltonlensError>;

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_io_error_keeps_source() {
        let err: DaltonlensError = std::io::Error::other("disk on fire").into();
        assert!(err.to_string().starts_with("I/O error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_json_error_becomes_config_error() {
        let err: DaltonlensError = json::parse("{ nope").unwrap_err().into();
        assert!(matches!(err, DaltonlensError::Config(_)));
        assert!(err.source().is_none());
    }
}
