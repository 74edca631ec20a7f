/// Centralized logging macros for the capture driver
///
/// These macros provide consistent logging across components with:
/// - Output through the `log` facade (the embedding application picks the logger)
/// - Consistent formatting with component context
///
/// Log debug-level message
///
/// # Example
/// ```
/// use capture_runtime::tnc_debug;
/// tnc_debug!("CaptureSession: read {} bytes", 12);
/// ```
#[macro_export]
macro_rules! tnc_debug {
    ($($arg:tt)*) => {
        $crate::log::debug!($($arg)*)
    };
}

/// Log info-level message
///
/// Use for lifecycle changes (started, stopped) and user-facing events
#[macro_export]
macro_rules! tnc_info {
    ($($arg:tt)*) => {
        $crate::log::info!($($arg)*)
    };
}

/// Log warning-level message
///
/// Use for recoverable errors and unexpected conditions
#[macro_export]
macro_rules! tnc_warn {
    ($($arg:tt)*) => {
        $crate::log::warn!($($arg)*)
    };
}

/// Log error-level message
///
/// Use for failures that need operator attention
#[macro_export]
macro_rules! tnc_error {
    ($($arg:tt)*) => {
        $crate::log::error!($($arg)*)
    };
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    #[test]
    fn test_logging_macros_compile() {
        tnc_debug!("test debug");
        tnc_info!("test info");
        tnc_warn!("test warn");
        tnc_error!("test error");
    }

    #[test]
    fn test_logging_with_format_args() {
        tnc_debug!("Received serial data: {:02x?}", [0xc0u8, 0x00]);
        tnc_info!("Port opened at {} baud", 9600);
        tnc_warn!("Dropped {} frames", 3);
        tnc_error!("Error opening serial port: {}", "Access denied");
    }
}
