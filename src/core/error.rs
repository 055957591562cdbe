//! Error types
//!
//! Every fallible call returns `OsResult<T>`; codes are stable so they can
//! be reported over a debug probe as plain integers.

/// Kernel and heartbeat error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum OsError {
    // ============ OS state errors ============
    /// OS is not running
    OsNotRunning = 24201,
    /// OS is already running
    OsRunning = 24202,
    /// OS not initialized
    OsNotInit = 24203,

    // ============ Priority errors ============
    /// Invalid priority
    PrioInvalid = 25203,

    // ============ Stack errors ============
    /// Invalid stack size
    StkSizeInvalid = 28208,

    // ============ Task errors ============
    /// Cannot create task from ISR
    TaskCreateIsr = 29002,

    // ============ Time errors ============
    /// Cannot delay from ISR
    TimeDlyIsr = 29301,

    // ============ Heartbeat errors ============
    /// A heartbeat is already running on this line
    HeartbeatAlreadyRunning = 35001,
    /// High or low period is zero
    HeartbeatPeriodInvalid = 35002,
    /// No free registry slot for another line
    HeartbeatRegistryFull = 35003,
}

/// Result type alias for kernel and heartbeat operations
pub type OsResult<T> = Result<T, OsError>;

impl OsError {
    /// Numeric code for this error
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// True for errors raised by the heartbeat service itself
    #[inline]
    pub fn is_heartbeat(self) -> bool {
        matches!(
            self,
            OsError::HeartbeatAlreadyRunning
                | OsError::HeartbeatPeriodInvalid
                | OsError::HeartbeatRegistryFull
        )
    }
}
