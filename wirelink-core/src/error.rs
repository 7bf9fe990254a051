//! Transfer errors

/// Errors reported by device handle operations
///
/// Variants carry no payload. Byte counts and bus status codes are
/// only reported through the `defmt` log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// Transfer attempted before `initialize()` succeeded
    NotInitialized,
    /// Bus driver refused to start
    BusRefusedStart,
    /// Bus accepted fewer bytes than requested
    ShortWrite,
    /// Bus reported a failure status when ending a transaction
    TransactionEnd,
    /// No bytes were staged within the timeout window
    SegmentTimeout,
    /// Staged byte count differs from the requested segment length
    SegmentLengthMismatch,
    /// Bus cannot change clock speed after construction
    UnsupportedClockChange,
}

impl core::fmt::Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            TransferError::NotInitialized => "device not initialized",
            TransferError::BusRefusedStart => "bus refused to start",
            TransferError::ShortWrite => "bus accepted fewer bytes than requested",
            TransferError::TransactionEnd => "bus reported an error ending the transaction",
            TransferError::SegmentTimeout => "no data received before timeout",
            TransferError::SegmentLengthMismatch => "received byte count does not match request",
            TransferError::UnsupportedClockChange => "bus clock cannot be changed",
        };
        f.write_str(msg)
    }
}
