//! Size Gate Module
//!
//! Post-encode check deciding whether an encode is a regression.

/// Result of the size gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeGateResult {
    /// Output is the same size or smaller than the input
    Accept,
    /// Output is strictly larger than the input
    Reject {
        input_bytes: u64,
        output_bytes: u64,
    },
}

impl SizeGateResult {
    pub fn is_regression(&self) -> bool {
        matches!(self, SizeGateResult::Reject { .. })
    }
}

/// Check if the encoded output passes the size gate.
///
/// Returns `Reject` only if `output_bytes > input_bytes`. Equal sizes are
/// accepted.
pub fn check_size_gate(input_bytes: u64, output_bytes: u64) -> SizeGateResult {
    if output_bytes > input_bytes {
        SizeGateResult::Reject {
            input_bytes,
            output_bytes,
        }
    } else {
        SizeGateResult::Accept
    }
}
