//! Safety gate implementation
//!
//! Checks run in a fixed order and stop at the first failure. Simulation
//! bypasses every other check because it never opens the port.

use core::fmt;

/// Word the user must type to confirm a real write
pub const CONFIRMATION_TOKEN: &str = "WRITE";

/// Per-call input to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafetyContext<'a> {
    /// Caller has enabled real writes
    pub write_enabled: bool,
    /// Confirmation typed by the user, if any
    pub confirmation_token: Option<&'a str>,
    /// A human is present to be prompted for the token
    pub interactive: bool,
    /// Detected or user-selected radio model
    pub model_detected: &'a str,
    /// Radio region/firmware variant is known
    pub region_known: bool,
    /// Dry run: emit frames, never open the port
    pub simulate: bool,
}

/// What the gate allows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Permission {
    /// Dry run only
    Simulate,
    /// Real write to the radio
    Write,
}

/// Reasons a write is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyError {
    WriteDisabled,
    UnknownModel,
    UnknownRegion,
    ConfirmationMismatch,
}

impl fmt::Display for SafetyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyError::WriteDisabled => {
                f.write_str("writing is disabled, use simulation or enable writes")
            }
            SafetyError::UnknownModel => f.write_str("radio model is unknown"),
            SafetyError::UnknownRegion => f.write_str("radio region is unknown"),
            SafetyError::ConfirmationMismatch => {
                write!(f, "confirmation token must be {}", CONFIRMATION_TOKEN)
            }
        }
    }
}

impl core::error::Error for SafetyError {}

fn model_is_known(model: &str) -> bool {
    let model = model.trim();
    !model.is_empty() && !model.eq_ignore_ascii_case("unknown")
}

/// Evaluate the gate
pub fn require_write_permission(ctx: &SafetyContext<'_>) -> Result<Permission, SafetyError> {
    if ctx.simulate {
        return Ok(Permission::Simulate);
    }
    if !ctx.write_enabled {
        return Err(SafetyError::WriteDisabled);
    }
    if !model_is_known(ctx.model_detected) {
        return Err(SafetyError::UnknownModel);
    }
    if !ctx.region_known {
        return Err(SafetyError::UnknownRegion);
    }

    let confirmed = ctx
        .confirmation_token
        .map(|t| t.trim().eq_ignore_ascii_case(CONFIRMATION_TOKEN))
        .unwrap_or(false);
    if !confirmed {
        return Err(SafetyError::ConfirmationMismatch);
    }

    Ok(Permission::Write)
}
