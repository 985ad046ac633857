//! Authority precedence between the three position writers.
//!
//! | Source | Accepted when | Authority afterwards |
//! |--------|---------------|----------------------|
//! | external telemetry | always | `External` |
//! | manual override | always | `Local` |
//! | simulator | authority is `Local`, motion enabled, mode `Automatic` | unchanged |
//!
//! External telemetry re-taints a truck on its next message even after a
//! fresh manual override. A rejected proposal has no side effect and is not
//! retried.

use serde::{Deserialize, Serialize};

/// Which writer currently owns a truck's position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Authority {
    #[default]
    Local,
    External,
}

/// Operator-selected driving mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    #[default]
    Automatic,
    Manual,
}

/// Producer of a proposed update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSource {
    External,
    Manual,
    Simulated,
}

/// The slice of truck state the arbitration rule looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TruckControl {
    pub authority: Authority,
    pub mode: OperatingMode,
    pub motion_enabled: bool,
}

impl TruckControl {
    /// Whether the local simulator may move this truck right now.
    pub fn simulation_eligible(&self) -> bool {
        self.authority == Authority::Local
            && self.motion_enabled
            && self.mode == OperatingMode::Automatic
    }
}

/// Why a simulated proposal was refused. Not an error; the proposal is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipConflict {
    /// External telemetry owns the truck.
    ExternalAuthority,
    /// Local motion is switched off for the truck.
    MotionDisabled,
    /// The truck is in manual mode.
    ManualMode,
}

/// Decide whether `source` may write the truck, returning the authority to
/// record on acceptance.
pub fn arbitrate(source: UpdateSource, control: &TruckControl) -> Result<Authority, OwnershipConflict> {
    match source {
        UpdateSource::External => Ok(Authority::External),
        UpdateSource::Manual => Ok(Authority::Local),
        UpdateSource::Simulated => {
            if control.authority == Authority::External {
                Err(OwnershipConflict::ExternalAuthority)
            } else if !control.motion_enabled {
                Err(OwnershipConflict::MotionDisabled)
            } else if control.mode == OperatingMode::Manual {
                Err(OwnershipConflict::ManualMode)
            } else {
                Ok(control.authority)
            }
        }
    }
}
