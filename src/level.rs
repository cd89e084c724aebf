use std::fmt;

use crate::error::Error;

/// Windows mandatory integrity levels, ordered from least to most trusted.
///
/// Each level is bound 1:1 to a mandatory-label SID under the `S-1-16`
/// authority; the final RID encodes the level. `MediumPlus` sits between
/// `Medium` and `High` and is rarely seen in the wild, but the mapping is
/// total over all eight values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntegrityLevel {
    Untrusted,
    Low,
    Medium,
    MediumPlus,
    High,
    System,
    Protected,
    Secure,
}

impl IntegrityLevel {
    /// All eight levels in ascending order of trust.
    pub const ALL: [IntegrityLevel; 8] = [
        IntegrityLevel::Untrusted,
        IntegrityLevel::Low,
        IntegrityLevel::Medium,
        IntegrityLevel::MediumPlus,
        IntegrityLevel::High,
        IntegrityLevel::System,
        IntegrityLevel::Protected,
        IntegrityLevel::Secure,
    ];

    /// Returns the canonical string form of this level's mandatory-label SID.
    pub fn sid_string(self) -> &'static str {
        match self {
            IntegrityLevel::Untrusted => "S-1-16-0",
            IntegrityLevel::Low => "S-1-16-4096",
            IntegrityLevel::Medium => "S-1-16-8192",
            IntegrityLevel::MediumPlus => "S-1-16-8448",
            IntegrityLevel::High => "S-1-16-12288",
            IntegrityLevel::System => "S-1-16-16384",
            IntegrityLevel::Protected => "S-1-16-20480",
            IntegrityLevel::Secure => "S-1-16-28672",
        }
    }

    /// Returns the lowercase name reported for this level.
    pub fn name(self) -> &'static str {
        match self {
            IntegrityLevel::Untrusted => "untrusted",
            IntegrityLevel::Low => "low",
            IntegrityLevel::Medium => "medium",
            IntegrityLevel::MediumPlus => "medium_plus",
            IntegrityLevel::High => "high",
            IntegrityLevel::System => "system",
            IntegrityLevel::Protected => "protected",
            IntegrityLevel::Secure => "secure",
        }
    }

    /// Resolves a SID string against the fixed mandatory-level table.
    ///
    /// # Parameters
    ///
    /// * `sid` - A SID in string form (e.g. `S-1-16-8192`).
    ///
    /// # Returns
    ///
    /// * `Ok(IntegrityLevel)` - The level bound to that SID.
    /// * `Err(Error::UnknownIntegrityLevel)` - If the SID is not one of the
    ///   eight mandatory-level SIDs. The offending text is carried in the
    ///   error; no SID is ever silently mapped to a default level.
    pub fn from_sid_string(sid: &str) -> Result<Self, Error> {
        match sid {
            "S-1-16-0" => Ok(IntegrityLevel::Untrusted),
            "S-1-16-4096" => Ok(IntegrityLevel::Low),
            "S-1-16-8192" => Ok(IntegrityLevel::Medium),
            "S-1-16-8448" => Ok(IntegrityLevel::MediumPlus),
            "S-1-16-12288" => Ok(IntegrityLevel::High),
            "S-1-16-16384" => Ok(IntegrityLevel::System),
            "S-1-16-20480" => Ok(IntegrityLevel::Protected),
            "S-1-16-28672" => Ok(IntegrityLevel::Secure),
            other => Err(Error::UnknownIntegrityLevel(other.to_string())),
        }
    }
}

impl fmt::Display for IntegrityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
