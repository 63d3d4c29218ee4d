use core::fmt::Debug;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{GpcError, GpcResult};

/// The identifier of an HPO term, e.g. `HP:0001250`
///
/// Only the numerical part is stored, the `HP:` prefix is added
/// when the id is displayed or serialized.
///
/// # Examples
///
/// ```
/// use phenocorr::HpoTermId;
///
/// let seizure = HpoTermId::try_from("HP:0001250").unwrap();
/// assert_eq!(seizure.as_u32(), 1250);
/// assert_eq!(seizure.to_string(), "HP:0001250");
/// assert_eq!(seizure, HpoTermId::from(1250u32));
///
/// assert!(HpoTermId::try_from("HP:abc").is_err());
/// assert!(HpoTermId::try_from("XY:0001250").is_err());
/// ```
#[derive(Copy, Clone, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HpoTermId {
    inner: u32,
}

impl HpoTermId {
    /// Constructs an `HpoTermId` from its numerical part
    ///
    /// Identical to `HpoTermId::from(u32)`, but usable in `const` context
    pub const fn new(inner: u32) -> Self {
        Self { inner }
    }

    /// Returns the integer representation of the id
    pub fn as_u32(&self) -> u32 {
        self.inner
    }

    /// Returns the memory representation of the inner integer in big-endian byte order
    pub fn to_be_bytes(&self) -> [u8; 4] {
        self.inner.to_be_bytes()
    }
}

impl TryFrom<&str> for HpoTermId {
    type Error = GpcError;
    fn try_from(s: &str) -> GpcResult<Self> {
        let digits = s
            .strip_prefix("HP:")
            .ok_or_else(|| GpcError::InvalidTerm(s.to_string()))?;
        if digits.is_empty() {
            return Err(GpcError::InvalidTerm(s.to_string()));
        }
        Ok(HpoTermId {
            inner: digits.parse::<u32>()?,
        })
    }
}

impl TryFrom<String> for HpoTermId {
    type Error = GpcError;
    fn try_from(s: String) -> GpcResult<Self> {
        HpoTermId::try_from(s.as_str())
    }
}

impl From<HpoTermId> for String {
    fn from(id: HpoTermId) -> Self {
        id.to_string()
    }
}

impl From<u32> for HpoTermId {
    fn from(inner: u32) -> Self {
        Self { inner }
    }
}

impl Debug for HpoTermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HpoTermId({self})")
    }
}

impl Display for HpoTermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HP:{:07}", self.inner)
    }
}

impl PartialEq<str> for HpoTermId {
    fn eq(&self, other: &str) -> bool {
        HpoTermId::try_from(other).map_or(false, |id| *self == id)
    }
}
