use derive_more as dm;
use std::fmt;

use crate::{EPSILON, about_eq, about_eq_hash};

/// Multiplier, used for scale factors like the screen density and the image decode scale.
///
/// Init with the `2.fct()` suffix method from [`FactorUnits`].
///
/// Compares and hashes with [`about_eq`] tolerance (`0.00001`), so scales that only differ by float
/// rounding are the same image key, while any visible difference is a different key.
#[derive(Copy, Clone, dm::Add, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Factor(pub f32);
impl Default for Factor {
    fn default() -> Self {
        Factor(1.0)
    }
}
impl std::hash::Hash for Factor {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        about_eq_hash(self.0, EPSILON, state)
    }
}
impl PartialEq for Factor {
    fn eq(&self, other: &Self) -> bool {
        about_eq(self.0, other.0, EPSILON)
    }
}
impl Eq for Factor {}
impl fmt::Debug for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.debug_tuple("Factor").field(&self.0).finish()
        } else {
            write!(f, "{}.fct()", self.0)
        }
    }
}
impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<f32> for Factor {
    fn from(f: f32) -> Self {
        Factor(f)
    }
}

/// Extension methods for initializing factor units.
///
/// # Examples
///
/// ```
/// # use zng_unit::*;
/// let density = 2.fct();
/// assert_eq!(Factor(2.0), density);
/// ```
pub trait FactorUnits {
    /// Factor in the `0.0..=1.0` range, or any scale.
    fn fct(self) -> Factor;
}
impl FactorUnits for f32 {
    fn fct(self) -> Factor {
        Factor(self)
    }
}
impl FactorUnits for i32 {
    fn fct(self) -> Factor {
        Factor(self as f32)
    }
}
