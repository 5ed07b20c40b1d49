//! Field Value Sets
//!
//! A capability field holds either a single fixed value, an inclusive range,
//! or an explicit list of alternatives. Intersection and fixation operate on
//! these three shapes.
//!
//! # Examples
//!
//! ```rust
//! use stillsrc_caps::{Fraction, ValueSet};
//!
//! let sensor = ValueSet::range(320u32, 4096);
//! let sink = ValueSet::List(vec![240, 640, 1600]);
//!
//! let common = sensor.intersect(&sink).expect("overlap");
//! assert_eq!(common, ValueSet::List(vec![640, 1600]));
//! assert_eq!(common.fixate_nearest(1200), 1600);
//!
//! let rates = ValueSet::range(Fraction::from_integer(5), Fraction::from_integer(30));
//! assert_eq!(rates.fixate_nearest(Fraction::from_integer(60)), Fraction::from_integer(30));
//! ```

use std::cmp::Ordering;
use std::fmt;

/// Frame rate expressed as a reduced fraction
///
/// The denominator is never zero and the fraction is stored in lowest terms,
/// so `60/2` and `30/1` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    numer: u32,
    denom: u32,
}

impl Fraction {
    /// Create a fraction, reducing it to lowest terms
    ///
    /// Returns `None` when `denom` is zero.
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Option<Self> {
        if denom == 0 {
            return None;
        }

        let divisor = gcd(numer, denom);
        Some(Self {
            numer: numer / divisor,
            denom: denom / divisor,
        })
    }

    /// Create a whole-number fraction (`value/1`)
    #[must_use]
    pub const fn from_integer(value: u32) -> Self {
        Self { numer: value, denom: 1 }
    }

    /// Numerator
    #[must_use]
    pub const fn numer(&self) -> u32 {
        self.numer
    }

    /// Denominator (never zero)
    #[must_use]
    pub const fn denom(&self) -> u32 {
        self.denom
    }

    /// Approximate value as a float
    #[must_use]
    pub fn to_f64(self) -> f64 {
        f64::from(self.numer) / f64::from(self.denom)
    }
}

const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let rem = a % b;
        a = b;
        b = rem;
    }
    a
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u64::from(self.numer) * u64::from(other.denom);
        let rhs = u64::from(other.numer) * u64::from(self.denom);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}

/// Distance metric used when fixating a field to the nearest value
pub trait Nearest: Copy {
    /// Absolute distance between `self` and `target`
    fn distance(&self, target: &Self) -> f64;
}

impl Nearest for u32 {
    fn distance(&self, target: &Self) -> f64 {
        (f64::from(*self) - f64::from(*target)).abs()
    }
}

impl Nearest for Fraction {
    fn distance(&self, target: &Self) -> f64 {
        (self.to_f64() - target.to_f64()).abs()
    }
}

/// Set of acceptable values for one capability field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSet<T> {
    /// Exactly one value
    Fixed(T),

    /// Every value between `min` and `max`, inclusive
    Range {
        /// Lower bound
        min: T,
        /// Upper bound
        max: T,
    },

    /// Explicit alternatives, in preference order
    List(Vec<T>),
}

impl<T: Copy + Ord> ValueSet<T> {
    /// Create a range, collapsing `min == max` to [`ValueSet::Fixed`]
    #[must_use]
    pub fn range(min: T, max: T) -> Self {
        if min == max {
            Self::Fixed(min)
        } else {
            Self::Range { min, max }
        }
    }

    /// Build a set from alternatives
    ///
    /// Returns `None` for no values and [`ValueSet::Fixed`] for a single one.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let mut values: Vec<T> = values.into_iter().collect();
        match values.len() {
            0 => None,
            1 => values.pop().map(Self::Fixed),
            _ => Some(Self::List(values)),
        }
    }

    /// Whether the set pins a single value
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// The pinned value, if fixed
    #[must_use]
    pub fn fixed_value(&self) -> Option<T> {
        match self {
            Self::Fixed(value) => Some(*value),
            _ => None,
        }
    }

    /// Whether `value` is a member of the set
    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        match self {
            Self::Fixed(fixed) => *fixed == value,
            Self::Range { min, max } => value >= *min && value <= *max,
            Self::List(values) => values.contains(&value),
        }
    }

    /// Values accepted by both sets, or `None` if they are disjoint
    ///
    /// List order follows `self` where `self` is a list, otherwise `other`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Fixed(value), _) => other.contains(*value).then_some(Self::Fixed(*value)),
            (_, Self::Fixed(value)) => self.contains(*value).then_some(Self::Fixed(*value)),
            (Self::Range { min: a_min, max: a_max }, Self::Range { min: b_min, max: b_max }) => {
                let lower = (*a_min).max(*b_min);
                let upper = (*a_max).min(*b_max);
                (lower <= upper).then(|| Self::range(lower, upper))
            }
            (Self::List(values), _) => Self::from_values(values.iter().copied().filter(|v| other.contains(*v))),
            (Self::Range { .. }, Self::List(values)) => {
                Self::from_values(values.iter().copied().filter(|v| self.contains(*v)))
            }
        }
    }

    /// Resolve the set to the member closest to `target`
    ///
    /// Ranges clamp the target; lists pick the closest entry, the earliest
    /// one on ties.
    #[must_use]
    pub fn fixate_nearest(&self, target: T) -> T
    where
        T: Nearest,
    {
        match self {
            Self::Fixed(value) => *value,
            Self::Range { min, max } => {
                if target < *min {
                    *min
                } else if target > *max {
                    *max
                } else {
                    target
                }
            }
            Self::List(values) => values
                .iter()
                .copied()
                .min_by(|a, b| a.distance(&target).total_cmp(&b.distance(&target)))
                .unwrap_or(target),
        }
    }
}

impl<T: fmt::Display> fmt::Display for ValueSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => write!(f, "{value}"),
            Self::Range { min, max } => write!(f, "[{min}, {max}]"),
            Self::List(values) => {
                f.write_str("{")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("}")
            }
        }
    }
}
