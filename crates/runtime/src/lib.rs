//! rustburg-runtime: the small algebra generated matchers are written against.
//!
//! Generated code builds candidate covers as [`Nt`] values, folds them with
//! [`choice`], and guards literal pattern positions with [`matches`]. The
//! only state a candidate carries is its [`Cost`] and a thunk producing the
//! semantic value of the cover.

use std::fmt;
use std::ops::Add;
use std::rc::Rc;

// ──────────────────────────────────────────────
// Cost
// ──────────────────────────────────────────────

/// A non-negative rule cost.
///
/// Addition saturates, so [`Cost::INFINITY`] is absorbing: adding anything
/// to an infinite cost stays infinite, and `INFINITY` compares greater than
/// every finite cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cost(u32);

impl Cost {
    pub const ZERO: Cost = Cost(0);
    pub const INFINITY: Cost = Cost(u32::MAX);

    /// True for every cost except [`Cost::INFINITY`].
    pub fn is_finite(self) -> bool {
        self != Cost::INFINITY
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0.saturating_add(rhs.0))
    }
}

/// Dynamic cost expressions in specifications evaluate to `i64`; negative
/// results clamp to zero so the algebra stays non-negative.
impl From<i64> for Cost {
    fn from(n: i64) -> Cost {
        if n < 0 {
            Cost::ZERO
        } else {
            Cost(u32::try_from(n).unwrap_or(u32::MAX - 1))
        }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_finite() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "inf")
        }
    }
}

// ──────────────────────────────────────────────
// Candidates
// ──────────────────────────────────────────────

/// The thunk half of a candidate. `Rc` so candidates stay cloneable without
/// requiring `T: Clone`.
pub type Action<T> = Rc<dyn Fn() -> T>;

/// A candidate cover: what it costs, and how to build its value.
pub struct Nt<T> {
    pub cost: Cost,
    pub action: Action<T>,
}

impl<T> Clone for Nt<T> {
    fn clone(&self) -> Self {
        Nt {
            cost: self.cost,
            action: Rc::clone(&self.action),
        }
    }
}

impl<T> fmt::Debug for Nt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nt").field("cost", &self.cost).finish()
    }
}

impl<T> Nt<T> {
    pub fn new(cost: Cost, action: impl Fn() -> T + 'static) -> Nt<T> {
        Nt {
            cost,
            action: Rc::new(action),
        }
    }

    /// The maximally expensive candidate. Its action is the "no cover"
    /// sentinel: it only runs when a subject tree admitted no finite-cost
    /// cover, which is a client-side usage error.
    pub fn infinity() -> Nt<T> {
        Nt {
            cost: Cost::INFINITY,
            action: Rc::new(|| panic!("no cover for subject tree")),
        }
    }
}

/// Select the cheapest candidate. Ties keep the earliest element, so rule
/// order in the specification breaks ties deterministically. An empty list
/// yields the infinite candidate.
pub fn choice<T>(candidates: Vec<Nt<T>>) -> Nt<T> {
    candidates
        .into_iter()
        .min_by_key(|nt| nt.cost)
        .unwrap_or_else(Nt::infinity)
}

/// Literal-position guard: cost zero when the runtime value equals the
/// pattern literal, infinite otherwise.
pub fn matches<A, B>(literal: &A, value: &B) -> Nt<()>
where
    A: PartialEq<B> + ?Sized,
    B: ?Sized,
{
    if literal == value {
        Nt::new(Cost::ZERO, || ())
    } else {
        Nt::infinity()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
