//! Extended-precision ("double-double") arithmetic.
//!
//! Every value here is an unevaluated sum of two `f64` components whose
//! binary representations do not overlap, so `hi + lo` represents the exact
//! mathematical result of the operation that produced it. The error-free
//! transforms follow the classic Dekker/Knuth constructions; the compound
//! operations keep enough of the low-order component that a sign test on
//! `hi` is reliable for the determinants built in
//! [`robust_predicates`](crate::geometry::robust_predicates).
//!
//! All functions are pure and total on finite inputs. Behavior on NaN or
//! infinite operands is unspecified and excluded from the contract.

/// A double-double value: the exact, non-overlapping sum `hi + lo`,
/// with `|lo| <= ulp(hi) / 2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dd {
    /// High-order (larger magnitude) component.
    pub hi: f64,
    /// Low-order roundoff component.
    pub lo: f64,
}

impl Dd {
    /// Wraps a plain `f64` as an exact double-double.
    #[inline]
    #[must_use]
    pub const fn from_f64(value: f64) -> Self {
        Self { hi: value, lo: 0.0 }
    }

    /// Collapses to a single `f64` (rounds once).
    #[inline]
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.hi + self.lo
    }
}

/// Veltkamp splitter for 53-bit doubles: `2^27 + 1`.
const SPLITTER: f64 = 134_217_729.0;

/// Splits `a` into `(hi, lo)` halves with at most 26 significant bits each,
/// such that `a == hi + lo` exactly.
#[inline]
fn split(a: f64) -> (f64, f64) {
    let c = SPLITTER * a;
    let hi = c - (c - a);
    let lo = a - hi;
    (hi, lo)
}

/// Error-free sum: returns `(s, e)` with `s = fl(a + b)` and `a + b == s + e`
/// exactly. No precondition on the operand magnitudes (Knuth two-sum).
#[inline]
#[must_use]
pub fn two_sum(a: f64, b: f64) -> Dd {
    let s = a + b;
    let bv = s - a;
    let av = s - bv;
    let e = (a - av) + (b - bv);
    Dd { hi: s, lo: e }
}

/// Error-free sum requiring `|a| >= |b|` (Dekker fast-two-sum). One branch
/// cheaper than [`two_sum`]; used to renormalize compound results whose
/// component ordering is already known.
#[inline]
#[must_use]
pub fn fast_two_sum(a: f64, b: f64) -> Dd {
    let s = a + b;
    let e = b - (s - a);
    Dd { hi: s, lo: e }
}

/// Error-free difference: `a - b == hi + lo` exactly.
#[inline]
#[must_use]
pub fn two_diff(a: f64, b: f64) -> Dd {
    let s = a - b;
    let bv = a - s;
    let av = s + bv;
    let e = (a - av) + (bv - b);
    Dd { hi: s, lo: e }
}

/// Error-free difference requiring `|a| >= |b|`.
#[inline]
#[must_use]
pub fn fast_two_diff(a: f64, b: f64) -> Dd {
    let s = a - b;
    let e = (a - s) - b;
    Dd { hi: s, lo: e }
}

/// Error-free product: `a * b == hi + lo` exactly, via Veltkamp splitting
/// (no FMA dependency).
#[inline]
#[must_use]
pub fn two_product(a: f64, b: f64) -> Dd {
    let p = a * b;
    let (ah, al) = split(a);
    let (bh, bl) = split(b);
    let e = al * bl - (((p - ah * bh) - al * bh) - ah * bl);
    Dd { hi: p, lo: e }
}

/// Error-free square: `a * a == hi + lo` exactly. Saves one split over
/// [`two_product`].
#[inline]
#[must_use]
pub fn two_square(a: f64) -> Dd {
    let p = a * a;
    let (ah, al) = split(a);
    let e = al * al - ((p - ah * ah) - (ah + ah) * al);
    Dd { hi: p, lo: e }
}

/// Double-double addition. The result is renormalized but not an exact
/// expansion of the four-component sum; the retained error is far below
/// the sign-test threshold needed by the predicates.
#[inline]
#[must_use]
pub fn dd_add(a: Dd, b: Dd) -> Dd {
    let s = two_sum(a.hi, b.hi);
    fast_two_sum(s.hi, s.lo + a.lo + b.lo)
}

/// Double-double subtraction.
#[inline]
#[must_use]
pub fn dd_diff(a: Dd, b: Dd) -> Dd {
    let s = two_diff(a.hi, b.hi);
    fast_two_sum(s.hi, s.lo + a.lo - b.lo)
}

/// Double-double multiplication.
#[inline]
#[must_use]
pub fn dd_mul(a: Dd, b: Dd) -> Dd {
    let p = two_product(a.hi, b.hi);
    fast_two_sum(p.hi, p.lo + a.hi * b.lo + a.lo * b.hi)
}

/// Double-double times scalar.
#[inline]
#[must_use]
pub fn dd_mul_f64(a: Dd, b: f64) -> Dd {
    let p = two_product(a.hi, b);
    fast_two_sum(p.hi, p.lo + a.lo * b)
}

/// Double-double square of a double-double.
#[inline]
#[must_use]
pub fn dd_square(a: Dd) -> Dd {
    let p = two_square(a.hi);
    fast_two_sum(p.hi, p.lo + 2.0 * a.hi * a.lo)
}
