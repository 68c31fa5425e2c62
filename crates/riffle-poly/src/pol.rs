//! The `Pol` value type and its GF(2)[X] operations.

use std::fmt;
use std::io::Read;
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PolError;

/// Degree of every chunking polynomial: the largest prime below 64 − 8.
///
/// Eight spare bits above the degree let the rolling hash fold one whole
/// input byte per table lookup.
pub const CHUNKING_DEGREE: i64 = 53;

/// The default chunking polynomial (degree 53, irreducible).
pub const DEFAULT_POLYNOMIAL: Pol = Pol::new(0x3DA3358B4DC173);

/// Candidate budget for [`Pol::derive`] before giving up.
const DERIVE_MAX_TRIES: usize = 1_000_000;

/// A polynomial over GF(2), one coefficient per bit.
///
/// Bit `i` holds the coefficient of `x^i`, so `Pol::new(0b101)` is
/// `x^2 + 1`. Addition is XOR and multiplication is carry-less, which is
/// what makes the type a good fingerprint domain. Values are immutable;
/// every operation returns a new `Pol`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pol(u64);

impl Pol {
    /// The zero polynomial.
    pub const ZERO: Pol = Pol(0);

    /// The unit polynomial.
    pub const ONE: Pol = Pol(1);

    /// Creates a polynomial from its coefficient bits.
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the coefficient bits.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns the degree, or −1 for the zero polynomial.
    pub const fn deg(self) -> i64 {
        63 - self.0.leading_zeros() as i64
    }

    /// Returns the sum `self + y` (coefficient-wise XOR).
    pub const fn add(self, y: Pol) -> Pol {
        Pol(self.0 ^ y.0)
    }

    /// Returns the product `self · y`.
    ///
    /// A power-of-two `y` degenerates to a left shift. Panics when the
    /// product would not fit 64 bits; overflow is detected by checking
    /// `(self · y) / y == self`.
    pub fn mul(self, y: Pol) -> Pol {
        if self.0 == 0 || y.0 == 0 {
            return Pol::ZERO;
        }

        if y.0 & (y.0 - 1) == 0 {
            if self.deg() + y.deg() >= 64 {
                panic!("polynomial multiplication overflows 64 bits");
            }
            return Pol(self.0 << y.deg());
        }

        let mut p = Pol::ZERO;
        for i in 0..=y.deg() {
            if y.0 & (1 << i) != 0 {
                p = p.add(Pol(self.0 << i));
            }
        }

        if p.div(y) != self {
            panic!("polynomial multiplication overflows 64 bits");
        }

        p
    }

    /// Euclidean division: returns `(q, r)` with `self = q·d + r` and
    /// `deg(r) < deg(d)`. Panics when `d` is zero.
    pub fn divmod(self, d: Pol) -> (Pol, Pol) {
        assert!(d.0 != 0, "polynomial division by zero");

        if self.0 == 0 {
            return (Pol::ZERO, Pol::ZERO);
        }

        let mut q = 0u64;
        let mut r = self;
        let dd = d.deg();
        let mut diff = r.deg() - dd;
        while diff >= 0 {
            q |= 1 << diff;
            r = r.add(Pol(d.0 << diff));
            diff = r.deg() - dd;
        }

        (Pol(q), r)
    }

    /// Returns the quotient `self / d`.
    pub fn div(self, d: Pol) -> Pol {
        self.divmod(d).0
    }

    /// Returns the remainder `self mod d`.
    pub fn modulo(self, d: Pol) -> Pol {
        self.divmod(d).1
    }

    /// Returns the greatest common divisor of `self` and `f`.
    pub fn gcd(self, f: Pol) -> Pol {
        if f.0 == 0 {
            return self;
        }
        f.gcd(self.modulo(f))
    }

    /// Returns `self · f mod g` without intermediate overflow.
    pub fn mul_mod(self, f: Pol, g: Pol) -> Pol {
        let mut r = Pol::ZERO;
        let mut b = self;
        let mut f = f.0;
        while b.0 != 0 && f != 0 {
            if f & 1 != 0 {
                r = r.add(b).modulo(g);
            }
            b = Pol(b.0 << 1).modulo(g);
            f >>= 1;
        }
        r
    }

    /// Returns `self^n mod g` by square-and-multiply.
    pub fn pow_mod(self, mut n: u64, g: Pol) -> Pol {
        let mut r = Pol::ONE;
        let mut b = self;
        while n != 0 {
            if n & 1 != 0 {
                r = r.mul_mod(b, g);
            }
            b = b.mul_mod(b, g);
            n >>= 1;
        }
        r
    }

    /// Tests irreducibility over GF(2) with Ben-Or's algorithm.
    ///
    /// `self` is irreducible iff `gcd(self, x^(2^i) − x mod self) = 1`
    /// for every `i` up to half the degree; `x^(2^i) − x` is the product
    /// of all irreducible polynomials whose degree divides `i`.
    pub fn irreducible(self) -> bool {
        for i in 1..=(self.deg() / 2) {
            if self.gcd(qp(i as u32, self)) != Pol::ONE {
                return false;
            }
        }
        true
    }

    /// Derives an irreducible polynomial of degree 53 from `source`.
    ///
    /// Candidates are drawn as 8 little-endian bytes, masked to 54 bits
    /// with the top and bottom coefficients forced (degree exactly 53,
    /// not trivially divisible by `x`). Per Rabin there are about
    /// `2^53 / 53` irreducible polynomials of that degree, so roughly one
    /// candidate in 53 passes; the one-million budget makes a miss
    /// practically impossible with a sane source.
    pub fn derive<R: Read>(source: &mut R) -> Result<Pol, PolError> {
        let mut buf = [0u8; 8];
        for _ in 0..DERIVE_MAX_TRIES {
            source.read_exact(&mut buf)?;
            let f = candidate(u64::from_le_bytes(buf));
            if f.irreducible() {
                return Ok(f);
            }
        }
        Err(PolError::NoIrreducible(DERIVE_MAX_TRIES))
    }

    /// Derives an irreducible polynomial of degree 53 from the thread RNG.
    pub fn random() -> Result<Pol, PolError> {
        use rand::RngCore;

        let mut rng = rand::thread_rng();
        for _ in 0..DERIVE_MAX_TRIES {
            let f = candidate(rng.next_u64());
            if f.irreducible() {
                return Ok(f);
            }
        }
        Err(PolError::NoIrreducible(DERIVE_MAX_TRIES))
    }

    /// Returns the written-out form, e.g. `x^4+x+1`.
    pub fn expand(self) -> String {
        if self.0 == 0 {
            return "0".to_string();
        }

        let mut s = String::new();
        for i in (2..=self.deg()).rev() {
            if self.0 & (1 << i) != 0 {
                s.push_str(&format!("+x^{i}"));
            }
        }
        if self.0 & 2 != 0 {
            s.push_str("+x");
        }
        if self.0 & 1 != 0 {
            s.push_str("+1");
        }

        s[1..].to_string()
    }
}

/// Shapes a random draw into a degree-53 candidate with odd low bit.
fn candidate(bits: u64) -> Pol {
    Pol((bits & ((1 << 54) - 1)) | (1 << 53) | 1)
}

/// Computes `x^(2^p) + x mod g` by `p` modular squarings of `x`.
fn qp(p: u32, g: Pol) -> Pol {
    let num = 1u64 << p;
    let mut i = 1u64;
    let mut res = Pol(2);
    while i < num {
        res = res.mul_mod(res, g);
        i *= 2;
    }
    res.add(Pol(2)).modulo(g)
}

impl Add for Pol {
    type Output = Pol;

    fn add(self, y: Pol) -> Pol {
        Pol::add(self, y)
    }
}

impl AddAssign for Pol {
    fn add_assign(&mut self, y: Pol) {
        *self = Pol::add(*self, y);
    }
}

impl Mul for Pol {
    type Output = Pol;

    fn mul(self, y: Pol) -> Pol {
        Pol::mul(self, y)
    }
}

impl fmt::Debug for Pol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pol(0x{:x})", self.0)
    }
}

impl fmt::Display for Pol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl fmt::LowerHex for Pol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<Pol> for u64 {
    fn from(p: Pol) -> u64 {
        p.0
    }
}

impl FromStr for Pol {
    type Err = PolError;

    /// Parses bare or `0x`-prefixed hex, at most 16 digits.
    fn from_str(s: &str) -> Result<Self, PolError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 16 {
            return Err(PolError::Parse(s.to_string()));
        }
        u64::from_str_radix(digits, 16)
            .map(Pol)
            .map_err(|_| PolError::Parse(s.to_string()))
    }
}

impl Serialize for Pol {
    /// Serializes as a string of bare lowercase hex digits, shortest form.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:x}", self.0))
    }
}

impl<'de> Deserialize<'de> for Pol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PolVisitor;

        impl Visitor<'_> for PolVisitor {
            type Value = Pol;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a hex-encoded polynomial string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Pol, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(PolVisitor)
    }
}
