use std::fmt;
use std::ops;

use crate::interest::Interest;

/// The set of I/O events the OS reported as currently performable on an
/// endpoint, as observed by the most recent [`Selector::select`] call.
///
/// A superset of [`Interest`]'s alphabet, plus an `IO_ERROR` flag.
///
/// [`Selector::select`]: crate::Selector::select
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct Readiness(u8);

const READ_BIT: u8 = 0b001;
const WRITE_BIT: u8 = 0b010;
const ERROR_BIT: u8 = 0b100;

impl Readiness {
    /// No readiness observed.
    pub const NIL: Readiness = Readiness(0);
    /// Readable readiness.
    pub const READ: Readiness = Readiness(READ_BIT);
    /// Writable readiness.
    pub const WRITE: Readiness = Readiness(WRITE_BIT);
    /// An error (or hang-up) was reported for the endpoint.
    pub const IO_ERROR: Readiness = Readiness(ERROR_BIT);

    #[inline]
    pub(crate) fn insert(&mut self, other: Readiness) {
        self.0 |= other.0;
    }

    /// Returns `true` if the set includes readable readiness.
    #[inline]
    pub const fn is_readable(self) -> bool {
        self.0 & READ_BIT != 0
    }

    /// Returns `true` if the set includes writable readiness.
    #[inline]
    pub const fn is_writable(self) -> bool {
        self.0 & WRITE_BIT != 0
    }

    /// Returns `true` if the set includes the error flag.
    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 & ERROR_BIT != 0
    }

    #[inline]
    pub const fn from_interest(interest: Interest) -> Readiness {
        let mut bits = 0;
        if interest.is_readable() {
            bits |= READ_BIT;
        }
        if interest.is_writable() {
            bits |= WRITE_BIT;
        }
        Readiness(bits)
    }
}

impl ops::BitOr for Readiness {
    type Output = Readiness;

    #[inline]
    fn bitor(self, other: Readiness) -> Readiness {
        Readiness(self.0 | other.0)
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Readiness(")?;
        let mut first = true;
        for (bit, name) in [
            (Readiness::READ, "READ"),
            (Readiness::WRITE, "WRITE"),
            (Readiness::IO_ERROR, "IO_ERROR"),
        ] {
            if self.0 & bit.0 != 0 {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        if first {
            write!(f, "NIL")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_accumulates_bits() {
        let mut r = Readiness::NIL;
        r.insert(Readiness::READ);
        r.insert(Readiness::IO_ERROR);
        assert!(r.is_readable());
        assert!(r.is_error());
        assert!(!r.is_writable());
    }
}
