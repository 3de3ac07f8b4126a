use std::fmt;
use std::ops;

/// A set of I/O operations a caller wants reported for an endpoint.
///
/// `Interest` is drawn from `{READ, WRITE}`. The empty set, [`Interest::NIL`],
/// is legal and means "tracked but not armed".
///
/// # Examples
///
/// ```
/// use readywatch::Interest;
///
/// let interest = Interest::READ | Interest::WRITE;
///
/// assert!(interest.is_readable());
/// assert!(interest.is_writable());
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Interest(u8);

const READ_BIT: u8 = 0b01;
const WRITE_BIT: u8 = 0b10;

impl Interest {
    /// The empty set: tracked, but not armed for anything.
    pub const NIL: Interest = Interest(0);
    /// Readable interest.
    pub const READ: Interest = Interest(READ_BIT);
    /// Writable interest.
    pub const WRITE: Interest = Interest(WRITE_BIT);
    /// Both readable and writable interest.
    pub const READ_WRITE: Interest = Interest(READ_BIT | WRITE_BIT);

    /// Returns `true` if this set is empty.
    #[inline]
    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the set includes readable interest.
    #[inline]
    pub const fn is_readable(self) -> bool {
        self.0 & READ_BIT != 0
    }

    /// Returns `true` if the set includes writable interest.
    #[inline]
    pub const fn is_writable(self) -> bool {
        self.0 & WRITE_BIT != 0
    }

    /// Returns `true` if `self` contains every bit set in `other`.
    #[inline]
    pub const fn contains(self, other: Interest) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub(crate) const fn union(self, other: Interest) -> Interest {
        Interest(self.0 | other.0)
    }

    #[inline]
    pub(crate) const fn difference(self, other: Interest) -> Interest {
        Interest(self.0 & !other.0)
    }

    #[inline]
    pub(crate) const fn intersection(self, other: Interest) -> Interest {
        Interest(self.0 & other.0)
    }
}

impl ops::BitOr for Interest {
    type Output = Interest;

    #[inline]
    fn bitor(self, other: Interest) -> Interest {
        self.union(other)
    }
}

impl ops::BitAnd for Interest {
    type Output = Interest;

    #[inline]
    fn bitand(self, other: Interest) -> Interest {
        self.intersection(other)
    }
}

impl ops::Sub for Interest {
    type Output = Interest;

    #[inline]
    fn sub(self, other: Interest) -> Interest {
        self.difference(other)
    }
}

impl fmt::Debug for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interest(")?;
        let mut first = true;
        for (bit, name) in [(Interest::READ, "READ"), (Interest::WRITE, "WRITE")] {
            if self.contains(bit) {
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
    fn union_and_queries() {
        let i = Interest::READ | Interest::WRITE;
        assert!(i.is_readable());
        assert!(i.is_writable());
        assert_eq!(i, Interest::READ_WRITE);
    }

    #[test]
    fn nil_is_empty() {
        assert!(Interest::NIL.is_nil());
        assert!(!Interest::NIL.is_readable());
        assert!(!Interest::NIL.is_writable());
    }

    #[test]
    fn difference_removes_bits() {
        let i = Interest::READ_WRITE - Interest::WRITE;
        assert_eq!(i, Interest::READ);
    }

    #[test]
    fn contains_is_a_superset_check() {
        let rw = Interest::READ_WRITE;
        assert!(rw.contains(Interest::READ));
        assert!(rw.contains(Interest::WRITE));
        assert!(!Interest::READ.contains(rw));
    }
}
