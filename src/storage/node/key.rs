use std::cmp::Ordering;

/// Longest explicit separator key an internal node will store.
///
/// Enforced at the node boundary; producing shorter keys in the first
/// place is the caller's job.
pub const MAX_KEY_LEN: usize = 250;

/// A directory slot's separator: either an explicit upper bound or the
/// catch-all sentinel routing keys greater than every stored separator.
///
/// On-page the sentinel is a zero-length key; in the API it is its own
/// variant so an empty slice can never be mistaken for it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Separator<'a> {
    /// Explicit separator key.
    Key(&'a [u8]),
    /// Catch-all upper bound, greater than every explicit key.
    Sentinel,
}

impl<'a> Separator<'a> {
    /// Map the stored key bytes back to a separator (zero length is the
    /// sentinel).
    pub fn from_stored(bytes: &'a [u8]) -> Self {
        if bytes.is_empty() {
            Separator::Sentinel
        } else {
            Separator::Key(bytes)
        }
    }

    /// Key bytes as stored on-page (the sentinel stores zero bytes).
    pub fn stored_bytes(&self) -> &'a [u8] {
        match self {
            Separator::Key(key) => key,
            Separator::Sentinel => &[],
        }
    }

    /// True for the catch-all variant.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Separator::Sentinel)
    }
}

/// The one ordering used by every directory operation: the sentinel sorts
/// after every explicit key, two sentinels compare equal, and explicit
/// keys compare bytewise over the shared prefix with the shorter key first
/// on a tie.
impl Ord for Separator<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Separator::Sentinel, Separator::Sentinel) => Ordering::Equal,
            (Separator::Sentinel, Separator::Key(_)) => Ordering::Greater,
            (Separator::Key(_), Separator::Sentinel) => Ordering::Less,
            (Separator::Key(a), Separator::Key(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Separator<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::Separator;
    use std::cmp::Ordering;

    #[test]
    fn sentinel_sorts_after_every_key() {
        assert_eq!(
            Separator::Sentinel.cmp(&Separator::Key(b"zzzz")),
            Ordering::Greater
        );
        assert_eq!(
            Separator::Key(b"zzzz").cmp(&Separator::Sentinel),
            Ordering::Less
        );
        assert_eq!(
            Separator::Sentinel.cmp(&Separator::Sentinel),
            Ordering::Equal
        );
    }

    #[test]
    fn explicit_keys_compare_bytewise_then_by_length() {
        assert_eq!(
            Separator::Key(b"abc").cmp(&Separator::Key(b"abd")),
            Ordering::Less
        );
        assert_eq!(
            Separator::Key(b"ab").cmp(&Separator::Key(b"abc")),
            Ordering::Less
        );
        assert_eq!(
            Separator::Key(b"abc").cmp(&Separator::Key(b"abc")),
            Ordering::Equal
        );
    }

    #[test]
    fn stored_form_round_trips() {
        assert_eq!(Separator::from_stored(b""), Separator::Sentinel);
        assert_eq!(Separator::from_stored(b"k"), Separator::Key(b"k"));
        assert!(Separator::Sentinel.stored_bytes().is_empty());
    }
}
