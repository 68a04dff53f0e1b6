// parser/regroup.rs

/// A flat fragment stream cut into fixed-size groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Regrouped<'a, T> {
    pub groups: Vec<&'a [T]>,
    /// Trailing fragments that did not fill a whole group. They are
    /// dropped, not padded: a stream of length n yields n / stride groups.
    pub leftover: &'a [T],
}

impl<T> Regrouped<'_, T> {
    pub fn is_aligned(&self) -> bool {
        self.leftover.is_empty()
    }
}

/// Recovers per-record boundaries from an unlabeled stream by assuming
/// every record contributes exactly `stride` fragments.
///
/// Nothing here can detect a record that contributed too few or too many
/// fragments; that shifts every later group. Only the trailing remainder
/// is observable. A stride of zero yields no groups.
pub fn regroup<T>(fragments: &[T], stride: usize) -> Regrouped<'_, T> {
    if stride == 0 {
        return Regrouped {
            groups: Vec::new(),
            leftover: fragments,
        };
    }
    let chunks = fragments.chunks_exact(stride);
    let leftover = chunks.remainder();
    Regrouped {
        groups: chunks.collect(),
        leftover,
    }
}
