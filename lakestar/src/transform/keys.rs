//! Surrogate key assignment.
//!
//! Keys are assigned by a pure enumeration over rows that are already in their final
//! deterministic order, so the same input always yields the same keys.

/// First surrogate key handed out by [`assign_surrogate_keys`].
pub const FIRST_SURROGATE_KEY: i64 = 1;

/// Pairs every item with a key counting up from [`FIRST_SURROGATE_KEY`] without gaps.
pub fn assign_surrogate_keys<T>(
    items: impl IntoIterator<Item = T>,
) -> impl Iterator<Item = (i64, T)> {
    (FIRST_SURROGATE_KEY..).zip(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_start_at_one_without_gaps() {
        let keyed: Vec<_> = assign_surrogate_keys(["a", "b", "c"]).collect();

        assert_eq!(keyed, vec![(1, "a"), (2, "b"), (3, "c")]);
    }

    #[test]
    fn empty_input_assigns_nothing() {
        assert_eq!(assign_surrogate_keys(Vec::<u8>::new()).count(), 0);
    }
}
