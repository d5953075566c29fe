//! Commit-or-discard helper for multi-step transitions.

/// Run `f` against a clone of `state`, committing the clone only on success.
///
/// Contract states are built from `im` persistent collections, so the clone
/// is O(1) and writes are structurally shared. On error the clone is dropped
/// and `state` is left exactly as it was.
pub fn transact<S, T, E>(state: &mut S, f: impl FnOnce(&mut S) -> Result<T, E>) -> Result<T, E>
where
    S: Clone,
{
    let mut next = state.clone();
    let out = f(&mut next)?;
    *state = next;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commits_on_success() {
        let mut counter = vec![1];
        let result: Result<usize, ()> = transact(&mut counter, |c| {
            c.push(2);
            Ok(c.len())
        });
        assert_eq!(result, Ok(2));
        assert_eq!(counter, vec![1, 2]);
    }

    #[test]
    fn test_discards_on_error() {
        let mut counter = vec![1];
        let result: Result<(), &str> = transact(&mut counter, |c| {
            c.push(2);
            Err("rejected")
        });
        assert_eq!(result, Err("rejected"));
        assert_eq!(counter, vec![1]);
    }
}
