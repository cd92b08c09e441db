//! `SKIP_TEST_CLUSTER` policy for suites that need embedded PostgreSQL.

/// Whether `SKIP_TEST_CLUSTER` is set to `1`, `true` or `yes`
/// (case-insensitive).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Turn a cluster bootstrap failure into a skip or a loud failure.
///
/// Returns `None` with a `SKIP-TEST-CLUSTER` marker when skipping is allowed;
/// panics otherwise so a broken CI cluster is never silently ignored.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use env_lock::lock_env;
    use rstest::rstest;

    #[rstest]
    #[case(Some("1"), true)]
    #[case(Some("YES"), true)]
    #[case(Some("no"), false)]
    #[case(None, false)]
    fn skip_flag_accepts_truthy_values(#[case] value: Option<&str>, #[case] expected: bool) {
        let _guard = lock_env([("SKIP_TEST_CLUSTER", value.map(str::to_owned))]);
        assert_eq!(should_skip_test_cluster(), expected);
    }
}
