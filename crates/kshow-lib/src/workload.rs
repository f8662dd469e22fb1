//! Owning-workload derivation from generated instance names
//!
//! Instances created through a replica set are named
//! `<workload>-<replicaset-suffix>-<instance-suffix>`. Stripping the two
//! trailing segments recovers the workload name. The heuristic cannot tell a
//! hyphenated workload name apart from generated suffixes, so a name such as
//! `batch-job` with no suffixes derives to itself while `my-app-v2` derives
//! to `my`. That is a known limitation of name-based ownership.

/// Minimum number of hyphen segments for a name to carry generated suffixes
const MIN_SEGMENTS: usize = 3;

/// Derive the owning workload name of an instance
///
/// Names with fewer than three segments cannot be decomposed and derive to
/// themselves.
pub fn derive_workload_name(instance_name: &str) -> &str {
    let segments: Vec<&str> = instance_name.split('-').collect();
    if segments.len() < MIN_SEGMENTS {
        return instance_name;
    }

    let instance_suffix = segments[segments.len() - 1];
    let replicaset_suffix = segments[segments.len() - 2];
    let suffix = format!("-{}-{}", replicaset_suffix, instance_suffix);

    instance_name.strip_suffix(&suffix).unwrap_or(instance_name)
}

/// Whether an instance name derives to exactly `workload`
///
/// Anchored equality: `api` does not own instances of `api-canary`.
pub fn is_owned_by(instance_name: &str, workload: &str) -> bool {
    derive_workload_name(instance_name) == workload
}

/// Whether a name is too short to be decomposed
pub fn is_malformed(instance_name: &str) -> bool {
    instance_name.split('-').count() < MIN_SEGMENTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_generated_suffixes() {
        assert_eq!(derive_workload_name("api-5f6-abc12"), "api");
        assert_eq!(
            derive_workload_name("payment-gateway-7d9c8b6f4-x2k9p"),
            "payment-gateway"
        );
    }

    #[test]
    fn test_short_name_falls_back() {
        assert_eq!(derive_workload_name("solo"), "solo");
        assert_eq!(derive_workload_name("redis-0"), "redis-0");
        assert!(is_malformed("solo"));
        assert!(!is_malformed("api-5f6-abc12"));
    }

    #[test]
    fn test_deterministic() {
        let name = "web-6b7c9-qwert";
        let first = derive_workload_name(name);
        for _ in 0..10 {
            assert_eq!(derive_workload_name(name), first);
        }
    }

    #[test]
    fn test_idempotent_on_short_names() {
        let derived = derive_workload_name("api-5f6-abc12");
        assert_eq!(derive_workload_name(derived), derived);
    }

    #[test]
    fn test_anchored_ownership() {
        assert!(is_owned_by("api-5f6-abc12", "api"));
        assert!(!is_owned_by("api-canary-5f6-abc12", "api"));
        assert!(is_owned_by("api-canary-5f6-abc12", "api-canary"));
    }

    #[test]
    fn test_repeated_suffix_strips_from_end() {
        assert_eq!(derive_workload_name("x-ab-12-ab-12"), "x-ab-12");
    }
}
