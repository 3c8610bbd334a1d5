//! API version gating.
//!
//! Both transcoding directions consult the same predicate, so a field that
//! is never sent at version `V` is also never read back at `V`.

use tessera_core::{FieldDescriptor, Version};

/// Whether `desc` exists at API `version`.
///
/// A field is included iff `version >= min_version` and, when a maximum is
/// set, `version <= max_version`. Fields without bounds are always included.
pub fn included(desc: &FieldDescriptor, version: &Version) -> bool {
    within(desc.min_version.as_ref(), desc.max_version.as_ref(), version)
}

/// The window check behind [`included`], for callers holding raw bounds.
pub fn within(min: Option<&Version>, max: Option<&Version>, version: &Version) -> bool {
    min.is_none_or(|min| version >= min) && max.is_none_or(|max| version <= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_unbounded_field_always_included() {
        let field = FieldDescriptor::string("name");
        assert!(included(&field, &v("5.6.0")));
        assert!(included(&field, &v("7.4.3")));
    }

    #[test]
    fn test_min_version() {
        let field = FieldDescriptor::string("ztna_status").since(v("7.0.0"));
        assert!(!included(&field, &v("6.4.9")));
        assert!(included(&field, &v("7.0.0")));
        assert!(included(&field, &v("7.0.1")));
    }

    #[test]
    fn test_max_version() {
        let field = FieldDescriptor::string("legacy")
            .since(v("6.2.0"))
            .until(v("7.0.12"));
        assert!(!included(&field, &v("6.0.0")));
        assert!(included(&field, &v("6.4.0")));
        assert!(included(&field, &v("7.0.12")));
        assert!(!included(&field, &v("7.2.0")));
    }

    #[test]
    fn test_semantic_comparison() {
        let field = FieldDescriptor::integer("x").since(v("7.10.0"));
        assert!(!included(&field, &v("7.9.0")));
        assert!(included(&field, &v("7.10.0")));
    }

    #[test]
    fn test_idempotent() {
        let field = FieldDescriptor::integer("x").since(v("7.2.0"));
        let version = v("7.2.1");
        let first = included(&field, &version);
        for _ in 0..3 {
            assert_eq!(included(&field, &version), first);
        }
    }

    fn version_strategy() -> impl Strategy<Value = Version> {
        (0u32..10, 0u32..10, 0u32..10).prop_map(|(a, b, c)| Version::new(a, b, c))
    }

    proptest! {
        #[test]
        fn inclusion_is_monotonic_up_to_max(
            min in version_strategy(),
            max in version_strategy(),
            probe in version_strategy(),
            later in version_strategy(),
        ) {
            let field = FieldDescriptor::string("f").since(min).until(max);
            if included(&field, &probe) && later >= probe && later <= max {
                prop_assert!(included(&field, &later));
            }
        }
    }
}
