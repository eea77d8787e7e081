//! Registered OBJECT IDENTIFIER arc names.
//!
//! Name forms in OID values resolve against this table of well-known arcs
//! from X.660/X.662. Unknown names are left as identifier references for the
//! emitting back end. The table is a process-wide read-only constant.

/// Well-known top-level and second-level arc names and their numbers.
pub const REGISTERED_OID_NAMES: &[(&str, u64)] = &[
    ("ccitt", 0),
    ("itu-t", 0),
    ("iso", 1),
    ("joint-iso-ccitt", 2),
    ("joint-iso-itu-t", 2),
    // below itu-t
    ("recommendation", 0),
    ("question", 1),
    ("administration", 2),
    ("network-operator", 3),
    // below iso
    ("standard", 0),
    ("registration-authority", 1),
    ("member-body", 2),
    ("identified-organization", 3),
];

/// Looks up a registered arc number by name.
pub fn registered_arc(name: &str) -> Option<u64> {
    REGISTERED_OID_NAMES
        .iter()
        .find(|(arc, _)| *arc == name)
        .map(|(_, number)| *number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_arcs_resolve() {
        assert_eq!(registered_arc("iso"), Some(1));
        assert_eq!(registered_arc("joint-iso-itu-t"), Some(2));
        assert_eq!(registered_arc("member-body"), Some(2));
    }

    #[test]
    fn unknown_arcs_do_not() {
        assert_eq!(registered_arc("rsadsi"), None);
    }
}
