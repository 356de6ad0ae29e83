//! Module boundary heuristic for ascending Loader targets.
//!
//! A Loader target such as `../Primitives/Needle.qml` exists on disk, but
//! when each QML module is compiled into its own resource archive the
//! relative path leaves the archive and the load fails. Markers are matched
//! by substring against the raw target, not against a module manifest, so
//! an unnamed sibling module goes unnoticed and a directory that merely
//! contains a marker name is reported.

use crate::config::ModuleMarker;

/// Path segment that ascends one directory.
const ASCEND_SEGMENT: &str = "..";

/// Whether the raw target contains a `..` segment.
pub fn ascends(target: &str) -> bool {
    return target.split('/').any(|segment| segment == ASCEND_SEGMENT);
}

/// The sibling module an ascending target crosses into, if any.
/// Targets without a `..` segment stay inside their own module.
pub fn crossed_module<'a>(target: &str, modules: &'a [ModuleMarker]) -> Option<&'a ModuleMarker> {
    if !ascends(target) {
        return None;
    }
    return modules.iter().find(|m| target.contains(m.marker.as_str()));
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;
    use crate::config::Config;

    fn module_name(target: &str) -> Option<String> {
        let config = Config::default();
        crossed_module(target, &config.modules).map(|m| m.name.clone())
    }

    #[test]
    fn ascending_into_primitives_crosses() {
        assert_eq!(
            module_name("../Primitives/Needle.qml").as_deref(),
            Some("DevDash.Gauges.Primitives")
        );
    }

    #[test]
    fn ascending_into_compounds_crosses() {
        assert_eq!(
            module_name("../../Compounds/Cluster.qml").as_deref(),
            Some("DevDash.Gauges.Compounds")
        );
    }

    #[test]
    fn first_marker_wins() {
        assert_eq!(
            module_name("../Compounds/PrimitivesWrapper.qml").as_deref(),
            Some("DevDash.Gauges.Primitives")
        );
    }

    #[test]
    fn marker_without_ascend_is_same_module() {
        assert_eq!(module_name("Primitives/Needle.qml"), None);
    }

    #[test]
    fn ascend_without_marker_is_same_module() {
        assert_eq!(module_name("../Common/Label.qml"), None);
    }

    #[test]
    fn dotted_names_are_not_ascend_segments() {
        assert!(!ascends("..Primitives/x.qml"));
        assert!(ascends("./../x.qml"));
    }
}
