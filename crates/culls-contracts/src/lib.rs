//! Shared, version-pinned identifiers and field tables.
//!
//! These constants are the single source of truth for the manifest fields
//! `culls` keeps and for the schema string that appears in its
//! machine-readable output.

pub const CULLS_REPORT_SCHEMA_VERSION: &str = "culls.report@0.1.0";

pub const MANIFEST_FILE_NAME: &str = "package.json";

/// Label printed in front of the elapsed time of a run.
pub const TIMING_LABEL: &str = "🌿 culls";

/// Top-level `package.json` fields kept by default.
///
/// See <https://docs.npmjs.com/cli/v9/configuring-npm/package-json>.
/// Kept sorted.
pub const DEFAULT_ALLOWED_FIELDS: &[&str] = &[
    "author",
    "bin",
    "browser",
    "bugs",
    "contributors",
    "dependencies",
    "description",
    "engines",
    "exports",
    "files",
    "funding",
    "homepage",
    "keywords",
    "license",
    "main",
    "maintainers",
    "module",
    "name",
    "optionalDependencies",
    "peerDependencies",
    "private",
    "publishConfig",
    "repository",
    "scripts",
    "sideEffects",
    "type",
    "types",
    "typesVersions",
    "version",
    "workspaces",
];

/// Scripts the package manager runs on its own; the only ones kept when
/// `scripts` is culled.
///
/// See <https://docs.npmjs.com/cli/v9/using-npm/scripts#lifecycle-scripts>.
pub const LIFECYCLE_SCRIPTS: &[&str] = &[
    "postinstall",
    "postuninstall",
    "preinstall",
    "prepare",
    "preuninstall",
];

/// Field whose value is pruned down to [`LIFECYCLE_SCRIPTS`].
pub const SCRIPTS_FIELD: &str = "scripts";

pub fn is_lifecycle_script(name: &str) -> bool {
    LIFECYCLE_SCRIPTS.binary_search(&name).is_ok()
}
