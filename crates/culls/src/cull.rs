use serde_json::{Map, Value};

use culls_contracts::{is_lifecycle_script, SCRIPTS_FIELD};

use crate::preserve::PreserveList;

/// What a cull pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CullOutcome {
    /// Top-level fields dropped, in manifest order. `scripts` comes last and
    /// only when the whole object went away.
    pub removed_fields: Vec<String>,
    /// Scripts dropped from a `scripts` object that survived, in manifest
    /// order.
    pub pruned_scripts: Vec<String>,
}

impl CullOutcome {
    pub fn is_noop(&self) -> bool {
        self.removed_fields.is_empty() && self.pruned_scripts.is_empty()
    }
}

/// Removes every field the allow-list does not name, then prunes `scripts`
/// down to lifecycle scripts unless the user preserved it.
///
/// Key order of whatever survives is left as it was.
pub fn cull_manifest(manifest: &mut Map<String, Value>, preserve: &PreserveList) -> CullOutcome {
    let allowed = preserve.allowed_fields();
    let mut out = CullOutcome::default();

    manifest.retain(|key, _| {
        let keep = allowed.contains(key.as_str());
        if !keep {
            out.removed_fields.push(key.clone());
        }
        keep
    });

    if !preserve.keeps_all_scripts() {
        if let Some(Value::Object(scripts)) = manifest.get_mut(SCRIPTS_FIELD) {
            let mut pruned = Vec::new();
            scripts.retain(|name, _| {
                let keep = is_lifecycle_script(name);
                if !keep {
                    pruned.push(name.clone());
                }
                keep
            });

            if scripts.is_empty() {
                manifest.retain(|key, _| key != SCRIPTS_FIELD);
                out.removed_fields.push(SCRIPTS_FIELD.to_string());
            } else {
                out.pruned_scripts = pruned;
            }
        }
    }

    out
}
