// attune_sim/src/harness/config/resolver.rs

use super::catalog::PrefabCatalog;
use crate::error::{HarnessError, HarnessResult};
use figment::value::{Dict, Tag, Value};

/// Prefabs may reference other prefabs; chains deeper than this are treated
/// as cycles.
const MAX_PREFAB_DEPTH: usize = 32;

/// Replaces every table carrying a `from = "<key>"` entry with the resolved
/// prefab, overridden by the table's own keys.
pub fn resolve_document(document: &Value, catalog: &PrefabCatalog) -> HarnessResult<Value> {
    resolve_value_recursively(document, catalog, 0)
}

/// Merges the contents of `override_dict` into `base`.
fn deep_merge(base: &mut Dict, override_dict: &Dict) {
    for (key, override_val) in override_dict {
        // A nested table with its own 'from' is a replacement, not a merge.
        if let Some(d) = override_val.as_dict() {
            if d.contains_key("from") {
                base.insert(key.clone(), override_val.clone());
                continue;
            }
        }

        if let Some(base_val) = base.get_mut(key) {
            if let (Some(base_sub_dict), Some(override_sub_dict)) =
                (base_val.as_dict(), override_val.as_dict())
            {
                let mut new_sub_dict = base_sub_dict.clone();
                deep_merge(&mut new_sub_dict, override_sub_dict);
                *base_val = Value::Dict(Tag::Default, new_sub_dict);
                continue;
            }
        }
        base.insert(key.clone(), override_val.clone());
    }
}

fn resolve_value_recursively(
    value: &Value,
    catalog: &PrefabCatalog,
    depth: usize,
) -> HarnessResult<Value> {
    if depth > MAX_PREFAB_DEPTH {
        return Err(HarnessError::Catalog(format!(
            "prefab references nest deeper than {MAX_PREFAB_DEPTH} levels (cycle?)"
        )));
    }

    // Pre-order: resolve this node's 'from' first, then its children.
    let current_node = match value.as_dict() {
        Some(dict) => match dict.get("from") {
            Some(from) => {
                let from_key = from.as_str().ok_or_else(|| {
                    HarnessError::Catalog("'from' must be a string prefab key".into())
                })?;
                let base_prefab_data = catalog.get(from_key).ok_or_else(|| {
                    HarnessError::Catalog(format!("Prefab '{from_key}' not found in catalog"))
                })?;

                let resolved_base = resolve_value_recursively(base_prefab_data, catalog, depth + 1)?;
                let mut final_dict = resolved_base.into_dict().ok_or_else(|| {
                    HarnessError::Catalog(format!(
                        "Prefab '{from_key}' must resolve to a table to be merged."
                    ))
                })?;
                deep_merge(&mut final_dict, dict);
                Value::Dict(Tag::Default, final_dict)
            }
            None => value.clone(),
        },
        None => value.clone(),
    };

    match &current_node {
        Value::Dict(tag, dict) => {
            let mut new_dict = Dict::new();
            for (key, val) in dict.iter() {
                if key == "from" {
                    continue;
                }
                new_dict.insert(
                    key.clone(),
                    resolve_value_recursively(val, catalog, depth + 1)?,
                );
            }
            Ok(Value::Dict(tag.clone(), new_dict))
        }
        Value::Array(tag, arr) => {
            let resolved = arr
                .iter()
                .map(|item| resolve_value_recursively(item, catalog, depth + 1))
                .collect::<HarnessResult<Vec<_>>>()?;
            Ok(Value::Array(tag.clone(), resolved))
        }
        _ => Ok(current_node),
    }
}
