// attune_sim/src/harness/config/catalog.rs

//! The prefab catalog: reusable configuration fragments loaded from disk.

use figment::{
    providers::{Format, Toml},
    value::Value,
    Figment,
};
use std::{collections::HashMap, path::Path};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// The key is a namespace string (e.g., "policies.crazyflie_euler") and the
/// value is the raw, parsed TOML data for that prefab.
#[derive(Default, Debug, Clone)]
pub struct PrefabCatalog(pub HashMap<String, Value>);

impl PrefabCatalog {
    /// Walks `catalog_path` and parses every `.toml` file below it. A missing
    /// directory yields an empty catalog; unparsable files are skipped.
    pub fn load_from_disk(catalog_path: &Path) -> Self {
        let mut catalog = PrefabCatalog::default();
        if !catalog_path.exists() {
            warn!(
                "Catalog directory not found at {:?}, no prefabs will be loaded.",
                catalog_path
            );
            return catalog;
        }

        info!("Loading prefab catalog from: {:?}", catalog_path);

        for entry in WalkDir::new(catalog_path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| {
                !e.file_type().is_dir() && e.path().extension().is_some_and(|ext| ext == "toml")
            })
        {
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(catalog_path) else {
                continue;
            };
            // "policies/crazyflie_euler.toml" -> "policies.crazyflie_euler"
            let key = relative
                .with_extension("")
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, ".");

            match Figment::new().merge(Toml::file(path)).extract::<Value>() {
                Ok(data) => {
                    info!("Loaded catalog item: '{}'", key);
                    catalog.0.insert(key, data);
                }
                Err(e) => {
                    error!("Failed to load catalog item from {:?}: {}", path, e);
                }
            }
        }
        catalog
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
