//! The ordered library catalog.
//!
//! Stylesheets load first, then scripts, each in declared order. The
//! application module is imported last and always from the device.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::{AssetDescriptor, AssetKind};

/// CDN asset used only as a reachability signal in auto mode.
pub const DEFAULT_PROBE_URL: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@5.2.3/dist/css/bootstrap.min.css";

/// Default application entry module.
pub const DEFAULT_APP_PATH: &str = "/js/app.js?v=1";

/// Errors found while validating a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("asset {0:?} has an empty local path")]
    EmptyLocalPath(String),

    #[error("asset name {0:?} appears more than once")]
    DuplicateName(String),

    #[error("stylesheet {stylesheet:?} is declared after script {script:?}")]
    StylesheetAfterScript { stylesheet: String, script: String },

    #[error("asset {0:?} uses the module kind, which is reserved for the application")]
    ModuleInCatalog(String),

    #[error("application module path is empty")]
    EmptyAppPath,
}

/// Application module imported after every library has loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppModule {
    pub path: String,
}

impl Default for AppModule {
    fn default() -> Self {
        Self {
            path: DEFAULT_APP_PATH.to_string(),
        }
    }
}

/// Ordered list of libraries plus the application module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCatalog {
    pub assets: Vec<AssetDescriptor>,

    #[serde(default)]
    pub app: AppModule,
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self {
            assets: vec![
                AssetDescriptor::stylesheet(
                    "FontAwesome CSS",
                    "/css/fontawesome-6.2.1.min.css",
                    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.2.1/css/all.min.css",
                ),
                AssetDescriptor::stylesheet(
                    "Bootstrap CSS",
                    "/css/bootstrap-5.2.3.min.css",
                    "https://cdn.jsdelivr.net/npm/bootstrap@5.2.3/dist/css/bootstrap.min.css",
                ),
                AssetDescriptor::stylesheet(
                    "uPlot CSS",
                    "/css/uPlot.min.css",
                    "https://cdn.jsdelivr.net/npm/uplot@1.6.24/dist/uPlot.min.css",
                ),
                AssetDescriptor::script(
                    "Vue",
                    "/js/vue.3.2.47.min.js",
                    "https://cdn.jsdelivr.net/npm/vue@3.2.47/dist/vue.global.prod.min.js",
                )
                .with_global("Vue"),
                AssetDescriptor::script(
                    "VueNumberInput",
                    "/js/vue-number-input.min.js",
                    "https://unpkg.com/@chenfengyuan/vue-number-input@2.0.1/dist/vue-number-input.min.js",
                )
                .with_global("VueNumberInput"),
                AssetDescriptor::script(
                    "uPlot",
                    "/js/uPlot.1.6.28.min.js",
                    "https://cdn.jsdelivr.net/npm/uplot@1.6.28/dist/uPlot.iife.min.js",
                )
                .with_global("uPlot"),
                AssetDescriptor::script(
                    "Bootstrap",
                    "/js/bootstrap.bundle.5.2.3.min.js",
                    "https://cdn.jsdelivr.net/npm/bootstrap@5.2.3/dist/js/bootstrap.bundle.min.js",
                )
                .with_global("bootstrap"),
            ],
            app: AppModule::default(),
        }
    }
}

impl AssetCatalog {
    /// Build a catalog from explicit parts.
    pub fn new(assets: Vec<AssetDescriptor>, app: AppModule) -> Self {
        Self { assets, app }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.assets.iter()
    }

    pub fn stylesheets(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.assets.iter().filter(|a| a.kind == AssetKind::Stylesheet)
    }

    pub fn scripts(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.assets.iter().filter(|a| a.kind == AssetKind::Script)
    }

    /// Check ordering and naming rules.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.app.path.trim().is_empty() {
            return Err(CatalogError::EmptyAppPath);
        }

        let mut names = HashSet::new();
        let mut first_script: Option<&str> = None;

        for asset in &self.assets {
            if asset.local_path.trim().is_empty() {
                return Err(CatalogError::EmptyLocalPath(asset.name.clone()));
            }
            if !names.insert(asset.name.as_str()) {
                return Err(CatalogError::DuplicateName(asset.name.clone()));
            }
            match asset.kind {
                AssetKind::Module => {
                    return Err(CatalogError::ModuleInCatalog(asset.name.clone()));
                }
                AssetKind::Script => {
                    if first_script.is_none() {
                        first_script = Some(asset.name.as_str());
                    }
                }
                AssetKind::Stylesheet => {
                    if let Some(script) = first_script {
                        return Err(CatalogError::StylesheetAfterScript {
                            stylesheet: asset.name.clone(),
                            script: script.to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_catalog_order() {
        let catalog = AssetCatalog::default();
        catalog.validate().unwrap();

        let names: Vec<&str> = catalog.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "FontAwesome CSS",
                "Bootstrap CSS",
                "uPlot CSS",
                "Vue",
                "VueNumberInput",
                "uPlot",
                "Bootstrap",
            ]
        );
        assert_eq!(catalog.stylesheets().count(), 3);
        assert_eq!(catalog.scripts().count(), 4);
        assert_eq!(catalog.app.path, "/js/app.js?v=1");
    }

    #[test]
    fn test_default_scripts_bind_globals() {
        let catalog = AssetCatalog::default();
        let globals: Vec<&str> = catalog
            .scripts()
            .filter_map(|a| a.effective_global())
            .collect();
        assert_eq!(globals, vec!["Vue", "VueNumberInput", "uPlot", "bootstrap"]);
    }

    #[test]
    fn test_stylesheet_after_script_rejected() {
        let catalog = AssetCatalog::new(
            vec![
                AssetDescriptor::script("a", "/js/a.js", "https://cdn/a.js"),
                AssetDescriptor::stylesheet("b", "/css/b.css", "https://cdn/b.css"),
            ],
            AppModule::default(),
        );
        assert_eq!(
            catalog.validate(),
            Err(CatalogError::StylesheetAfterScript {
                stylesheet: "b".to_string(),
                script: "a".to_string(),
            })
        );
    }

    #[test]
    fn test_duplicate_and_empty_rejected() {
        let dup = AssetCatalog::new(
            vec![
                AssetDescriptor::stylesheet("a", "/css/a.css", "https://cdn/a.css"),
                AssetDescriptor::stylesheet("a", "/css/b.css", "https://cdn/b.css"),
            ],
            AppModule::default(),
        );
        assert_eq!(dup.validate(), Err(CatalogError::DuplicateName("a".to_string())));

        let empty = AssetCatalog::new(
            vec![AssetDescriptor::stylesheet("a", " ", "https://cdn/a.css")],
            AppModule::default(),
        );
        assert_eq!(empty.validate(), Err(CatalogError::EmptyLocalPath("a".to_string())));

        let no_app = AssetCatalog::new(vec![], AppModule { path: String::new() });
        assert_eq!(no_app.validate(), Err(CatalogError::EmptyAppPath));
    }

    #[test]
    fn test_catalog_from_json() {
        let catalog: AssetCatalog = serde_json::from_str(
            r#"{
                "assets": [
                    {"name": "site", "localPath": "/css/site.css", "kind": "stylesheet"},
                    {"name": "lib", "localPath": "/js/lib.js", "cdnUrl": "https://cdn/lib.js",
                     "kind": "script", "global": "Lib"}
                ]
            }"#,
        )
        .unwrap();

        catalog.validate().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.app, AppModule::default());
        assert_eq!(catalog.assets[1].global.as_deref(), Some("Lib"));
    }
}
