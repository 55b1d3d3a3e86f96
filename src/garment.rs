// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Garment catalog entries and their preloaded image variants.
//!
//! A [`GarmentCatalog`] names one image per [`Orientation`] plus a
//! [`Calibration`]. [`GarmentAsset::preload`] fetches every variant on its
//! own thread; variants become visible to the render path one by one as they
//! finish, and a variant that fails to load simply stays empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use image::RgbaImage;
use serde::Deserialize;

use crate::error::{OverlayError, Result};
use crate::orientation::Orientation;
use crate::transform::Calibration;
use crate::warn;

/// A garment as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GarmentCatalog {
    /// Product identifier.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Image URI per orientation label (`front`, `back`, `left`, `right`).
    pub images: HashMap<String, String>,
    /// Fitting constants.
    #[serde(default)]
    pub calibration: Calibration,
    /// Directory that relative image paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for GarmentCatalog {
    fn default() -> Self {
        let images = [
            ("front", "Front+View"),
            ("back", "Back+View"),
            ("left", "Left+Side"),
            ("right", "Right+Side"),
        ]
        .into_iter()
        .map(|(key, text)| {
            (
                key.to_string(),
                format!("https://placehold.co/600x800/0f0f0f/D4AF37/png?text={text}"),
            )
        })
        .collect();

        Self {
            id: "luxury-tee-001".to_string(),
            name: "Essential Luxury Tee".to_string(),
            images,
            calibration: Calibration::default(),
            base_dir: None,
        }
    }
}

impl GarmentCatalog {
    /// Parse a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, names an unknown
    /// orientation, or has a non-positive scale factor.
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file. Relative image paths resolve against
    /// the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            OverlayError::IoError(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        let mut catalog = Self::from_json(&json)?;
        catalog.base_dir = path.parent().map(Path::to_path_buf);
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        for key in self.images.keys() {
            key.parse::<Orientation>()?;
        }
        let scale = self.calibration.scale_factor;
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(OverlayError::ConfigError(format!(
                "scaleFactor must be positive, got {scale}"
            )));
        }
        Ok(())
    }

    /// URI configured for an orientation.
    #[must_use]
    pub fn uri(&self, orientation: Orientation) -> Option<&str> {
        self.images
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(orientation.as_str()))
            .map(|(_, uri)| uri.as_str())
    }
}

/// Preloaded garment variants plus calibration. Immutable once loaded.
#[derive(Debug)]
pub struct GarmentAsset {
    /// Product identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Fitting constants.
    pub calibration: Calibration,
    variants: [OnceLock<RgbaImage>; 4],
}

impl GarmentAsset {
    /// Create an asset with no variants loaded yet.
    #[must_use]
    pub fn empty(id: impl Into<String>, name: impl Into<String>, calibration: Calibration) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            calibration,
            variants: Default::default(),
        }
    }

    /// Build an asset from images already in memory.
    #[must_use]
    pub fn from_images(
        calibration: Calibration,
        images: impl IntoIterator<Item = (Orientation, RgbaImage)>,
    ) -> Self {
        let asset = Self::empty("", "", calibration);
        for (orientation, image) in images {
            asset.set(orientation, image);
        }
        asset
    }

    /// Start loading every variant named by `catalog` in the background.
    ///
    /// Returns immediately. The returned handles can be joined to wait for
    /// all variants; dropping them leaves the loads running.
    #[must_use]
    pub fn preload(catalog: &GarmentCatalog) -> (Arc<Self>, Vec<JoinHandle<()>>) {
        let asset = Arc::new(Self::empty(&catalog.id, &catalog.name, catalog.calibration));

        let handles = Orientation::ALL
            .iter()
            .filter_map(|&orientation| {
                let uri = catalog.uri(orientation)?.to_string();
                let base_dir = catalog.base_dir.clone();
                let asset = Arc::clone(&asset);
                Some(thread::spawn(move || {
                    match load_image(&uri, base_dir.as_deref()) {
                        Ok(image) => asset.set(orientation, image),
                        Err(e) => warn!("Garment '{orientation}' variant not loaded: {e}"),
                    }
                }))
            })
            .collect();

        (asset, handles)
    }

    /// Store a variant. The first write wins.
    pub fn set(&self, orientation: Orientation, image: RgbaImage) {
        let _ = self.variants[orientation.index()].set(image);
    }

    /// The variant for an orientation, if loaded.
    #[must_use]
    pub fn image(&self, orientation: Orientation) -> Option<&RgbaImage> {
        self.variants[orientation.index()].get()
    }

    /// Number of loaded variants.
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.variants.iter().filter(|v| v.get().is_some()).count()
    }
}

/// Fetch and decode a garment image from an HTTP(S) URL or a file path.
///
/// # Errors
///
/// Returns [`OverlayError::AssetError`] if the image cannot be fetched or decoded.
pub fn load_image(uri: &str, base_dir: Option<&Path>) -> Result<RgbaImage> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        let bytes = ureq::get(uri)
            .call()
            .map_err(|e| OverlayError::AssetError(format!("Failed to download {uri}: {e}")))?
            .into_body()
            .read_to_vec()
            .map_err(|e| OverlayError::AssetError(format!("Failed to read response from {uri}: {e}")))?;

        return image::load_from_memory(&bytes)
            .map(|img| img.to_rgba8())
            .map_err(|e| OverlayError::AssetError(format!("Failed to decode image from {uri}: {e}")));
    }

    let path = Path::new(uri);
    let path = match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    };
    image::open(&path)
        .map(|img| img.to_rgba8())
        .map_err(|e| OverlayError::AssetError(format!("Failed to load {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_default_catalog_has_all_views() {
        let catalog = GarmentCatalog::default();
        for orientation in Orientation::ALL {
            assert!(catalog.uri(orientation).is_some());
        }
        assert!((catalog.calibration.scale_factor - 1.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_catalog_from_json() {
        let catalog = GarmentCatalog::from_json(
            r#"{
                "id": "tee",
                "images": { "front": "front.png", "Back": "back.png" },
                "calibration": { "scaleFactor": 2.1 }
            }"#,
        )
        .unwrap();
        assert_eq!(catalog.uri(Orientation::Front), Some("front.png"));
        assert_eq!(catalog.uri(Orientation::Back), Some("back.png"));
        assert_eq!(catalog.uri(Orientation::Left), None);
        assert!((catalog.calibration.vertical_offset).abs() < f32::EPSILON);
    }

    #[test]
    fn test_catalog_rejects_bad_input() {
        let unknown_view = r#"{ "images": { "top": "x.png" } }"#;
        assert!(GarmentCatalog::from_json(unknown_view).is_err());

        let bad_scale = r#"{ "images": {}, "calibration": { "scaleFactor": 0 } }"#;
        assert!(GarmentCatalog::from_json(bad_scale).is_err());
    }

    #[test]
    fn test_asset_first_write_wins() {
        let asset = GarmentAsset::empty("id", "name", Calibration::default());
        assert_eq!(asset.loaded(), 0);
        asset.set(Orientation::Left, RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])));
        asset.set(Orientation::Left, RgbaImage::new(4, 4));
        assert_eq!(asset.image(Orientation::Left).unwrap().dimensions(), (2, 2));
        assert!(asset.image(Orientation::Front).is_none());
        assert_eq!(asset.loaded(), 1);
    }

    #[test]
    fn test_preload_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(6, 8, Rgba([200, 10, 10, 255]))
            .save(dir.path().join("front.png"))
            .unwrap();

        let catalog = GarmentCatalog {
            images: [
                ("front".to_string(), "front.png".to_string()),
                ("back".to_string(), "missing.png".to_string()),
            ]
            .into_iter()
            .collect(),
            base_dir: Some(dir.path().to_path_buf()),
            ..GarmentCatalog::default()
        };

        let (asset, handles) = GarmentAsset::preload(&catalog);
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(asset.image(Orientation::Front).unwrap().dimensions(), (6, 8));
        assert!(asset.image(Orientation::Back).is_none());
        assert_eq!(asset.loaded(), 1);
    }
}
