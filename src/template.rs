//! Sky template images for [`SpatialTemplate_2D`](crate::functions::SpatialTemplate2D).
//!
//! A template is a rectangular pixel grid with a linear (CAR-like) mapping between
//! pixel indices and sky coordinates, described by the usual reference pixel,
//! pixel scale and reference coordinate of each axis. Readers for image formats
//! plug in through [`TemplateLoader`]; a JSON loader ships with the crate.

use crate::error::{FunctionError, Result};
use crate::sphere::{wrap_longitude, Boundaries};
use ndarray::{Array1, Array2, Zip};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Pixel-to-sky mapping of a template, one entry per axis (1 = longitude, 2 = latitude).
///
/// Reference pixels are 1-based, as in FITS headers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemplateWcs {
    pub crpix1: f64,
    pub crpix2: f64,
    pub cdelt1: f64,
    pub cdelt2: f64,
    pub crval1: f64,
    pub crval2: f64,
}

/// A template image: `data[[iy, ix]]` is the pixel at row `iy` (latitude) and
/// column `ix` (longitude).
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateImage {
    data: Array2<f64>,
    wcs: TemplateWcs,
}

#[derive(Serialize, Deserialize)]
struct TemplateFile {
    #[serde(flatten)]
    wcs: TemplateWcs,
    /// Rows of pixels, one row per latitude step.
    data: Vec<Vec<f64>>,
}

impl TemplateImage {
    pub fn new(data: Array2<f64>, wcs: TemplateWcs) -> Result<Self> {
        if data.is_empty() {
            return Err(FunctionError::Configuration("template image is empty".to_string()));
        }
        if wcs.cdelt1 == 0.0 || wcs.cdelt2 == 0.0 || !wcs.cdelt1.is_finite() || !wcs.cdelt2.is_finite() {
            return Err(FunctionError::Configuration(
                "template pixel scale must be finite and non-zero".to_string(),
            ));
        }
        Ok(TemplateImage { data, wcs })
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn wcs(&self) -> &TemplateWcs {
        &self.wcs
    }

    /// Number of columns (longitude pixels).
    pub fn nx(&self) -> usize {
        self.data.ncols()
    }

    /// Number of rows (latitude pixels).
    pub fn ny(&self) -> usize {
        self.data.nrows()
    }

    /// Zero-based index of the pixel containing a coordinate, if inside the grid.
    fn pixel(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        let w = &self.wcs;
        let mut dlon = lon - w.crval1;
        dlon = (dlon + 180.0).rem_euclid(360.0) - 180.0;

        let x = (dlon / w.cdelt1 + w.crpix1 - 1.0).round();
        let y = ((lat - w.crval2) / w.cdelt2 + w.crpix2 - 1.0).round();
        if x < 0.0 || y < 0.0 || x >= self.nx() as f64 || y >= self.ny() as f64 {
            return None;
        }
        Some((y as usize, x as usize))
    }

    /// Pixel values at sky coordinates (degrees); outside the grid is zero.
    pub fn sample(&self, lon: &Array1<f64>, lat: &Array1<f64>) -> Array1<f64> {
        Zip::from(lon).and(lat).map_collect(|&l, &b| {
            self.pixel(l, b)
                .map(|(iy, ix)| self.data[[iy, ix]])
                .unwrap_or(0.0)
        })
    }

    /// Sky box covered by the pixel centres.
    pub fn boundaries(&self) -> Boundaries {
        let w = &self.wcs;
        let lon_at = |ix: f64| w.crval1 + (ix + 1.0 - w.crpix1) * w.cdelt1;
        let lat_at = |iy: f64| w.crval2 + (iy + 1.0 - w.crpix2) * w.cdelt2;

        let (lon_a, lon_b) = (lon_at(0.0), lon_at(self.nx() as f64 - 1.0));
        let (lat_a, lat_b) = (lat_at(0.0), lat_at(self.ny() as f64 - 1.0));
        let lat = (lat_a.min(lat_b).max(-90.0), lat_a.max(lat_b).min(90.0));

        let (min_lon, max_lon) = (lon_a.min(lon_b), lon_a.max(lon_b));
        let lon = if max_lon - min_lon >= 360.0 {
            (0.0, 360.0)
        } else {
            (wrap_longitude(min_lon), wrap_longitude(max_lon))
        };
        Boundaries { lon, lat }
    }

    /// Parse the JSON layout: the six WCS keys plus `data` as a list of rows.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TemplateFile = serde_json::from_str(json)?;
        let ny = file.data.len();
        let nx = file.data.first().map_or(0, |row| row.len());
        if file.data.iter().any(|row| row.len() != nx) {
            return Err(FunctionError::DimensionMismatch(format!(
                "template rows must all hold {} pixels",
                nx
            )));
        }
        let flat: Vec<f64> = file.data.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((ny, nx), flat)
            .map_err(|e| FunctionError::DimensionMismatch(e.to_string()))?;
        Self::new(data, file.wcs)
    }

    pub fn to_json(&self) -> Result<String> {
        let file = TemplateFile {
            wcs: self.wcs,
            data: self.data.outer_iter().map(|row| row.to_vec()).collect(),
        };
        Ok(serde_json::to_string(&file)?)
    }
}

/// Reads a template image from a file.
pub trait TemplateLoader {
    fn load(&self, path: &Path) -> Result<TemplateImage>;
}

/// Loader for the JSON layout of [`TemplateImage::from_json`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTemplateLoader;

impl TemplateLoader for JsonTemplateLoader {
    fn load(&self, path: &Path) -> Result<TemplateImage> {
        let text = fs::read_to_string(path)?;
        let image = TemplateImage::from_json(&text)?;
        debug!(path = %path.display(), nx = image.nx(), ny = image.ny(), "template loaded");
        Ok(image)
    }
}
