//! Spatial models on the celestial sphere.
//!
//! Kernels take longitude and latitude in degrees. The normalized shapes return a
//! surface brightness in the output unit, which must be a density per solid angle
//! (per steradian until units are set). Shape parameters are read in degrees
//! whatever angle unit the axes carry.

use crate::error::{FunctionError, Result};
use crate::function::{degree, Function2D, FunctionCore, UnitAssignment};
use crate::sphere::{angular_distance, angular_distances, destination, Boundaries};
use crate::template::{TemplateImage, TemplateLoader};
use crate::units::{Dimension, Unit};
use ndarray::{Array1, Zip};
use std::f64::consts::PI;
use std::path::Path;
use tracing::debug;

#[cfg(feature = "galactic")]
use nalgebra::{Matrix3, Vector3};

/// Square degrees per steradian.
const DEG2_PER_SR: f64 = (180.0 / PI) * (180.0 / PI);

/// Upper bound of an angular parameter, in degrees.
fn max_degrees(core: &FunctionCore, name: &str) -> Result<f64> {
    let param = core.parameter(name)?;
    let factor = match param.unit() {
        Some(unit) => unit
            .conversion_factor(&degree())
            .map_err(|e| FunctionError::unit_mismatch(name, e.to_string()))?,
        None => 1.0,
    };
    Ok(param.max() * factor)
}

fn per_steradian() -> Unit {
    Unit::new("1 / sr", 1.0, Dimension::SOLID_ANGLE.invert())
}

/// The normalized shapes only make sense as a density per solid angle.
fn require_surface_density(function: &str, z_unit: &Unit) -> Result<()> {
    if !z_unit.is_compatible(&per_steradian()) {
        return Err(FunctionError::unit_mismatch(
            "z",
            format!("{} returns a density per solid angle, got {}", function, z_unit),
        ));
    }
    Ok(())
}

/// Factor taking a density per steradian into the output unit.
fn density_scale(core: &FunctionCore) -> Result<f64> {
    match core.axis_unit(2) {
        Some(z_unit) => per_steradian()
            .conversion_factor(z_unit)
            .map_err(|e| FunctionError::unit_mismatch("z", e.to_string())),
        None => Ok(1.0),
    }
}

fn centred_units(shape: &'static str, x_unit: &Unit, y_unit: &Unit) -> UnitAssignment {
    vec![
        ("lon0", x_unit.clone()),
        ("lat0", y_unit.clone()),
        (shape, x_unit.clone()),
    ]
}

fn require_positive(function: &str, name: &str, value: f64) -> Result<()> {
    if value <= 0.0 {
        return Err(FunctionError::ModelDomainViolation(format!(
            "{}: {} must be positive, got {}",
            function, name, value
        )));
    }
    Ok(())
}

const GAUSSIAN_ON_SPHERE_META: &str = r#"
description: A bidimensional Gaussian function on a sphere (in spherical coordinates)
latex: 'f(\vec{x}) = \left(\frac{180^\circ}{\pi}\right)^2 \frac{1}{2\pi \sigma^2} \exp\left(-\frac{d^2}{2\sigma^2}\right)'
parameters:
  lon0:
    desc: Longitude of the center of the source
    initial value: 0.0
    min: 0.0
    max: 360.0
  lat0:
    desc: Latitude of the center of the source
    initial value: 0.0
    min: -90.0
    max: 90.0
  sigma:
    desc: Standard deviation of the Gaussian distribution
    initial value: 0.5
    min: 0
    max: 20
"#;

builtin_function!(
    /// Symmetric Gaussian in angular distance from (`lon0`, `lat0`), normalized to
    /// unit integral in the small-angle limit.
    GaussianOnSphere,
    "Gaussian_on_sphere",
    GAUSSIAN_ON_SPHERE_META
);

impl Function2D for GaussianOnSphere {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit, z_unit: &Unit) -> Result<UnitAssignment> {
        require_surface_density(Self::NAME, z_unit)?;
        Ok(centred_units("sigma", x_unit, y_unit))
    }

    fn kernel(&self, lon: &Array1<f64>, lat: &Array1<f64>) -> Result<Array1<f64>> {
        let lon0 = self.degrees("lon0")?;
        let lat0 = self.degrees("lat0")?;
        let sigma = self.degrees("sigma")?;
        require_positive(Self::NAME, "sigma", sigma)?;

        let norm = density_scale(&self.core)? * DEG2_PER_SR / (2.0 * PI * sigma * sigma);
        Ok(angular_distances(lon0, lat0, lon, lat).mapv(|d| norm * (-0.5 * d * d / (sigma * sigma)).exp()))
    }

    /// Truncated at twice the largest allowed sigma.
    fn get_boundaries(&self) -> Result<Boundaries> {
        let extent = 2.0 * max_degrees(&self.core, "sigma")?;
        Ok(Boundaries::around(self.degrees("lon0")?, self.degrees("lat0")?, extent))
    }
}

const DISK_ON_SPHERE_META: &str = r#"
description: A bidimensional disk/tophat function on a sphere (in spherical coordinates)
latex: 'f(\vec{x}) = \left(\frac{180}{\pi}\right)^2 \frac{1}{\pi~({\rm radius})^2} ~\left\{\begin{matrix} 1 & {\rm if}& {\rm | \vec{x} - \vec{x}_0| \le {\rm radius}} \\ 0 & {\rm if}& {\rm | \vec{x} - \vec{x}_0| > {\rm radius}} \end{matrix}\right.'
parameters:
  lon0:
    desc: Longitude of the center of the source
    initial value: 0.0
    min: 0.0
    max: 360.0
  lat0:
    desc: Latitude of the center of the source
    initial value: 0.0
    min: -90.0
    max: 90.0
  radius:
    desc: Radius of the disk
    initial value: 0.5
    min: 0
    max: 20
"#;

builtin_function!(
    /// Uniform disk of angular `radius` around (`lon0`, `lat0`); the edge belongs to the disk.
    DiskOnSphere,
    "Disk_on_sphere",
    DISK_ON_SPHERE_META
);

impl Function2D for DiskOnSphere {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit, z_unit: &Unit) -> Result<UnitAssignment> {
        require_surface_density(Self::NAME, z_unit)?;
        Ok(centred_units("radius", x_unit, y_unit))
    }

    fn kernel(&self, lon: &Array1<f64>, lat: &Array1<f64>) -> Result<Array1<f64>> {
        let lon0 = self.degrees("lon0")?;
        let lat0 = self.degrees("lat0")?;
        let radius = self.degrees("radius")?;
        require_positive(Self::NAME, "radius", radius)?;

        let level = density_scale(&self.core)? * DEG2_PER_SR / (PI * radius * radius);
        Ok(angular_distances(lon0, lat0, lon, lat).mapv(|d| if d <= radius { level } else { 0.0 }))
    }

    fn get_boundaries(&self) -> Result<Boundaries> {
        let extent = 2.0 * max_degrees(&self.core, "radius")?;
        Ok(Boundaries::around(self.degrees("lon0")?, self.degrees("lat0")?, extent))
    }
}

const ELLIPSE_ON_SPHERE_META: &str = r#"
description: An ellipse function on a sphere (in spherical coordinates)
latex: 'f(\vec{x}) = \left(\frac{180}{\pi}\right)^2 \frac{1}{\pi~ a b} ~\left\{\begin{matrix} 1 & {\rm if}& {\rm | \vec{x} - \vec{x}_{f1}| + | \vec{x} - \vec{x}_{f2}| \le {\rm 2a}} \\ 0 & {\rm if}& {\rm | \vec{x} - \vec{x}_{f1}| + | \vec{x} - \vec{x}_{f2}| > {\rm 2a}} \end{matrix}\right.'
parameters:
  lon0:
    desc: Longitude of the center of the source
    initial value: 0.0
    min: 0.0
    max: 360.0
  lat0:
    desc: Latitude of the center of the source
    initial value: 0.0
    min: -90.0
    max: 90.0
  a:
    desc: semimajor axis of the ellipse
    initial value: 0.5
    min: 0
    max: 20
  e:
    desc: eccentricity of ellipse
    initial value: 0.5
    min: 0
    max: 1
  theta:
    desc: inclination of semimajoraxis to a line of constant latitude
    initial value: 0.0
    min: -90.0
    max: 90.0
"#;

builtin_function!(
    /// Uniform ellipse: points whose summed geodesic distance to the two foci is at
    /// most `2a`. The foci lie `a e` from the centre along the bearing `90 - theta`.
    EllipseOnSphere,
    "Ellipse_on_sphere",
    ELLIPSE_ON_SPHERE_META
);

impl EllipseOnSphere {
    /// Semiminor axis in degrees.
    pub fn semiminor_axis(&self) -> Result<f64> {
        let a = self.degrees("a")?;
        let e = self.core.value("e")?;
        Ok(a * (1.0 - e * e).sqrt())
    }

    /// The two foci for the current parameters, as (lon, lat) in degrees.
    pub fn focal_points(&self) -> Result<((f64, f64), (f64, f64))> {
        let lon0 = self.degrees("lon0")?;
        let lat0 = self.degrees("lat0")?;
        let a = self.degrees("a")?;
        let e = self.core.value("e")?;
        let theta = self.degrees("theta")?;

        let focal = a * e;
        let bearing = 90.0 - theta;
        Ok((
            destination(lon0, lat0, bearing, focal),
            destination(lon0, lat0, bearing + 180.0, focal),
        ))
    }
}

impl Function2D for EllipseOnSphere {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit, z_unit: &Unit) -> Result<UnitAssignment> {
        require_surface_density(Self::NAME, z_unit)?;
        let mut units = centred_units("a", x_unit, y_unit);
        units.push(("e", Unit::dimensionless()));
        units.push(("theta", x_unit.clone()));
        Ok(units)
    }

    fn kernel(&self, lon: &Array1<f64>, lat: &Array1<f64>) -> Result<Array1<f64>> {
        let a = self.degrees("a")?;
        let b = self.semiminor_axis()?;
        require_positive(Self::NAME, "semiminor axis", b)?;

        let ((lon1, lat1), (lon2, lat2)) = self.focal_points()?;
        let level = density_scale(&self.core)? * DEG2_PER_SR / (PI * a * b);
        Ok(Zip::from(lon).and(lat).map_collect(|&l, &t| {
            let sum = angular_distance(lon1, lat1, l, t) + angular_distance(lon2, lat2, l, t);
            if sum <= 2.0 * a {
                level
            } else {
                0.0
            }
        }))
    }

    /// Truncated at twice the largest allowed semimajor axis.
    fn get_boundaries(&self) -> Result<Boundaries> {
        let extent = 2.0 * max_degrees(&self.core, "a")?;
        Ok(Boundaries::around(self.degrees("lon0")?, self.degrees("lat0")?, extent))
    }
}

const POWER_LAW_ON_SPHERE_META: &str = r#"
description: A power law function on a sphere (in spherical coordinates)
latex: 'f(\vec{x}) = \frac{1}{N} \left\{\begin{matrix} r_0^{index} & {\rm if} & |\vec{x}-\vec{x}_0| \le r_0 \\ |\vec{x}-\vec{x}_0|^{index} & {\rm if} & r_0 < |\vec{x}-\vec{x}_0| \le {\rm maxr} \end{matrix}\right.'
parameters:
  lon0:
    desc: Longitude of the center of the source
    initial value: 0.0
    min: 0.0
    max: 360.0
  lat0:
    desc: Latitude of the center of the source
    initial value: 0.0
    min: -90.0
    max: 90.0
  index:
    desc: power law index
    initial value: -2.0
    min: -5.0
    max: -1.0
  maxr:
    desc: max radius
    initial value: 5.
    fix: yes
"#;

builtin_function!(
    /// Radial power law `θ^index` out to `maxr`, flat inside the core radius
    /// [`PowerLawOnSphere::CORE_RADIUS`] and normalized to unit integral over the
    /// cone (flat-sky approximation, angles in radians).
    PowerLawOnSphere,
    "Power_law_on_sphere",
    POWER_LAW_ON_SPHERE_META
);

impl PowerLawOnSphere {
    /// Radius of the flat core, in degrees.
    pub const CORE_RADIUS: f64 = 0.05;

    /// Integral of the profile over the cone, in steradians.
    fn normalization(index: f64, maxr: f64) -> f64 {
        let r0 = Self::CORE_RADIUS.to_radians();
        let big_r = maxr.to_radians();
        if maxr <= Self::CORE_RADIUS {
            PI * big_r * big_r * r0.powf(index)
        } else if index == -2.0 {
            PI + 2.0 * PI * (big_r / r0).ln()
        } else {
            let s = index + 2.0;
            PI * r0.powf(s) + 2.0 * PI * (big_r.powf(s) - r0.powf(s)) / s
        }
    }
}

impl Function2D for PowerLawOnSphere {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit, z_unit: &Unit) -> Result<UnitAssignment> {
        require_surface_density(Self::NAME, z_unit)?;
        Ok(vec![
            ("lon0", x_unit.clone()),
            ("lat0", y_unit.clone()),
            ("index", Unit::dimensionless()),
            ("maxr", x_unit.clone()),
        ])
    }

    fn kernel(&self, lon: &Array1<f64>, lat: &Array1<f64>) -> Result<Array1<f64>> {
        let lon0 = self.degrees("lon0")?;
        let lat0 = self.degrees("lat0")?;
        let index = self.core.value("index")?;
        let maxr = self.degrees("maxr")?;
        require_positive(Self::NAME, "maxr", maxr)?;

        let norm = Self::normalization(index, maxr) / density_scale(&self.core)?;
        Ok(angular_distances(lon0, lat0, lon, lat).mapv(|d| {
            if d <= maxr {
                d.max(Self::CORE_RADIUS).to_radians().powf(index) / norm
            } else {
                0.0
            }
        }))
    }

    fn get_boundaries(&self) -> Result<Boundaries> {
        Ok(Boundaries::around(
            self.degrees("lon0")?,
            self.degrees("lat0")?,
            self.degrees("maxr")?,
        ))
    }
}

/// Frame in which the coordinates handed to a frame-aware model are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoordinateFrame {
    /// Right ascension and declination (J2000).
    #[default]
    Icrs,
    /// Galactic longitude and latitude.
    Galactic,
}

const LATITUDE_GALACTIC_DIFFUSE_META: &str = r#"
description: A Gaussian distribution in Galactic latitude around the Galactic plane
latex: 'K \exp{\left( \frac{-b^2}{2 \sigma_b^2} \right)}'
parameters:
  K:
    desc: normalization
    initial value: 1
  sigma_b:
    desc: Sigma for
    initial value: 1
"#;

/// Rows of the ICRS to Galactic rotation.
#[cfg(feature = "galactic")]
const ICRS_TO_GALACTIC: [[f64; 3]; 3] = [
    [-0.0548755604162154, -0.8734370902348850, -0.4838350155487132],
    [0.4941094278755837, -0.4448296299600112, 0.7469822444972189],
    [-0.8676661490190047, -0.1980763734312015, 0.4559837761750669],
];

/// Gaussian profile in Galactic latitude, `K exp(-b² / 2σ_b²)`.
///
/// Input coordinates are ICRS unless [`set_frame`](Self::set_frame) says otherwise.
#[cfg(feature = "galactic")]
#[derive(Debug, Clone)]
pub struct LatitudeGalacticDiffuse {
    core: FunctionCore,
    frame: CoordinateFrame,
}

#[cfg(feature = "galactic")]
crate::function_impl!(LatitudeGalacticDiffuse);

#[cfg(feature = "galactic")]
impl LatitudeGalacticDiffuse {
    pub const NAME: &'static str = "Latitude_galactic_diffuse";

    pub fn new() -> Result<Self> {
        Ok(LatitudeGalacticDiffuse {
            core: FunctionCore::from_yaml(Self::NAME, LATITUDE_GALACTIC_DIFFUSE_META)?,
            frame: CoordinateFrame::default(),
        })
    }

    pub fn frame(&self) -> CoordinateFrame {
        self.frame
    }

    pub fn set_frame(&mut self, frame: CoordinateFrame) {
        debug!(function = Self::NAME, ?frame, "coordinate frame changed");
        self.frame = frame;
    }

    /// Galactic latitude of each sample, in degrees.
    pub fn galactic_latitude(&self, lon: &Array1<f64>, lat: &Array1<f64>) -> Array1<f64> {
        match self.frame {
            CoordinateFrame::Galactic => lat.clone(),
            CoordinateFrame::Icrs => {
                let rotation = Matrix3::from_fn(|i, j| ICRS_TO_GALACTIC[i][j]);
                Zip::from(lon).and(lat).map_collect(|&ra, &dec| {
                    let (ra, dec) = (ra.to_radians(), dec.to_radians());
                    let v = Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin());
                    let galactic = rotation * v;
                    galactic.z.clamp(-1.0, 1.0).asin().to_degrees()
                })
            }
        }
    }
}

#[cfg(feature = "galactic")]
impl Function2D for LatitudeGalacticDiffuse {
    fn propagate_units(&self, x_unit: &Unit, _y_unit: &Unit, z_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![("K", z_unit.clone()), ("sigma_b", x_unit.clone())])
    }

    fn kernel(&self, lon: &Array1<f64>, lat: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let sigma_b = self.degrees("sigma_b")?;
        require_positive(Self::NAME, "sigma_b", sigma_b)?;

        let b = self.galactic_latitude(lon, lat);
        Ok(b.mapv(|b| k * (-b * b / (2.0 * sigma_b * sigma_b)).exp()))
    }

    /// The whole sky.
    fn get_boundaries(&self) -> Result<Boundaries> {
        Ok(Boundaries {
            lon: (0.0, 360.0),
            lat: (-90.0, 90.0),
        })
    }
}

const SPATIAL_TEMPLATE_META: &str = r#"
description: User input Spatial Template. Expected to be normalized to 1/sr
latex: 'K \cdot T(\vec{x})'
parameters:
  K:
    desc: normalization
    initial value: 1
    fix: yes
"#;

/// A user-supplied sky map scaled by `K`.
///
/// The map must be loaded before the model can be evaluated or bounded.
#[derive(Debug, Clone)]
pub struct SpatialTemplate2D {
    core: FunctionCore,
    image: Option<TemplateImage>,
}

crate::function_impl!(SpatialTemplate2D);

impl SpatialTemplate2D {
    pub const NAME: &'static str = "SpatialTemplate_2D";

    pub fn new() -> Result<Self> {
        Ok(SpatialTemplate2D {
            core: FunctionCore::from_yaml(Self::NAME, SPATIAL_TEMPLATE_META)?,
            image: None,
        })
    }

    /// Read the map through `loader`. On failure the previous map is kept.
    pub fn load_template(&mut self, loader: &dyn TemplateLoader, path: &Path) -> Result<()> {
        let image = loader.load(path)?;
        self.set_template(image);
        Ok(())
    }

    pub fn set_template(&mut self, image: TemplateImage) {
        debug!(function = Self::NAME, nx = image.nx(), ny = image.ny(), "template set");
        self.image = Some(image);
    }

    pub fn template(&self) -> Option<&TemplateImage> {
        self.image.as_ref()
    }

    fn loaded(&self) -> Result<&TemplateImage> {
        self.image
            .as_ref()
            .ok_or_else(|| FunctionError::InvalidState(format!("{}: no template loaded", Self::NAME)))
    }
}

impl Function2D for SpatialTemplate2D {
    fn propagate_units(&self, _x_unit: &Unit, _y_unit: &Unit, z_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![("K", z_unit.clone())])
    }

    fn kernel(&self, lon: &Array1<f64>, lat: &Array1<f64>) -> Result<Array1<f64>> {
        let image = self.loaded()?;
        let k = self.core.value("K")?;
        Ok(image.sample(lon, lat) * k)
    }

    fn get_boundaries(&self) -> Result<Boundaries> {
        Ok(self.loaded()?.boundaries())
    }
}
