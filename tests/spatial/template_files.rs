use astrofunc_rs::functions::SpatialTemplate2D;
use astrofunc_rs::template::{JsonTemplateLoader, TemplateImage, TemplateWcs};
use astrofunc_rs::{Function, Function2D, FunctionError, Samples};
use ndarray::{array, Array2};
use std::fs;
use std::path::PathBuf;

fn template_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("astrofunc_{}_{}.json", name, std::process::id()))
}

/// 5 x 3 pixels of 2 degrees, centred on (100, -10).
fn image() -> TemplateImage {
    let mut data = Array2::zeros((3, 5));
    for ((iy, ix), v) in data.indexed_iter_mut() {
        *v = (10 * iy + ix) as f64;
    }
    let wcs = TemplateWcs {
        crpix1: 3.0,
        crpix2: 2.0,
        cdelt1: 2.0,
        cdelt2: 2.0,
        crval1: 100.0,
        crval2: -10.0,
    };
    TemplateImage::new(data, wcs).unwrap()
}

#[test]
fn test_template_from_file() {
    let path = template_path("load");
    fs::write(&path, image().to_json().unwrap()).unwrap();

    let mut f = SpatialTemplate2D::new().unwrap();
    f.load_template(&JsonTemplateLoader, &path).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(f.template(), Some(&image()));

    // centre pixel, one column east, one row north, and off the grid
    let lon = array![100.0, 102.0, 100.0, 120.0];
    let lat = array![-10.0, -10.0, -8.0, -10.0];
    let y = f.evaluate(&Samples::from(lon.clone()), &Samples::from(lat.clone())).unwrap();
    assert_eq!(y.values(), &array![12.0, 13.0, 22.0, 0.0]);

    f.set_value("K", 2.0).unwrap();
    let y = f.evaluate(&Samples::from(lon), &Samples::from(lat)).unwrap();
    assert_eq!(y.values(), &array![24.0, 26.0, 44.0, 0.0]);

    let b = f.get_boundaries().unwrap();
    assert_eq!(b.lon, (96.0, 104.0));
    assert_eq!(b.lat, (-12.0, -8.0));
}

#[test]
fn test_failed_load_keeps_previous_template() {
    let mut f = SpatialTemplate2D::new().unwrap();
    let missing = template_path("missing");
    assert!(matches!(
        f.load_template(&JsonTemplateLoader, &missing),
        Err(FunctionError::IoError(_))
    ));
    assert!(f.template().is_none());

    f.set_template(image());
    assert!(f.load_template(&JsonTemplateLoader, &missing).is_err());
    assert_eq!(f.template(), Some(&image()));

    let garbage = template_path("garbage");
    fs::write(&garbage, "{\"crpix1\": 1}").unwrap();
    let result = f.load_template(&JsonTemplateLoader, &garbage);
    fs::remove_file(&garbage).unwrap();
    assert!(matches!(result, Err(FunctionError::JsonError(_))));
    assert_eq!(f.template(), Some(&image()));
}

#[test]
fn test_ragged_template_rejected() {
    let path = template_path("ragged");
    let json = r#"{"crpix1": 1, "crpix2": 1, "cdelt1": 1, "cdelt2": 1, "crval1": 0, "crval2": 0,
                   "data": [[1, 2], [3]]}"#;
    fs::write(&path, json).unwrap();
    let mut f = SpatialTemplate2D::new().unwrap();
    let result = f.load_template(&JsonTemplateLoader, &path);
    fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(FunctionError::DimensionMismatch(_))));
}
