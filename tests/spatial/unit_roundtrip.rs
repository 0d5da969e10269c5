use approx::assert_relative_eq;
use astrofunc_rs::functions::{DiskOnSphere, EllipseOnSphere, GaussianOnSphere, PowerLawOnSphere, SpatialTemplate2D};
use astrofunc_rs::template::{TemplateImage, TemplateWcs};
use astrofunc_rs::{Function, Function2D, FunctionError, Quantity, Samples, Unit};
use ndarray::{array, Array1, Array2};

fn deg() -> Unit {
    Unit::parse("deg").unwrap()
}

fn rad() -> Unit {
    Unit::parse("rad").unwrap()
}

fn per_sr() -> Unit {
    Unit::parse("1 / sr").unwrap()
}

fn per_deg2() -> Unit {
    Unit::parse("1 / deg2").unwrap()
}

/// Evaluates plain degrees, degree quantities and radian quantities.
fn assert_same_sky(f: &mut dyn Function2D, lon: Array1<f64>, lat: Array1<f64>) {
    let plain = f
        .evaluate(&Samples::from(lon.clone()), &Samples::from(lat.clone()))
        .unwrap();

    f.set_units(&deg(), &deg(), &per_sr()).unwrap();
    let in_degrees = f
        .evaluate(
            &Samples::WithUnit(Quantity::new(lon.clone(), deg())),
            &Samples::WithUnit(Quantity::new(lat.clone(), deg())),
        )
        .unwrap();
    assert_eq!(in_degrees.unit(), Some(&per_sr()));

    let in_radians = f
        .evaluate(
            &Samples::WithUnit(Quantity::new(lon.mapv(f64::to_radians), rad())),
            &Samples::WithUnit(Quantity::new(lat.mapv(f64::to_radians), rad())),
        )
        .unwrap();

    for i in 0..lon.len() {
        assert_relative_eq!(in_degrees.values()[i], plain.values()[i], max_relative = 1e-12);
        assert_relative_eq!(in_radians.values()[i], plain.values()[i], max_relative = 1e-9);
    }
}

#[test]
fn test_gaussian_degrees_and_radians() {
    let mut f = GaussianOnSphere::new().unwrap();
    f.set_value("lon0", 10.0).unwrap();
    f.set_value("sigma", 2.0).unwrap();
    assert_same_sky(&mut f, array![10.0, 11.0, 13.0, 8.0], array![0.0, 1.0, -2.0, 0.5]);
}

#[test]
fn test_disk_and_ellipse_degrees_and_radians() {
    let mut f = DiskOnSphere::new().unwrap();
    f.set_value("radius", 3.0).unwrap();
    assert_same_sky(&mut f, array![0.0, 1.0, 2.5, 359.0], array![0.0, 1.0, 0.0, -4.0]);

    let mut f = EllipseOnSphere::new().unwrap();
    f.set_value("a", 3.0).unwrap();
    f.set_value("theta", 20.0).unwrap();
    assert_same_sky(&mut f, array![0.0, 2.0, 0.0, 358.0], array![0.0, 0.5, 2.0, 0.0]);
}

#[test]
fn test_template_degrees_and_radians() {
    let wcs = TemplateWcs {
        crpix1: 2.0,
        crpix2: 2.0,
        cdelt1: 1.0,
        cdelt2: 1.0,
        crval1: 50.0,
        crval2: 20.0,
    };
    let data = Array2::from_shape_vec((3, 3), (1..=9).map(f64::from).collect()).unwrap();
    let mut f = SpatialTemplate2D::new().unwrap();
    f.set_template(TemplateImage::new(data, wcs).unwrap());
    assert_same_sky(&mut f, array![50.0, 49.2, 51.1, 60.0], array![20.0, 21.0, 19.3, 20.0]);
}

#[test]
fn test_radian_axes_take_plain_radians() {
    let mut f = GaussianOnSphere::new().unwrap();
    f.set_units(&rad(), &rad(), &per_sr()).unwrap();
    f.set_value("lon0", 0.2).unwrap();
    f.set_value("sigma", 0.05).unwrap();

    // the kernel sees degrees
    let y = f.evaluate(&Samples::from(vec![0.2]), &Samples::from(vec![0.0])).unwrap();
    let sigma = 0.05f64.to_degrees();
    let expected = (180.0 / std::f64::consts::PI).powi(2) / (2.0 * std::f64::consts::PI * sigma * sigma);
    assert_relative_eq!(y.values()[0], expected, max_relative = 1e-12);
}

#[test]
fn test_mixed_samples_rejected() {
    let mut f = GaussianOnSphere::new().unwrap();
    f.set_units(&deg(), &deg(), &per_sr()).unwrap();
    let result = f.evaluate(
        &Samples::from(vec![0.0]),
        &Samples::WithUnit(Quantity::new(array![0.0], deg())),
    );
    assert!(matches!(result, Err(FunctionError::UnitMismatch { .. })));

    let result = f.evaluate(&Samples::from(vec![0.0, 1.0]), &Samples::from(vec![0.0]));
    assert!(matches!(result, Err(FunctionError::DimensionMismatch(_))));
}

/// Evaluates `build()` once per steradian and once per square degree at the same points.
fn assert_same_density<F, B>(build: B, lon: Array1<f64>, lat: Array1<f64>)
where
    F: Function2D,
    B: Fn() -> F,
{
    let mut per_steradian = build();
    per_steradian.set_units(&deg(), &deg(), &per_sr()).unwrap();
    let mut per_square_degree = build();
    per_square_degree.set_units(&deg(), &deg(), &per_deg2()).unwrap();

    let x = Samples::WithUnit(Quantity::new(lon.clone(), deg()));
    let y = Samples::WithUnit(Quantity::new(lat.clone(), deg()));
    let reference = per_steradian.evaluate(&x, &y).unwrap();
    let tagged = per_square_degree.evaluate(&x, &y).unwrap();
    assert_eq!(tagged.unit(), Some(&per_deg2()));

    let plain = per_square_degree
        .evaluate(&Samples::from(lon.clone()), &Samples::from(lat))
        .unwrap();
    let converted = match &tagged {
        Samples::WithUnit(q) => q.values_in(&per_sr()).unwrap(),
        Samples::Plain(_) => panic!("expected a quantity"),
    };

    let mut nonzero = 0;
    for i in 0..lon.len() {
        assert_relative_eq!(converted[i], reference.values()[i], max_relative = 1e-12);
        assert_relative_eq!(plain.values()[i], tagged.values()[i], max_relative = 1e-12);
        if reference.values()[i] > 0.0 {
            nonzero += 1;
        }
    }
    assert!(nonzero > 0);
}

#[test]
fn test_gaussian_per_square_degree() {
    assert_same_density(
        || {
            let mut f = GaussianOnSphere::new().unwrap();
            f.set_value("sigma", 2.0).unwrap();
            f
        },
        array![1.0, 0.0, 3.0],
        array![1.0, 0.0, -2.0],
    );

    // the density integrates to one over the sky in square degrees
    let mut f = GaussianOnSphere::new().unwrap();
    f.set_units(&deg(), &deg(), &per_deg2()).unwrap();
    let peak = f.evaluate(&Samples::from(vec![0.0]), &Samples::from(vec![0.0])).unwrap();
    assert_relative_eq!(peak.values()[0], 1.0 / (2.0 * std::f64::consts::PI * 0.25), max_relative = 1e-12);
}

#[test]
fn test_disk_ellipse_power_law_per_square_degree() {
    assert_same_density(
        || {
            let mut f = DiskOnSphere::new().unwrap();
            f.set_value("radius", 2.0).unwrap();
            f
        },
        array![0.0, 1.0, 5.0],
        array![0.0, 1.0, 0.0],
    );
    assert_same_density(
        || {
            let mut f = EllipseOnSphere::new().unwrap();
            f.set_value("a", 3.0).unwrap();
            f
        },
        array![0.0, 2.0, 10.0],
        array![0.0, 0.5, 0.0],
    );
    assert_same_density(
        || PowerLawOnSphere::new().unwrap(),
        array![0.0, 1.0, 3.0, 8.0],
        array![0.0, 0.5, 0.0, 0.0],
    );
}

#[test]
fn test_normalized_shapes_reject_other_outputs() {
    let flux = Unit::parse("1 / (keV cm2 s)").unwrap();
    let shapes: Vec<Box<dyn Function2D>> = vec![
        Box::new(GaussianOnSphere::new().unwrap()),
        Box::new(DiskOnSphere::new().unwrap()),
        Box::new(EllipseOnSphere::new().unwrap()),
        Box::new(PowerLawOnSphere::new().unwrap()),
    ];
    for mut f in shapes {
        match f.set_units(&deg(), &deg(), &flux) {
            Err(FunctionError::UnitMismatch { axis, .. }) => assert_eq!(axis, "z"),
            other => panic!("{}: expected a z unit mismatch, got {:?}", f.name(), other),
        }
    }
}
