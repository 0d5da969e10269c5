use astrofunc_rs::functions::{DiskOnSphere, EllipseOnSphere, GaussianOnSphere, PowerLawOnSphere};
use astrofunc_rs::{Function, Function2D, Samples};
use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const CENTRES: [(f64, f64); 4] = [(359.5, 10.0), (0.5, -20.0), (180.0, 60.0), (10.0, 0.0)];

/// Points uniformly distributed on the sphere, in degrees.
fn sphere_points(n: usize, seed: u64) -> (Array1<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut lon = Array1::zeros(n);
    let mut lat = Array1::zeros(n);
    for i in 0..n {
        lon[i] = 360.0 * rng.gen::<f64>();
        lat[i] = (2.0 * rng.gen::<f64>() - 1.0).asin().to_degrees();
    }
    (lon, lat)
}

/// Evaluates the model everywhere and checks what falls outside its boundaries.
fn assert_contained(f: &dyn Function2D, seed: u64) {
    let lon0 = f.parameter("lon0").unwrap().value();
    let lat0 = f.parameter("lat0").unwrap().value();
    let peak = f
        .evaluate(&Samples::from(vec![lon0]), &Samples::from(vec![lat0]))
        .unwrap()
        .values()[0];
    assert!(peak > 0.0, "{} has no peak at its centre", f.name());

    let boundaries = f.get_boundaries().unwrap();
    assert!(boundaries.contains(lon0, lat0));

    let (lon, lat) = sphere_points(20_000, seed);
    let values = f.evaluate(&Samples::from(lon.clone()), &Samples::from(lat.clone())).unwrap();

    let mut outside = 0usize;
    let mut negligible = 0usize;
    for ((&l, &b), &v) in lon.iter().zip(lat.iter()).zip(values.values().iter()) {
        if !boundaries.contains(l, b) {
            outside += 1;
            if v < 1e-6 * peak {
                negligible += 1;
            }
        }
    }
    assert!(outside > 0, "{}: boundaries cover the whole sample", f.name());
    assert!(
        negligible as f64 >= 0.95 * outside as f64,
        "{} at ({}, {}): {} of {} points outside the boundaries are not negligible",
        f.name(),
        lon0,
        lat0,
        outside - negligible,
        outside
    );
}

fn place(f: &mut dyn Function2D, lon0: f64, lat0: f64) {
    f.set_value("lon0", lon0).unwrap();
    f.set_value("lat0", lat0).unwrap();
}

#[test]
fn test_gaussian_contained() {
    for (i, &(lon0, lat0)) in CENTRES.iter().enumerate() {
        let mut f = GaussianOnSphere::new().unwrap();
        place(&mut f, lon0, lat0);
        f.set_value("sigma", 5.0).unwrap();
        assert_contained(&f, i as u64);
    }
}

#[test]
fn test_disk_contained() {
    for (i, &(lon0, lat0)) in CENTRES.iter().enumerate() {
        let mut f = DiskOnSphere::new().unwrap();
        place(&mut f, lon0, lat0);
        f.set_value("radius", 10.0).unwrap();
        assert_contained(&f, 10 + i as u64);
    }
}

#[test]
fn test_ellipse_contained() {
    for (i, &(lon0, lat0)) in CENTRES.iter().enumerate() {
        let mut f = EllipseOnSphere::new().unwrap();
        place(&mut f, lon0, lat0);
        f.set_value("a", 10.0).unwrap();
        f.set_value("e", 0.5).unwrap();
        f.set_value("theta", 30.0).unwrap();
        assert_contained(&f, 20 + i as u64);
    }
}

#[test]
fn test_power_law_contained() {
    for (i, &(lon0, lat0)) in CENTRES.iter().enumerate() {
        let mut f = PowerLawOnSphere::new().unwrap();
        place(&mut f, lon0, lat0);
        f.set_value("index", -2.5).unwrap();
        assert_contained(&f, 30 + i as u64);
    }
}
