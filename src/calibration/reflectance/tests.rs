#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::calibration::common::error::CalibrationError;
    use crate::calibration::panel::IrradianceVector;
    use crate::calibration::reflectance::{CalibrationMode, ReflectanceConverter, radiance};
    use crate::calibration::test_utils::{band_image, thermal_band};

    #[test]
    fn test_nominal_radiance_is_normalised_counts() {
        let band = band_image(0, 2, 2, vec![0, 16384, 32768, 65535]);

        let r = radiance(&band).unwrap();

        assert_relative_eq!(r.data[0], 0.0);
        assert_relative_eq!(r.data[1], 0.25, epsilon = 1e-6);
        assert_relative_eq!(r.data[2], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_dark_level_floors_at_zero() {
        let mut band = band_image(0, 2, 1, vec![100, 4196]);
        band.calibration.dark_level = 4096.0;

        let r = radiance(&band).unwrap();

        assert_eq!(r.data[0], 0.0);
        assert_relative_eq!(r.data[1], 100.0 / 65536.0, epsilon = 1e-9);
    }

    #[test]
    fn test_gain_and_exposure_divide_radiance() {
        let mut band = band_image(0, 1, 1, vec![32768]);
        band.calibration.gain = 2.0;
        band.calibration.exposure_time = 0.5;
        band.calibration.radiometric_calibration = [3.0, 0.0, 0.0];

        let r = radiance(&band).unwrap();

        assert_relative_eq!(r.data[0], 1.5, epsilon = 1e-6);
    }

    #[test]
    fn test_vignette_darkens_toward_edges() {
        let mut band = band_image(0, 9, 1, vec![32768; 9]);
        band.calibration.vignette_center = Some([4.0, 0.0]);
        band.calibration.vignette_polynomial = vec![0.1];

        let r = radiance(&band).unwrap();

        assert_relative_eq!(r.data[4], 0.5, epsilon = 1e-6);
        // r = 4 at the border: 1 / (1 + 0.1 * 4)
        assert_relative_eq!(r.data[0], 0.5 / 1.4, epsilon = 1e-6);
        assert!(r.data[0] < r.data[2] && r.data[2] < r.data[4]);
    }

    #[test]
    fn test_invalid_exposure_rejected() {
        let mut band = band_image(0, 1, 1, vec![1]);
        band.calibration.exposure_time = 0.0;

        assert!(matches!(radiance(&band), Err(CalibrationError::MetadataError(_))));
    }

    #[test]
    fn test_doubling_irradiance_halves_reflectance() {
        let band = band_image(0, 2, 2, vec![20000; 4]);
        let low = IrradianceVector::new(vec![1.0]);
        let high = IrradianceVector::new(vec![2.0]);

        let a = ReflectanceConverter::new(Some(&low)).convert_band(&band).unwrap();
        let b = ReflectanceConverter::new(Some(&high)).convert_band(&band).unwrap();

        for (x, y) in a.data.iter().zip(&b.data) {
            assert_relative_eq!(*y, x / 2.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_panel_radiance_maps_to_albedo() {
        // A panel of albedo 0.5 measured at radiance L gives E = pi * L / 0.5.
        let band = band_image(0, 1, 1, vec![32768]);
        let e = std::f64::consts::PI * 0.5 / 0.5;
        let irradiance = IrradianceVector::new(vec![e]);

        let reflectance = ReflectanceConverter::new(Some(&irradiance)).convert_band(&band).unwrap();

        assert_relative_eq!(reflectance.data[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_radiance_only_mode() {
        let band = band_image(0, 1, 1, vec![32768]);
        let converter = ReflectanceConverter::new(None);

        assert_eq!(converter.mode(), CalibrationMode::RadianceOnly);
        assert_relative_eq!(converter.convert_band(&band).unwrap().data[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_thermal_is_celsius_without_irradiance() {
        let band = thermal_band(1, 2, 1, 30315);
        let irradiance = IrradianceVector::new(vec![10.0]);

        let celsius = ReflectanceConverter::new(Some(&irradiance)).convert_band(&band).unwrap();

        assert_relative_eq!(celsius.data[0], 30.0, epsilon = 1e-4);
    }

    #[test]
    fn test_missing_irradiance_for_band() {
        let bands = vec![band_image(0, 1, 1, vec![1]), band_image(1, 1, 1, vec![1])];
        let irradiance = IrradianceVector::new(vec![1.0]);

        let result = ReflectanceConverter::new(Some(&irradiance)).convert_all(&bands);

        assert!(matches!(result, Err(CalibrationError::MetadataError(_))));
    }
}
