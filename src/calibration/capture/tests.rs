#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use crate::calibration::capture::{CaptureReader, CaptureSource, ImageSet, TiffCaptureReader};
    use crate::calibration::capture::CaptureMetadata;
    use crate::calibration::common::error::CalibrationError;
    use crate::calibration::common::raster::PixelRect;
    use crate::calibration::test_utils::{panel_reading, write_band_tiff, write_capture};

    #[test]
    fn test_imageset_groups_band_files() {
        let dir = TempDir::new().unwrap();
        write_capture(dir.path(), "IMG_0002", 3, 3, 8, 6, None);
        write_capture(dir.path(), "IMG_0001", 2, 3, 8, 6, None);
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
        std::fs::write(dir.path().join("IMG_0003_x.tif"), "bad band number").unwrap();

        let set = ImageSet::from_directory(dir.path()).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.captures[0].name, "IMG_0001");
        assert_eq!(set.captures[1].name, "IMG_0002");
        assert_eq!(set.captures[1].band_count(), 3);
        let numbers: Vec<usize> = set.captures[1].bands.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(set.captures[0].metadata_path, dir.path().join("IMG_0001.json"));
        assert_eq!(set.max_band_count(), 3);
        assert_eq!(set.representative_index(), Some(1));
    }

    #[test]
    fn test_imageset_orders_bands_numerically() {
        let dir = TempDir::new().unwrap();
        write_capture(dir.path(), "IMG_0001", 10, 10, 4, 4, None);

        let set = ImageSet::from_directory(dir.path()).unwrap();
        let numbers: Vec<usize> = set.captures[0].bands.iter().map(|(n, _)| *n).collect();

        assert_eq!(numbers, (1..=10).collect::<Vec<_>>());
        assert_eq!(set.captures[0].output_base(), "IMG_0001_1");
    }

    #[test]
    fn test_imageset_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = ImageSet::from_directory(&dir.path().join("absent"));

        assert!(matches!(result, Err(CalibrationError::ImagesetLoad(_))));
        assert!(result.unwrap_err().is_fatal());
    }

    #[test]
    fn test_imageset_empty_directory() {
        let dir = TempDir::new().unwrap();
        let result = ImageSet::from_directory(dir.path());

        assert!(matches!(result, Err(CalibrationError::ImagesetLoad(_))));
    }

    #[test]
    fn test_representative_is_first_full_capture() {
        let source = |name: &str, bands: usize| CaptureSource {
            name: name.to_string(),
            bands: (1..=bands)
                .map(|n| (n, PathBuf::from(format!("{}_{}.tif", name, n))))
                .collect(),
            metadata_path: PathBuf::from(format!("{}.json", name)),
        };
        let set = ImageSet::from_sources(
            ".",
            vec![source("A", 4), source("B", 5), source("C", 5)],
        );

        assert_eq!(set.representative_index(), Some(1));
        assert_eq!(ImageSet::from_sources(".", Vec::new()).representative_index(), None);
    }

    #[test]
    fn test_tiff_reader_loads_capture() {
        let dir = TempDir::new().unwrap();
        let panel = panel_reading(2, 0.5, PixelRect::new(1, 1, 3, 2));
        write_capture(dir.path(), "IMG_0007", 2, 2, 6, 5, Some(panel.clone()));

        let set = ImageSet::from_directory(dir.path()).unwrap();
        let capture = TiffCaptureReader.load(&set.captures[0]).unwrap();

        assert_eq!(capture.name, "IMG_0007");
        assert_eq!(capture.band_count(), 2);
        assert_eq!(capture.bands[1].index, 1);
        assert_eq!(capture.bands[1].calibration.band_name, "Band2");
        assert_eq!((capture.bands[0].width, capture.bands[0].height), (6, 5));
        assert_eq!(capture.bands[0].data.len(), 30);
        assert_eq!(capture.panel, Some(panel));
        assert_eq!(capture.optics(), (5.5, 266.67));
    }

    #[test]
    fn test_tiff_reader_round_trips_counts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("band.tif");
        let data: Vec<u16> = (0..12).map(|v| v * 1000).collect();
        write_band_tiff(&path, 4, 3, &data);

        let (width, height, decoded) = TiffCaptureReader::read_band(&path).unwrap();

        assert_eq!((width, height), (4, 3));
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_tiff_reader_missing_band_calibration() {
        let dir = TempDir::new().unwrap();
        write_capture(dir.path(), "IMG_0001", 3, 2, 4, 4, None);

        let set = ImageSet::from_directory(dir.path()).unwrap();
        let result = TiffCaptureReader.load(&set.captures[0]);

        assert!(matches!(result, Err(CalibrationError::MetadataError(_))));
    }

    #[test]
    fn test_tiff_reader_missing_sidecar() {
        let dir = TempDir::new().unwrap();
        write_capture(dir.path(), "IMG_0001", 1, 1, 4, 4, None);
        std::fs::remove_file(dir.path().join("IMG_0001.json")).unwrap();

        let set = ImageSet::from_directory(dir.path()).unwrap();
        let result = TiffCaptureReader.load(&set.captures[0]);

        assert!(matches!(result, Err(CalibrationError::InputReadError(_))));
    }

    #[test]
    fn test_sidecar_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IMG_0001.json");
        std::fs::write(
            &path,
            r#"{
                "timestamp": "2022-06-01T10:21:03Z",
                "gps": { "latitude": 1.0, "longitude": 2.0, "altitude": 3.0 },
                "bands": [ { "band_name": "Blue" }, { "band_name": "LWIR", "kind": "thermal" } ]
            }"#,
        )
        .unwrap();

        let metadata = CaptureMetadata::from_path(&path).unwrap();
        let blue = metadata.band(1).unwrap();

        assert!(metadata.panel.is_none());
        assert_eq!(blue.gain, 1.0);
        assert_eq!(blue.radiometric_calibration, [1.0, 0.0, 0.0]);
        assert_eq!(blue.bits_per_pixel, 16);
        assert_eq!(metadata.band(2).unwrap().kind, crate::calibration::capture::BandKind::Thermal);
        assert!(metadata.band(0).is_none());
        assert!(metadata.band(3).is_none());
    }
}
