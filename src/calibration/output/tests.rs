#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;

    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;
    use tiff::decoder::{Decoder, DecodingResult};
    use tiff::tags::Tag;

    use crate::calibration::aligner::ReflectanceStack;
    use crate::calibration::capture::{BandKind, GpsPosition};
    use crate::calibration::common::error::CalibrationError;
    use crate::calibration::common::raster::{PixelRect, Raster};
    use crate::calibration::output::{
        CSV_HEADER, CaptureMetadataRecord, ExifToolTagger, MetadataTagger, StackEncoding,
        StackSampleFormat, StackWriter, StandardStackWriter, TiffCompression, decimal_to_dms,
        render_preview, save_preview, write_flight_path, write_metadata_log,
    };
    use crate::calibration::reflectance::CalibrationMode;

    fn record(file: &str) -> CaptureMetadataRecord {
        CaptureMetadataRecord {
            source_file: PathBuf::from(file),
            timestamp: Utc.with_ymd_and_hms(2022, 6, 1, 10, 21, 3).unwrap(),
            gps: GpsPosition {
                latitude: -33.5,
                longitude: 151.25,
                altitude: 120.0,
            },
            focal_length_mm: 5.5,
            resolution: 266.67,
        }
    }

    fn stack(bands: Vec<Raster>, kinds: Vec<BandKind>) -> ReflectanceStack {
        let (width, height) = (bands[0].width, bands[0].height);
        ReflectanceStack {
            band_names: (0..bands.len()).map(|i| format!("Band{}", i + 1)).collect(),
            bands,
            band_kinds: kinds,
            crop: PixelRect::new(0, 0, width, height),
            mode: CalibrationMode::Reflectance,
        }
    }

    #[test]
    fn test_decimal_to_dms() {
        let (d, m, s) = decimal_to_dms(33.53604);
        assert_eq!(d, 33.0);
        assert_eq!(m, 32.0);
        assert_relative_eq!(s, 9.74, epsilon = 1e-9);

        let (d, m, s) = decimal_to_dms(-151.25);
        assert_eq!((d, m), (-151.0, 15.0));
        assert_relative_eq!(s, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_csv_row_format() {
        let row = record("/out/tif_ex/IMG_0001_1.tif").to_csv_row();

        assert_eq!(
            row,
            "\"/out/tif_ex/IMG_0001_1.tif\",2022:06:01 10:21:03,2022:06:01,10:21:03,\
             \"33 deg 30' 0.00\"\" S\",South,\"151 deg 15' 0.00\"\" E\",East,\
             120.0 m Above Sea Level,Above Sea Level,5.5,266.67,266.67,mm"
        );
        assert_eq!(row.split(',').count(), CSV_HEADER.split(',').count());
    }

    #[test]
    fn test_dms_seconds_carry_into_minutes() {
        // 33 deg 32' 59.996"
        let mut near_minute = record("a.tif");
        near_minute.gps.latitude = 33.0 + 32.0 / 60.0 + 59.996 / 3600.0;
        near_minute.gps.longitude = -(151.0 + 59.0 / 60.0 + 59.999 / 3600.0);

        assert_eq!(decimal_to_dms(near_minute.gps.latitude), (33.0, 33.0, 0.0));
        let row = near_minute.to_csv_row();
        assert!(row.contains("\"33 deg 33' 0.00\"\" N\",North"), "{}", row);
        assert!(row.contains("\"152 deg 0' 0.00\"\" W\",West"), "{}", row);
    }

    #[test]
    fn test_metadata_log_has_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");

        write_metadata_log(&path, &[record("a.tif"), record("b.tif")]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[0].starts_with("SourceFile,DateTimeOriginal,GPSDateStamp"));
        assert!(lines[2].starts_with("\"b.tif\","));
    }

    #[test]
    fn test_float_stack_round_trip() {
        let bands = vec![
            Raster::from_fn(3, 2, |x, y| (x + 10 * y) as f32 * 0.01),
            Raster::filled(3, 2, 21.5),
        ];
        let stack = stack(bands, vec![BandKind::Multispectral, BandKind::Thermal]);
        let mut bytes = Vec::new();

        StandardStackWriter
            .write_stack(&stack, &mut bytes, &StackEncoding::default())
            .unwrap();

        let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (3, 2));
        assert_eq!(
            decoder.get_tag_ascii_string(Tag::ImageDescription).unwrap(),
            "Band1 (reflectance)"
        );
        match decoder.read_image().unwrap() {
            DecodingResult::F32(values) => assert_eq!(values, stack.bands[0].data),
            _ => panic!("expected f32 samples"),
        }

        assert!(decoder.more_images());
        decoder.next_image().unwrap();
        assert_eq!(
            decoder.get_tag_ascii_string(Tag::ImageDescription).unwrap(),
            "Band2 (celsius)"
        );
        match decoder.read_image().unwrap() {
            DecodingResult::F32(values) => assert!(values.iter().all(|&v| v == 21.5)),
            _ => panic!("expected f32 samples"),
        }
        assert!(!decoder.more_images());
    }

    #[test]
    fn test_scaled_u16_stack() {
        let bands = vec![
            Raster::new(4, 1, vec![0.5, 3.0, -0.1, f32::NAN]).unwrap(),
            Raster::filled(4, 1, 26.85),
        ];
        let stack = stack(bands, vec![BandKind::Multispectral, BandKind::Thermal]);
        let encoding = StackEncoding {
            compression: TiffCompression::Lzw,
            sample_format: StackSampleFormat::ScaledU16,
        };
        let mut bytes = Vec::new();

        StandardStackWriter.write_stack(&stack, &mut bytes, &encoding).unwrap();

        let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        match decoder.read_image().unwrap() {
            DecodingResult::U16(values) => assert_eq!(values, vec![16384, 65535, 0, 0]),
            _ => panic!("expected u16 samples"),
        }
        decoder.next_image().unwrap();
        match decoder.read_image().unwrap() {
            DecodingResult::U16(values) => assert_eq!(values, vec![30000; 4]),
            _ => panic!("expected u16 samples"),
        }
    }

    #[test]
    fn test_preview_stretch() {
        let bands = vec![
            Raster::filled(4, 3, 0.1),
            Raster::filled(4, 3, 0.2),
            Raster::from_fn(4, 3, |x, _| 0.1 + 0.1 * x as f32),
        ];
        let stack = stack(bands, vec![BandKind::Multispectral; 3]);

        let image = render_preview(&stack, [2, 1, 0]).unwrap();

        assert_eq!(image.dimensions(), (4, 3));
        let left = image.get_pixel(0, 0);
        let right = image.get_pixel(3, 0);
        // red follows band 2, blue follows band 0
        assert!(right[0] > left[0]);
        assert_eq!(left[2], 0);
        assert!(left[1] > left[2]);
    }

    #[test]
    fn test_preview_written_as_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IMG_0001_1.jpg");
        let bands = vec![Raster::from_fn(8, 8, |x, y| (x * y) as f32); 3];
        let stack = stack(bands, vec![BandKind::Multispectral; 3]);

        save_preview(&stack, [2, 1, 0], &path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn test_flight_path_geojson() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("imageset.json");

        write_flight_path(&path, &[record("a.tif")]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        let coords = &value["features"][0]["geometry"]["coordinates"];
        assert_eq!(coords[0], 151.25);
        assert_eq!(coords[1], -33.5);
    }

    #[test]
    fn test_tagger_missing_program() {
        let dir = TempDir::new().unwrap();
        let tagger = ExifToolTagger::new(dir.path().join("no-such-exiftool"));

        let result = tagger.tag(&dir.path().join("log.csv"), dir.path());

        assert!(matches!(result, Err(CalibrationError::ExternalTagging(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_tagger_exit_status() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("log.csv");

        assert!(ExifToolTagger::new("true").tag(&csv, dir.path()).is_ok());
        assert!(matches!(
            ExifToolTagger::new("false").tag(&csv, dir.path()),
            Err(CalibrationError::ExternalTagging(_))
        ));
    }
}
