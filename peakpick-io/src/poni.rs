//! PONI calibration files.
//!
//! A PONI file is a list of `Key: value` lines describing the sample-detector
//! geometry found by a powder calibration. Lines starting with `#` are
//! comments and keys are matched case-insensitively.

use crate::{Error, Result};
use peakpick_qspace::Geometry;
use std::collections::HashMap;
use std::path::Path;

/// Pixel pitch of detector families that PONI files name without a config.
const KNOWN_DETECTORS: [(&str, f64); 2] = [("eiger", 75e-6), ("pilatus", 172e-6)];

/// Read and parse a PONI file.
///
/// # Errors
/// See [`parse_poni`].
pub fn read_poni<P: AsRef<Path>>(path: P) -> Result<Geometry> {
    let text = std::fs::read_to_string(path)?;
    parse_poni(&text)
}

/// Parse the text of a PONI file.
///
/// Pixel sizes come from `PixelSize1`/`PixelSize2` (version 1 files), from
/// `pixel1`/`pixel2` in the JSON `Detector_config` (version 2), or from the
/// `Detector` name for known detector families.
///
/// # Errors
/// - [`Error::MissingKey`] if a geometry key or the pixel size is absent.
/// - [`Error::InvalidFormat`] if a value does not parse.
/// - [`Error::QSpace`] if the resulting geometry is not physical.
pub fn parse_poni(text: &str) -> Result<Geometry> {
    let entries: HashMap<String, &str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim()))
        .collect();

    let number = |key: &'static str| -> Result<f64> {
        let value = entries
            .get(&key.to_ascii_lowercase())
            .ok_or(Error::MissingKey(key))?;
        value
            .parse::<f64>()
            .map_err(|e| Error::InvalidFormat(format!("{key}: {value:?} is not a number ({e})")))
    };

    let (pixel1, pixel2) = pixel_size(&entries, &number)?;
    let geometry = Geometry {
        dist: number("Distance")?,
        poni1: number("Poni1")?,
        poni2: number("Poni2")?,
        rot1: number("Rot1")?,
        rot2: number("Rot2")?,
        rot3: number("Rot3")?,
        pixel1,
        pixel2,
        wavelength: number("Wavelength")?,
    };
    geometry.validate()?;
    Ok(geometry)
}

fn pixel_size(
    entries: &HashMap<String, &str>,
    number: &dyn Fn(&'static str) -> Result<f64>,
) -> Result<(f64, f64)> {
    if entries.contains_key("pixelsize1") {
        return Ok((number("PixelSize1")?, number("PixelSize2")?));
    }

    if let Some(config) = entries.get("detector_config") {
        let config: serde_json::Value = serde_json::from_str(config)?;
        let p1 = config.get("pixel1").and_then(serde_json::Value::as_f64);
        let p2 = config.get("pixel2").and_then(serde_json::Value::as_f64);
        if let (Some(p1), Some(p2)) = (p1, p2) {
            return Ok((p1, p2));
        }
    }

    if let Some(name) = entries.get("detector") {
        let name = name.to_ascii_lowercase();
        if let Some((_, pitch)) = KNOWN_DETECTORS
            .iter()
            .find(|(family, _)| name.starts_with(family))
        {
            return Ok((*pitch, *pitch));
        }
    }

    Err(Error::MissingKey("PixelSize1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const V2_GENERIC: &str = r#"# Nota: C-Order, 1 refers to the Y axis, 2 to the X axis
# Calibration done at Tue Mar 12 10:21:44 2024
poni_version: 2
Detector: Detector
Detector_config: {"pixel1": 7.5e-05, "pixel2": 7.5e-05, "max_shape": [2162, 2068]}
Distance: 0.1521
Poni1: 0.0812
Poni2: 0.0776
Rot1: 0.0012
Rot2: -0.0021
Rot3: 0.0
Wavelength: 1.0332e-10
"#;

    #[test]
    fn test_parse_version2_config() {
        let g = parse_poni(V2_GENERIC).unwrap();
        assert_relative_eq!(g.dist, 0.1521);
        assert_relative_eq!(g.poni1, 0.0812);
        assert_relative_eq!(g.poni2, 0.0776);
        assert_relative_eq!(g.rot1, 0.0012);
        assert_relative_eq!(g.rot2, -0.0021);
        assert_relative_eq!(g.pixel1, 75e-6);
        assert_relative_eq!(g.wavelength, 1.0332e-10);
    }

    #[test]
    fn test_parse_version1_pixel_keys() {
        let text = "PixelSize1: 1.72e-4\nPixelSize2: 1.72e-4\nDistance: 0.3\nPoni1: 0.04\n\
                    Poni2: 0.05\nRot1: 0\nRot2: 0\nRot3: 0\nWavelength: 1e-10\n";
        let g = parse_poni(text).unwrap();
        assert_relative_eq!(g.pixel2, 172e-6);
        assert_relative_eq!(g.dist, 0.3);
    }

    #[test]
    fn test_parse_named_detector() {
        let text = V2_GENERIC
            .replace("Detector: Detector", "Detector: Eiger2_4M")
            .replace(
                r#"{"pixel1": 7.5e-05, "pixel2": 7.5e-05, "max_shape": [2162, 2068]}"#,
                r#"{"orientation": 3}"#,
            );
        let g = parse_poni(&text).unwrap();
        assert_relative_eq!(g.pixel1, 75e-6);

        let pilatus = text.replace("Eiger2_4M", "Pilatus1M");
        assert_relative_eq!(parse_poni(&pilatus).unwrap().pixel2, 172e-6);
    }

    #[test]
    fn test_missing_keys() {
        let text = V2_GENERIC.replace("Wavelength: 1.0332e-10\n", "");
        assert!(matches!(
            parse_poni(&text),
            Err(Error::MissingKey("Wavelength"))
        ));

        let unknown = V2_GENERIC
            .replace("Detector: Detector", "Detector: Mystery")
            .replace(r#", "pixel2": 7.5e-05"#, "");
        assert!(matches!(
            parse_poni(&unknown),
            Err(Error::MissingKey("PixelSize1"))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let text = V2_GENERIC.replace("Distance: 0.1521", "Distance: far");
        assert!(matches!(parse_poni(&text), Err(Error::InvalidFormat(_))));

        let text = V2_GENERIC.replace("Distance: 0.1521", "Distance: -0.1");
        assert!(matches!(parse_poni(&text), Err(Error::QSpace(_))));
    }

    #[test]
    fn test_read_poni_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calib.poni");
        std::fs::write(&path, V2_GENERIC).unwrap();
        assert_eq!(read_poni(&path).unwrap(), parse_poni(V2_GENERIC).unwrap());
    }
}
