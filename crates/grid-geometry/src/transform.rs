//! Map coordinate transform (MAPUNITS / MAPAXES).
//!
//! MAPAXES holds three control points in map units:
//!
//! ```text
//! [x1, y1,  x0, y0,  x2, y2]
//!  y-axis   origin   x-axis
//! ```
//!
//! Local pillar coordinates are mapped into the global frame as
//! `origin + x * unit_x + y * unit_y`, where `unit_x` and `unit_y` are the
//! normalized directions from the origin to the x-axis and y-axis points.

use crate::error::{GridError, GridResult};

/// Length unit declared by MAPUNITS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapUnits {
    Metres,
    Feet,
    Centimetres,
}

impl MapUnits {
    pub fn parse(value: &str) -> GridResult<Self> {
        match value.trim() {
            "METRES" => Ok(MapUnits::Metres),
            "FEET" => Ok(MapUnits::Feet),
            "CM" => Ok(MapUnits::Centimetres),
            other => Err(GridError::UnsupportedUnit(other.to_string())),
        }
    }

    /// Length of one unit in metres.
    pub fn length_factor(&self) -> f64 {
        match self {
            MapUnits::Metres => 1.0,
            MapUnits::Feet => 0.3048,
            MapUnits::Centimetres => 0.01,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MapUnits::Metres => "METRES",
            MapUnits::Feet => "FEET",
            MapUnits::Centimetres => "CM",
        }
    }
}

/// Origin plus two orthonormal basis vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    pub origin: [f64; 2],
    pub unit_x: [f64; 2],
    pub unit_y: [f64; 2],
}

impl CoordinateTransform {
    /// Build from MAPAXES values already scaled to metres.
    pub fn from_mapaxes(mapaxes: &[f64; 6]) -> GridResult<Self> {
        let origin = [mapaxes[2], mapaxes[3]];
        let unit_x = normalize([mapaxes[4] - mapaxes[2], mapaxes[5] - mapaxes[3]])?;
        let unit_y = normalize([mapaxes[0] - mapaxes[2], mapaxes[1] - mapaxes[3]])?;

        Ok(Self {
            origin,
            unit_x,
            unit_y,
        })
    }

    /// Map a local `(x, y)` into the global frame.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.origin[0] + x * self.unit_x[0] + y * self.unit_y[0],
            self.origin[1] + x * self.unit_x[1] + y * self.unit_y[1],
        )
    }
}

fn normalize(v: [f64; 2]) -> GridResult<[f64; 2]> {
    let len = v[0].hypot(v[1]);
    if len == 0.0 || !len.is_finite() {
        return Err(GridError::InconsistentData(
            "MAPAXES control points do not define an axis".to_string(),
        ));
    }
    Ok([v[0] / len, v[1] / len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(MapUnits::parse("FEET").unwrap().length_factor(), 0.3048);
        assert_eq!(MapUnits::parse("CM ").unwrap(), MapUnits::Centimetres);
        assert!(matches!(
            MapUnits::parse("INCHES"),
            Err(GridError::UnsupportedUnit(u)) if u == "INCHES"
        ));
    }

    #[test]
    fn test_axis_aligned_translation() {
        let t = CoordinateTransform::from_mapaxes(&[100.0, 210.0, 100.0, 200.0, 110.0, 200.0]).unwrap();
        assert_eq!(t.apply(1.0, 2.0), (101.0, 202.0));
    }

    #[test]
    fn test_rotated_axes() {
        // x axis pointing north, y axis pointing west
        let t = CoordinateTransform::from_mapaxes(&[-5.0, 0.0, 0.0, 0.0, 0.0, 5.0]).unwrap();
        let (x, y) = t.apply(3.0, 1.0);
        assert!((x - -1.0).abs() < 1e-12);
        assert!((y - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_axes() {
        assert!(CoordinateTransform::from_mapaxes(&[0.0; 6]).is_err());
    }
}
