use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::Vector;

/// Solar position (azimuth and elevation angles).
#[derive(Debug, Clone, Copy)]
pub struct SolarPosition {
    /// Solar altitude angle in degrees (0 = horizon, 90 = zenith).
    pub altitude: f64,
    /// Solar azimuth angle in degrees from north, clockwise (0=N, 90=E, 180=S, 270=W).
    pub azimuth: f64,
}

impl SolarPosition {
    /// Calculates the solar position using the Spencer algorithm.
    ///
    /// - `latitude`: in degrees (positive north)
    /// - `day_of_year`: 1-366
    /// - `solar_hour`: apparent solar time in hours (0-24)
    pub fn calculate(latitude: f64, day_of_year: u32, solar_hour: f64) -> Self {
        let lat = latitude.to_radians();
        let gamma = day_angle(day_of_year);

        // Solar declination (Spencer approximation)
        let declination = 0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
            - 0.006758 * (2.0 * gamma).cos()
            + 0.000907 * (2.0 * gamma).sin()
            - 0.002697 * (3.0 * gamma).cos()
            + 0.00148 * (3.0 * gamma).sin();

        // Hour angle (15 degrees per hour from solar noon)
        let hour_angle = (solar_hour - 12.0) * 15.0_f64.to_radians();

        let sin_alt =
            lat.sin() * declination.sin() + lat.cos() * declination.cos() * hour_angle.cos();
        let altitude = sin_alt.clamp(-1.0, 1.0).asin().to_degrees();

        let cos_azimuth = (declination.sin() * lat.cos()
            - declination.cos() * lat.sin() * hour_angle.cos())
            / altitude.to_radians().cos().max(1e-10);

        let mut azimuth = cos_azimuth.clamp(-1.0, 1.0).acos().to_degrees();
        if hour_angle > 0.0 {
            azimuth = 360.0 - azimuth;
        }

        Self { altitude, azimuth }
    }

    pub fn is_above_horizon(&self) -> bool {
        self.altitude > 0.0
    }

    /// Unit vector pointing toward the sun (North = +Y, East = +X, Up = +Z).
    pub fn to_direction(&self) -> Vector {
        Vector::from_altitude_azimuth(self.altitude, self.azimuth)
    }
}

/// Day angle in radians (Spencer).
fn day_angle(day_of_year: u32) -> f64 {
    2.0 * std::f64::consts::PI * (day_of_year as f64 - 1.0) / 365.0
}

/// Equation of time in minutes (Spencer).
pub fn equation_of_time(day_of_year: u32) -> f64 {
    let g = day_angle(day_of_year);
    229.18
        * (0.000075 + 0.001868 * g.cos()
            - 0.032077 * g.sin()
            - 0.014615 * (2.0 * g).cos()
            - 0.040849 * (2.0 * g).sin())
}

/// Sun state for one simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunState {
    /// Unit vector pointing from the scene toward the sun.
    pub direction: Vector,
}

impl SunState {
    /// Normalizes `direction`. Returns `None` for a zero vector.
    pub fn from_direction(direction: Vector) -> Option<Self> {
        Some(Self {
            direction: direction.normalize()?,
        })
    }

    /// The sun is up when its direction points above the horizontal plane.
    pub fn is_above_horizon(&self) -> bool {
        self.direction.dz > 0.
    }
}

/// Maps a simulated date/time to the sun direction.
pub trait SunDirectionProvider {
    fn sun_state(&self, time: &NaiveDateTime) -> SunState;
}

/// Geographic site whose local clock time drives the sun position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarSite {
    /// Degrees, positive north.
    pub latitude: f64,
    /// Degrees, positive east.
    pub longitude: f64,
    /// Offset of the local clock from UTC in hours.
    pub timezone: f64,
}

impl SolarSite {
    pub fn new(latitude: f64, longitude: f64, timezone: f64) -> Self {
        Self {
            latitude,
            longitude,
            timezone,
        }
    }

    /// Apparent solar time in hours for a local clock time.
    pub fn solar_hour(&self, time: &NaiveDateTime) -> f64 {
        let clock = time.hour() as f64 + time.minute() as f64 / 60. + time.second() as f64 / 3600.;
        let longitude_correction = (self.longitude - 15. * self.timezone) / 15.;
        clock + longitude_correction + equation_of_time(time.ordinal()) / 60.
    }

    pub fn position(&self, time: &NaiveDateTime) -> SolarPosition {
        SolarPosition::calculate(self.latitude, time.ordinal(), self.solar_hour(time))
    }
}

impl Default for SolarSite {
    /// Berlin, central European time.
    fn default() -> Self {
        Self::new(52.52, 13.405, 1.)
    }
}

impl SunDirectionProvider for SolarSite {
    fn sun_state(&self, time: &NaiveDateTime) -> SunState {
        SunState {
            direction: self.position(time).to_direction(),
        }
    }
}

/// Constant sun direction, independent of time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSun {
    state: SunState,
}

impl FixedSun {
    pub fn new(direction: Vector) -> Result<Self> {
        let state = SunState::from_direction(direction).ok_or_else(|| {
            Error::Configuration("sun direction must be a non-zero vector".to_string())
        })?;
        Ok(Self { state })
    }
}

impl SunDirectionProvider for FixedSun {
    fn sun_state(&self, _time: &NaiveDateTime) -> SunState {
        self.state
    }
}
