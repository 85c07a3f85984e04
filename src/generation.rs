//! On-site generation estimates used to size the available supply.
//!
//! Climate figures (irradiance, wind speed) are supplied by the caller;
//! nothing here talks to a weather service.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Standard air density at sea level (kg/m³).
const AIR_DENSITY: f64 = 1.225;

/// Rooftop orientation of a solar array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    South,
    East,
    West,
    North,
    Flat,
}

impl Orientation {
    /// Fraction of south-facing yield this orientation achieves.
    pub fn yield_factor(self) -> f64 {
        match self {
            Self::South => 1.0,
            Self::East | Self::West => 0.75,
            Self::North => 0.5,
            Self::Flat => 0.8,
        }
    }
}

/// A rooftop solar installation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolarArray {
    /// Panel area (m²).
    pub rooftop_area_m2: f64,
    pub orientation: Orientation,
    /// Daily irradiance on the panel plane (kWh/m²/day).
    #[serde(default = "SolarArray::default_irradiance")]
    pub irradiance_kwh_m2_day: f64,
    /// Panel conversion efficiency (0.0–1.0).
    #[serde(default = "SolarArray::default_efficiency")]
    pub efficiency: f64,
}

impl SolarArray {
    pub fn new(rooftop_area_m2: f64, orientation: Orientation) -> Self {
        Self {
            rooftop_area_m2,
            orientation,
            irradiance_kwh_m2_day: Self::default_irradiance(),
            efficiency: Self::default_efficiency(),
        }
    }

    fn default_irradiance() -> f64 {
        5.5
    }

    fn default_efficiency() -> f64 {
        0.15
    }

    /// Expected generation over one day (kWh).
    pub fn daily_energy_kwh(&self) -> f64 {
        self.rooftop_area_m2
            * self.irradiance_kwh_m2_day
            * self.efficiency
            * self.orientation.yield_factor()
    }

    fn validate(&self, index: usize) -> Result<(), SupplyError> {
        let field = |name: &str| format!("solar[{index}].{name}");
        non_negative(&field("rooftop_area_m2"), self.rooftop_area_m2)?;
        non_negative(&field("irradiance_kwh_m2_day"), self.irradiance_kwh_m2_day)?;
        fraction(&field("efficiency"), self.efficiency)
    }
}

/// A small wind turbine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindTurbine {
    /// Rotor diameter (m).
    pub rotor_diameter_m: f64,
    /// Mean wind speed at hub height (m/s).
    pub wind_speed_ms: f64,
    /// Power coefficient (0.0–1.0, Betz limit ≈ 0.59).
    #[serde(default = "WindTurbine::default_efficiency")]
    pub efficiency: f64,
    /// Hours per day the turbine runs at the mean wind speed.
    #[serde(default = "WindTurbine::default_operating_hours")]
    pub operating_hours: f64,
}

impl WindTurbine {
    pub fn new(rotor_diameter_m: f64, wind_speed_ms: f64) -> Self {
        Self {
            rotor_diameter_m,
            wind_speed_ms,
            efficiency: Self::default_efficiency(),
            operating_hours: Self::default_operating_hours(),
        }
    }

    fn default_efficiency() -> f64 {
        0.4
    }

    fn default_operating_hours() -> f64 {
        24.0
    }

    /// Mean electrical output at the configured wind speed (kW).
    pub fn power_kw(&self) -> f64 {
        let radius = self.rotor_diameter_m / 2.0;
        let swept_area = std::f64::consts::PI * radius * radius;
        0.5 * AIR_DENSITY * swept_area * self.wind_speed_ms.powi(3) * self.efficiency / 1000.0
    }

    /// Expected generation over one day (kWh).
    pub fn daily_energy_kwh(&self) -> f64 {
        self.power_kw() * self.operating_hours
    }

    fn validate(&self, index: usize) -> Result<(), SupplyError> {
        let field = |name: &str| format!("wind[{index}].{name}");
        non_negative(&field("rotor_diameter_m"), self.rotor_diameter_m)?;
        non_negative(&field("wind_speed_ms"), self.wind_speed_ms)?;
        fraction(&field("efficiency"), self.efficiency)?;
        non_negative(&field("operating_hours"), self.operating_hours)?;
        if self.operating_hours > 24.0 {
            return Err(SupplyError {
                field: field("operating_hours"),
                message: "must be <= 24".into(),
            });
        }
        Ok(())
    }
}

/// Which renewable source yields more for a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRecommendation {
    Solar,
    Wind,
    Either,
}

impl fmt::Display for SourceRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solar => f.write_str("Solar"),
            Self::Wind => f.write_str("Wind"),
            Self::Either => f.write_str("Both are equally viable"),
        }
    }
}

/// Picks the source with the larger expected yield.
pub fn recommend_source(solar_kwh: f64, wind_kwh: f64) -> SourceRecommendation {
    if solar_kwh > wind_kwh {
        SourceRecommendation::Solar
    } else if wind_kwh > solar_kwh {
        SourceRecommendation::Wind
    } else {
        SourceRecommendation::Either
    }
}

/// Invalid generator parameter.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("supply error: {field}: {message}")]
pub struct SupplyError {
    /// Parameter path (e.g., `"solar[0].efficiency"`).
    pub field: String,
    pub message: String,
}

fn non_negative(field: &str, value: f64) -> Result<(), SupplyError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SupplyError {
            field: field.to_string(),
            message: format!("must be a finite value >= 0, got {value}"),
        })
    }
}

fn fraction(field: &str, value: f64) -> Result<(), SupplyError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SupplyError {
            field: field.to_string(),
            message: format!("must be in [0.0, 1.0], got {value}"),
        })
    }
}

/// Energy available for one allocation run: a fixed quantity (grid import,
/// storage, contracted supply) plus on-site generation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupplyPlan {
    /// Energy available regardless of weather (kWh).
    pub fixed_kwh: f64,
    pub solar: Vec<SolarArray>,
    pub wind: Vec<WindTurbine>,
}

/// Per-source contribution to the total supply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyBreakdown {
    pub fixed_kwh: f64,
    pub solar_kwh: f64,
    pub wind_kwh: f64,
}

impl SupplyBreakdown {
    pub fn total_kwh(&self) -> f64 {
        self.fixed_kwh + self.solar_kwh + self.wind_kwh
    }

    /// Recommendation between solar and wind, if the plan has any generation.
    pub fn recommendation(&self) -> Option<SourceRecommendation> {
        if self.solar_kwh > 0.0 || self.wind_kwh > 0.0 {
            Some(recommend_source(self.solar_kwh, self.wind_kwh))
        } else {
            None
        }
    }
}

impl fmt::Display for SupplyBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Supply ---")?;
        writeln!(f, "Fixed:                 {:.3} kWh", self.fixed_kwh)?;
        writeln!(f, "Solar:                 {:.3} kWh", self.solar_kwh)?;
        writeln!(f, "Wind:                  {:.3} kWh", self.wind_kwh)?;
        write!(f, "Total:                 {:.3} kWh", self.total_kwh())?;
        if let Some(rec) = self.recommendation() {
            write!(f, "\nRecommended source:    {rec}")?;
        }
        Ok(())
    }
}

impl SupplyPlan {
    /// A plan with only a fixed quantity and no generators.
    pub fn fixed(kwh: f64) -> Self {
        Self {
            fixed_kwh: kwh,
            ..Self::default()
        }
    }

    /// Checks every parameter, stopping at the first problem.
    ///
    /// # Errors
    ///
    /// Returns a [`SupplyError`] naming the offending parameter.
    pub fn validate(&self) -> Result<(), SupplyError> {
        non_negative("fixed_kwh", self.fixed_kwh)?;
        for (i, s) in self.solar.iter().enumerate() {
            s.validate(i)?;
        }
        for (i, w) in self.wind.iter().enumerate() {
            w.validate(i)?;
        }
        Ok(())
    }

    /// Validates the plan and sums each source's expected daily output.
    ///
    /// # Errors
    ///
    /// See [`SupplyPlan::validate`].
    pub fn breakdown(&self) -> Result<SupplyBreakdown, SupplyError> {
        self.validate()?;
        Ok(SupplyBreakdown {
            fixed_kwh: self.fixed_kwh,
            solar_kwh: self.solar.iter().map(SolarArray::daily_energy_kwh).sum(),
            wind_kwh: self.wind.iter().map(WindTurbine::daily_energy_kwh).sum(),
        })
    }
}
