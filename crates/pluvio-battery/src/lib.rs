//! Battery voltage calibration and charge classification over an injected ADC source.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw voltage provider, typically an ADC channel on the logger board.
pub trait VoltageSource: Send {
    /// Reads the uncalibrated voltage seen on `channel`.
    fn read_voltage(&mut self, channel: u8) -> Result<f64, BatteryError>;

    /// Releases the underlying bus.
    fn close(&mut self) -> Result<(), BatteryError> {
        Ok(())
    }
}

/// Errors emitted by voltage sources and the monitor.
#[derive(Debug, Error)]
pub enum BatteryError {
    /// Underlying bus or device I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Source returned a value that is not a finite voltage.
    #[error("invalid reading: {0}")]
    InvalidReading(f64),
    /// Thresholds or calibration are inconsistent.
    #[error("invalid battery config: {0}")]
    InvalidConfig(String),
}

/// Calibration and thresholds for one battery channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    pub channel: u8,
    pub slope: f64,
    pub offset: f64,
    /// Readings at or above this are `Normal`.
    pub low_voltage: f64,
    /// Readings below this are `Critical`.
    pub critical_voltage: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            slope: 1.0,
            offset: 0.0,
            low_voltage: 11.8,
            critical_voltage: 11.2,
        }
    }
}

impl BatteryConfig {
    pub fn validate(&self) -> Result<(), BatteryError> {
        if !self.slope.is_finite() || !self.offset.is_finite() {
            return Err(BatteryError::InvalidConfig(
                "calibration must be finite".to_string(),
            ));
        }
        if self.critical_voltage > self.low_voltage {
            return Err(BatteryError::InvalidConfig(format!(
                "critical voltage {} exceeds low voltage {}",
                self.critical_voltage, self.low_voltage
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryStatus {
    Normal,
    Low,
    Critical,
}

impl BatteryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatteryStatus::Normal => "normal",
            BatteryStatus::Low => "low",
            BatteryStatus::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryReading {
    pub voltage: f64,
    pub status: BatteryStatus,
}

/// Applies calibration to raw readings and classifies the result.
pub struct BatteryMonitor<S> {
    source: S,
    config: BatteryConfig,
}

impl<S: VoltageSource> BatteryMonitor<S> {
    pub fn new(source: S, config: BatteryConfig) -> Result<Self, BatteryError> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }

    /// Reads the channel and returns the calibrated voltage, rounded to two decimals.
    pub fn read_voltage(&mut self) -> Result<f64, BatteryError> {
        let raw = self.source.read_voltage(self.config.channel)?;
        if !raw.is_finite() {
            return Err(BatteryError::InvalidReading(raw));
        }
        Ok(self.calibrate(raw))
    }

    pub fn calibrate(&self, raw: f64) -> f64 {
        round2(raw * self.config.slope + self.config.offset)
    }

    pub fn status(&self, voltage: f64) -> BatteryStatus {
        if voltage >= self.config.low_voltage {
            BatteryStatus::Normal
        } else if voltage >= self.config.critical_voltage {
            BatteryStatus::Low
        } else {
            BatteryStatus::Critical
        }
    }

    pub fn read_all(&mut self) -> Result<BatteryReading, BatteryError> {
        let voltage = self.read_voltage()?;
        let status = self.status(voltage);
        if status != BatteryStatus::Normal {
            tracing::warn!(voltage, status = status.as_str(), "battery below normal");
        }
        Ok(BatteryReading { voltage, status })
    }

    /// Closes the source and hands it back.
    pub fn close(mut self) -> Result<S, BatteryError> {
        self.source.close()?;
        Ok(self.source)
    }
}

/// Source that replays a fixed raw voltage, for bench checks without hardware.
#[derive(Debug, Clone, Copy)]
pub struct FixedVoltage(pub f64);

impl VoltageSource for FixedVoltage {
    fn read_voltage(&mut self, _channel: u8) -> Result<f64, BatteryError> {
        Ok(self.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
