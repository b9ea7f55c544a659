// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::PoolStatus;

/// Margin inside the allowed range that still renders as a warning.
const WARN_MARGIN: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    Ph,
    Orp,
    Temperature,
    OzoneLevel,
}

impl SensorKind {
    pub const ALL: [Self; 4] = [Self::Ph, Self::Orp, Self::Temperature, Self::OzoneLevel];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ph => "pH",
            Self::Orp => "ORP",
            Self::Temperature => "Temperature",
            Self::OzoneLevel => "Ozone",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Ph => "",
            Self::Orp => "mV",
            Self::Temperature => "\u{00b0}C",
            Self::OzoneLevel => "ppb",
        }
    }
}

/// One reading set from a device. Ozone has no configurable range; it is
/// displayed but never banded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub ph: f64,
    pub orp: f64,
    pub temperature: f64,
    pub ozone_level: f64,
    pub power: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRange {
    pub min: f64,
    pub max: f64,
}

impl ThresholdRange {
    pub fn validate(&self, label: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            bail!("{label} range must be finite numbers");
        }
        if self.min >= self.max {
            bail!(
                "{label} minimum {} must be below maximum {}",
                self.min,
                self.max
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceThresholds {
    pub ph: ThresholdRange,
    pub orp: ThresholdRange,
    pub temperature: ThresholdRange,
}

impl Default for DeviceThresholds {
    fn default() -> Self {
        Self {
            ph: ThresholdRange { min: 6.8, max: 7.6 },
            orp: ThresholdRange {
                min: 250.0,
                max: 950.0,
            },
            temperature: ThresholdRange {
                min: 26.0,
                max: 32.0,
            },
        }
    }
}

impl DeviceThresholds {
    pub fn validate(&self) -> Result<()> {
        self.ph.validate("pH")?;
        self.orp.validate("ORP")?;
        self.temperature.validate("temperature")?;
        Ok(())
    }

    pub const fn range_for(&self, sensor: SensorKind) -> Option<ThresholdRange> {
        match sensor {
            SensorKind::Ph => Some(self.ph),
            SensorKind::Orp => Some(self.orp),
            SensorKind::Temperature => Some(self.temperature),
            SensorKind::OzoneLevel => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingBand {
    Ok,
    Warn,
    Alert,
}

impl ReadingBand {
    /// Zero reads as a dead sensor, not a healthy value.
    pub fn classify(value: f64, range: ThresholdRange) -> Self {
        if value < range.min || value > range.max || value == 0.0 {
            return Self::Alert;
        }
        if value < range.min + WARN_MARGIN || value > range.max - WARN_MARGIN {
            return Self::Warn;
        }
        Self::Ok
    }
}

/// Rolls the per-reading bands up into the card-level verdict.
pub fn pool_health(snapshot: &SensorSnapshot, thresholds: &DeviceThresholds) -> PoolStatus {
    let bands = [
        ReadingBand::classify(snapshot.ph, thresholds.ph),
        ReadingBand::classify(snapshot.orp, thresholds.orp),
        ReadingBand::classify(snapshot.temperature, thresholds.temperature),
    ];
    if bands.contains(&ReadingBand::Alert) {
        PoolStatus::NeedAttention
    } else if bands.contains(&ReadingBand::Warn) {
        PoolStatus::Good
    } else {
        PoolStatus::Excellent
    }
}

/// Controllable equipment behind a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlDevice {
    Ozone,
    Filtration,
    Heater,
    Dosing,
    Uv,
}

impl ControlDevice {
    pub const ALL: [Self; 5] = [
        Self::Ozone,
        Self::Filtration,
        Self::Heater,
        Self::Dosing,
        Self::Uv,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ozone => "ozone",
            Self::Filtration => "filtration",
            Self::Heater => "heater",
            Self::Dosing => "dosing",
            Self::Uv => "uv",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ozone => "Ozone Generator",
            Self::Filtration => "Filtration Pump",
            Self::Heater => "Pool Heater",
            Self::Dosing => "Chemical Dosing",
            Self::Uv => "UV Sterilizer",
        }
    }

    pub const fn has_timer(self) -> bool {
        matches!(self, Self::Ozone | Self::Filtration | Self::Uv)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchAction {
    On,
    Off,
}

impl SwitchAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

/// Command proxied to the device through the backend. A timer is only
/// meaningful when switching a timer-capable device on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCommand {
    pub device: ControlDevice,
    pub action: SwitchAction,
    pub timer: Option<String>,
}

impl DeviceCommand {
    pub fn validate(&self) -> Result<()> {
        let Some(timer) = &self.timer else {
            return Ok(());
        };
        if !self.device.has_timer() {
            bail!("{} does not support a timer", self.device.label());
        }
        if self.action != SwitchAction::On {
            bail!("timer requires the device to be switched on");
        }
        validate_timer(timer)
    }
}

/// `HH:MM`, 24-hour.
fn validate_timer(raw: &str) -> Result<()> {
    let Some((hours, minutes)) = raw.split_once(':') else {
        bail!("timer {raw:?} must be HH:MM");
    };
    let (Ok(hours), Ok(minutes)) = (hours.parse::<u8>(), minutes.parse::<u8>()) else {
        bail!("timer {raw:?} must be HH:MM");
    };
    if hours > 23 || minutes > 59 {
        bail!("timer {raw:?} is out of range");
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttTopics {
    pub read: String,
    pub write: String,
}

impl Default for MqttTopics {
    fn default() -> Self {
        Self {
            read: "stp/sensors/data".to_owned(),
            write: "stp/control/commands".to_owned(),
        }
    }
}

impl MqttTopics {
    pub fn validate(&self) -> Result<()> {
        for (label, topic) in [("read", &self.read), ("write", &self.write)] {
            if topic.trim().is_empty() {
                bail!("{label} topic must not be empty");
            }
            if topic.contains(char::is_whitespace) {
                bail!("{label} topic {topic:?} must not contain whitespace");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ControlDevice, DeviceCommand, DeviceThresholds, MqttTopics, ReadingBand, SensorSnapshot,
        SwitchAction, ThresholdRange, pool_health,
    };
    use crate::PoolStatus;

    fn ph_range() -> ThresholdRange {
        ThresholdRange { min: 6.8, max: 7.6 }
    }

    #[test]
    fn classify_bands() {
        assert_eq!(ReadingBand::classify(7.2, ph_range()), ReadingBand::Ok);
        assert_eq!(ReadingBand::classify(6.9, ph_range()), ReadingBand::Warn);
        assert_eq!(ReadingBand::classify(7.5, ph_range()), ReadingBand::Warn);
        assert_eq!(ReadingBand::classify(6.5, ph_range()), ReadingBand::Alert);
        assert_eq!(ReadingBand::classify(8.0, ph_range()), ReadingBand::Alert);
    }

    #[test]
    fn zero_reading_is_an_alert_even_inside_range() {
        let range = ThresholdRange {
            min: -5.0,
            max: 5.0,
        };
        assert_eq!(ReadingBand::classify(0.0, range), ReadingBand::Alert);
    }

    #[test]
    fn pool_health_rollup() {
        let thresholds = DeviceThresholds::default();
        let healthy = SensorSnapshot {
            ph: 7.2,
            orp: 690.0,
            temperature: 28.9,
            ozone_level: 196.4,
            power: true,
        };
        assert_eq!(pool_health(&healthy, &thresholds), PoolStatus::Excellent);

        let warm = SensorSnapshot {
            temperature: 31.9,
            ..healthy
        };
        assert_eq!(pool_health(&warm, &thresholds), PoolStatus::Good);

        let acidic = SensorSnapshot { ph: 6.1, ..healthy };
        assert_eq!(pool_health(&acidic, &thresholds), PoolStatus::NeedAttention);
    }

    #[test]
    fn threshold_validation_rejects_inverted_ranges() {
        let mut thresholds = DeviceThresholds::default();
        thresholds.orp = ThresholdRange {
            min: 900.0,
            max: 250.0,
        };
        assert!(thresholds.validate().is_err());
        assert!(DeviceThresholds::default().validate().is_ok());
    }

    #[test]
    fn timer_only_on_capable_devices_switching_on() {
        let ok = DeviceCommand {
            device: ControlDevice::Ozone,
            action: SwitchAction::On,
            timer: Some("08:00".to_owned()),
        };
        assert!(ok.validate().is_ok());

        let heater = DeviceCommand {
            device: ControlDevice::Heater,
            action: SwitchAction::On,
            timer: Some("08:00".to_owned()),
        };
        assert!(heater.validate().is_err());

        let off = DeviceCommand {
            device: ControlDevice::Uv,
            action: SwitchAction::Off,
            timer: Some("12:00".to_owned()),
        };
        assert!(off.validate().is_err());
    }

    #[test]
    fn timer_format_is_checked() {
        for bad in ["8", "25:00", "08:60", "ab:cd", "08-00"] {
            let command = DeviceCommand {
                device: ControlDevice::Filtration,
                action: SwitchAction::On,
                timer: Some(bad.to_owned()),
            };
            assert!(command.validate().is_err(), "timer {bad:?}");
        }
    }

    #[test]
    fn mqtt_topics_validated() {
        assert!(MqttTopics::default().validate().is_ok());
        let blank = MqttTopics {
            read: " ".to_owned(),
            ..MqttTopics::default()
        };
        assert!(blank.validate().is_err());
        let spaced = MqttTopics {
            write: "stp/control commands".to_owned(),
            ..MqttTopics::default()
        };
        assert!(spaced.validate().is_err());
    }
}
