// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only sensor adapters.

use std::sync::Arc;

use crate::device::Device;

use super::{DeviceInfo, Entity, EntityValue, device_info_for};

/// Unit of measurement for a sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// US gallons.
    Gallons,
    /// US gallons per minute.
    GallonsPerMinute,
    /// Pounds per square inch.
    Psi,
    /// Degrees Fahrenheit.
    Fahrenheit,
}

impl Unit {
    /// Returns the unit symbol.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gallons => "gal",
            Self::GallonsPerMinute => "gpm",
            Self::Psi => "psi",
            Self::Fahrenheit => "°F",
        }
    }
}

/// The measurement a [`WaterSensor`] exposes.
///
/// Zone variants exist for dual-zone (hot/cold) hardware; which kinds a
/// device gets is decided by [`sensors_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Cumulative water usage for the current day.
    DailyUsage,
    /// Mean flow rate (single-zone hardware only).
    FlowRate,
    /// Mean water temperature.
    Temperature,
    /// Mean hot-line temperature.
    HotTemperature,
    /// Mean cold-line temperature.
    ColdTemperature,
    /// Mean line pressure.
    Pressure,
    /// Mean hot-line pressure.
    HotPressure,
    /// Mean cold-line pressure.
    ColdPressure,
}

impl SensorKind {
    /// Entity-type suffix used in the unique id.
    #[must_use]
    pub const fn entity_type(&self) -> &'static str {
        match self {
            Self::DailyUsage => "daily_consumption",
            Self::FlowRate => "current_flow_rate",
            Self::Temperature => "temperature",
            Self::HotTemperature => "temperature1",
            Self::ColdTemperature => "temperature2",
            Self::Pressure => "water_pressure",
            Self::HotPressure => "water_pressure1",
            Self::ColdPressure => "water_pressure2",
        }
    }

    /// Human-readable sensor name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::DailyUsage => "Daily water usage",
            Self::FlowRate => "Average water flow rate",
            Self::Temperature => "Average water temperature",
            Self::HotTemperature => "Average hot water temperature",
            Self::ColdTemperature => "Average cold water temperature",
            Self::Pressure => "Average water pressure",
            Self::HotPressure => "Average hot water pressure",
            Self::ColdPressure => "Average cold water pressure",
        }
    }

    /// Unit of the reading.
    #[must_use]
    pub const fn unit(&self) -> Unit {
        match self {
            Self::DailyUsage => Unit::Gallons,
            Self::FlowRate => Unit::GallonsPerMinute,
            Self::Temperature | Self::HotTemperature | Self::ColdTemperature => Unit::Fahrenheit,
            Self::Pressure | Self::HotPressure | Self::ColdPressure => Unit::Psi,
        }
    }

    /// Icon identifier for the host's presentation layer.
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self {
            Self::DailyUsage | Self::FlowRate => "mdi:water",
            Self::Temperature | Self::HotTemperature | Self::ColdTemperature => "mdi:thermometer",
            Self::Pressure | Self::HotPressure | Self::ColdPressure => "mdi:gauge",
        }
    }
}

/// Rounds to one decimal place for presentation.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Read-only sensor over one snapshot field.
///
/// Holds no state of its own; every read derives the value from the
/// synchronizer's current snapshot.
#[derive(Debug)]
pub struct WaterSensor {
    device: Arc<Device>,
    kind: SensorKind,
    unique_id: String,
}

impl WaterSensor {
    /// Creates a sensor for the given device and measurement.
    #[must_use]
    pub fn new(device: Arc<Device>, kind: SensorKind) -> Self {
        let unique_id = format!("{}_{}", device.id(), kind.entity_type());
        Self {
            device,
            kind,
            unique_id,
        }
    }

    /// Returns the measurement this sensor exposes.
    #[must_use]
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Returns the unit of the reading.
    #[must_use]
    pub fn unit(&self) -> Unit {
        self.kind.unit()
    }

    /// Raw reading from the current snapshot.
    fn reading(&self) -> Option<f64> {
        match self.kind {
            SensorKind::DailyUsage => self.device.consumption_today(),
            SensorKind::FlowRate => self.device.current_flow_rate(),
            SensorKind::Temperature => self.device.temperature(),
            SensorKind::HotTemperature => self.device.temperature1(),
            SensorKind::ColdTemperature => self.device.temperature2(),
            SensorKind::Pressure => self.device.current_psi(),
            SensorKind::HotPressure => self.device.current_psi1(),
            SensorKind::ColdPressure => self.device.current_psi2(),
        }
    }

    /// Presented value, rounded to one decimal place.
    ///
    /// `None` when the underlying field is absent.
    #[must_use]
    pub fn native_value(&self) -> Option<f64> {
        self.reading().map(round1)
    }

    /// Requests an on-demand refresh of the backing device.
    ///
    /// Coalesces with any refresh cycle already in flight.
    ///
    /// # Errors
    ///
    /// Returns error if the cycle fails; cached state is unchanged.
    pub async fn request_refresh(&self) -> crate::error::Result<()> {
        self.device.refresh().await
    }
}

impl Entity for WaterSensor {
    fn unique_id(&self) -> String {
        self.unique_id.clone()
    }

    fn name(&self) -> &str {
        self.kind.display_name()
    }

    fn available(&self) -> bool {
        self.device.available()
    }

    fn value(&self) -> EntityValue {
        match self.native_value() {
            Some(value) => EntityValue::Measurement(value),
            None => EntityValue::Unknown,
        }
    }

    fn icon(&self) -> &'static str {
        self.kind.icon()
    }

    fn device_info(&self) -> Option<DeviceInfo> {
        device_info_for(&self.device)
    }
}

/// Builds the sensor set for a device based on its hardware model.
///
/// Dual-zone (`"PC1"`) hardware measures hot and cold lines separately
/// and has no single-zone flow sensor; every other model gets the
/// single-zone set. A device whose model is not yet known (initial
/// refresh still pending) gets the single-zone set.
#[must_use]
pub fn sensors_for(device: &Arc<Device>) -> Vec<WaterSensor> {
    let kinds: &[SensorKind] = if device.model().as_deref() == Some("PC1") {
        &[
            SensorKind::DailyUsage,
            SensorKind::HotTemperature,
            SensorKind::HotPressure,
            SensorKind::ColdTemperature,
            SensorKind::ColdPressure,
        ]
    } else {
        &[
            SensorKind::DailyUsage,
            SensorKind::FlowRate,
            SensorKind::Temperature,
            SensorKind::Pressure,
        ]
    };

    kinds
        .iter()
        .map(|kind| WaterSensor::new(Arc::clone(device), *kind))
        .collect()
}
