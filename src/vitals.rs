use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::config::{
    classify, window_start, Direction, PressureBand, ScalarBand, VitalRules,
};
use crate::models::{
    format_number, LatestVital, VitalChannel, VitalFlag, VitalFlagKind, VitalMeasurement,
    VitalReading, VitalsSummary,
};

type Series<'a> = Vec<(&'a VitalMeasurement, VitalReading)>;

pub fn analyze_vitals(
    measurements: &[VitalMeasurement],
    rules: &VitalRules,
    now: DateTime<Utc>,
) -> VitalsSummary {
    let cutoff = window_start(now, rules.window_days);
    let mut by_channel: BTreeMap<VitalChannel, Series<'_>> = BTreeMap::new();

    for measurement in measurements {
        if measurement.recorded_at < cutoff || measurement.recorded_at > now {
            continue;
        }

        let Some(reading) = measurement.reading() else {
            trace!(
                id = %measurement.id,
                channel = ?measurement.channel,
                raw_value = %measurement.raw_value,
                "skipping malformed vital"
            );
            continue;
        };

        by_channel
            .entry(measurement.channel)
            .or_default()
            .push((measurement, reading));
    }

    for series in by_channel.values_mut() {
        series.sort_by(|a, b| {
            b.0.recorded_at
                .cmp(&a.0.recorded_at)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
    }

    let latest_by_channel = by_channel
        .iter()
        .filter_map(|(channel, series)| {
            series
                .first()
                .map(|entry| latest_vital(*channel, entry))
        })
        .collect();

    let empty = Vec::new();
    let series = |channel: VitalChannel| by_channel.get(&channel).unwrap_or(&empty);

    let pressure = series(VitalChannel::BloodPressure);
    let heart_rate = series(VitalChannel::HeartRate);
    let temperature = series(VitalChannel::Temperature);
    let glucose = series(VitalChannel::Glucose);
    let oxygen = series(VitalChannel::OxygenSaturation);

    let scalar_bands = [
        (VitalFlagKind::HeartRateHigh, heart_rate, &rules.heart_rate_high, Direction::Above),
        (VitalFlagKind::HeartRateLow, heart_rate, &rules.heart_rate_low, Direction::Below),
        (VitalFlagKind::TemperatureHigh, temperature, &rules.temperature_high, Direction::Above),
        (VitalFlagKind::TemperatureLow, temperature, &rules.temperature_low, Direction::Below),
        (VitalFlagKind::GlucoseHigh, glucose, &rules.glucose_high, Direction::Above),
        (VitalFlagKind::GlucoseLow, glucose, &rules.glucose_low, Direction::Below),
        (VitalFlagKind::OxygenLow, oxygen, &rules.oxygen_low, Direction::Below),
    ];

    let mut flags: Vec<VitalFlag> = Vec::new();
    flags.extend(pressure_flag(
        VitalFlagKind::PressureHigh,
        pressure,
        &rules.pressure_high,
        Direction::Above,
    ));
    flags.extend(pressure_flag(
        VitalFlagKind::PressureLow,
        pressure,
        &rules.pressure_low,
        Direction::Below,
    ));
    for (kind, series, band, direction) in scalar_bands {
        flags.extend(scalar_flag(kind, series, band, direction));
    }

    debug!(
        channels = by_channel.len(),
        flags = flags.len(),
        "vitals analyzed"
    );

    VitalsSummary {
        latest_by_channel,
        flags,
    }
}

fn latest_vital(channel: VitalChannel, entry: &(&VitalMeasurement, VitalReading)) -> LatestVital {
    let (measurement, reading) = entry;
    let (systolic, diastolic, numeric_value) = match *reading {
        VitalReading::Pressure {
            systolic,
            diastolic,
        } => (Some(systolic), Some(diastolic), None),
        VitalReading::Scalar(value) => (None, None, Some(value)),
    };

    LatestVital {
        channel,
        value: reading.to_string(),
        systolic,
        diastolic,
        numeric_value,
        recorded_at: measurement.recorded_at,
    }
}

fn pressure_flag(
    kind: VitalFlagKind,
    series: &Series<'_>,
    band: &PressureBand,
    direction: Direction,
) -> Option<VitalFlag> {
    let qualifying: Vec<(f64, f64)> = series
        .iter()
        .filter_map(|(_, reading)| match *reading {
            VitalReading::Pressure {
                systolic,
                diastolic,
            } if band.crosses(direction, systolic, diastolic) => Some((systolic, diastolic)),
            _ => None,
        })
        .collect();

    if qualifying.len() < band.min_readings {
        return None;
    }

    let (systolic, diastolic) = *qualifying.first()?;
    Some(VitalFlag {
        flag: kind,
        observed_value: format!("{}/{}", format_number(systolic), format_number(diastolic)),
        threshold: format!(
            "{} {}/{}",
            direction.symbol(),
            format_number(band.systolic),
            format_number(band.diastolic)
        ),
        severity: band.severity(direction, systolic, diastolic),
        readings: qualifying.len(),
    })
}

fn scalar_flag(
    kind: VitalFlagKind,
    series: &Series<'_>,
    band: &ScalarBand,
    direction: Direction,
) -> Option<VitalFlag> {
    let qualifying: Vec<f64> = series
        .iter()
        .filter_map(|(_, reading)| match *reading {
            VitalReading::Scalar(value) if direction.crosses(value, band.threshold) => Some(value),
            _ => None,
        })
        .collect();

    if qualifying.len() < band.min_readings {
        return None;
    }

    let value = *qualifying.first()?;
    Some(VitalFlag {
        flag: kind,
        observed_value: format_number(value),
        threshold: format!("{} {}", direction.symbol(), format_number(band.threshold)),
        severity: classify(&band.tiers, direction, value),
        readings: qualifying.len(),
    })
}
