//! External metrics for proportional compensation

use sysinfo::Components;

/// Something that can report a metric the temperature is compensated against
pub trait AmbientSource: Send {
    /// `None` when the metric is currently unavailable
    fn sample(&mut self) -> Option<f64>;
}

/// No external metric
#[derive(Debug, Default)]
pub struct NoAmbient;

impl AmbientSource for NoAmbient {
    fn sample(&mut self) -> Option<f64> {
        None
    }
}

/// Host CPU temperature from the kernel's thermal components
#[derive(Debug, Default)]
pub struct CpuTemperature;

/// Substrings that mark a thermal component as the CPU across platforms
/// (Raspberry Pi `cpu_thermal`, Intel `Package id 0`, AMD `Tctl`/`Tdie`)
const CPU_LABELS: [&str; 5] = ["cpu", "package", "tctl", "tdie", "soc"];

impl AmbientSource for CpuTemperature {
    fn sample(&mut self) -> Option<f64> {
        let components = Components::new_with_refreshed_list();
        cpu_temperature(
            components
                .iter()
                .map(|component| (component.label(), component.temperature())),
        )
    }
}

/// First reading whose label names the CPU and that reports a finite value
pub fn cpu_temperature<'a>(
    readings: impl IntoIterator<Item = (&'a str, Option<f32>)>,
) -> Option<f64> {
    readings.into_iter().find_map(|(label, temperature)| {
        let label = label.to_lowercase();
        if !CPU_LABELS.iter().any(|needle| label.contains(needle)) {
            return None;
        }
        temperature.filter(|t| t.is_finite()).map(f64::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_cpu_component() {
        let readings = [
            ("acpitz temp1", Some(27.8)),
            ("cpu_thermal temp1", Some(52.5)),
            ("nvme Composite", Some(38.0)),
        ];
        assert_eq!(cpu_temperature(readings), Some(52.5));
    }

    #[test]
    fn test_label_match_is_case_insensitive() {
        assert_eq!(cpu_temperature([("k10temp Tctl", Some(61.0))]), Some(61.0));
        assert_eq!(
            cpu_temperature([("coretemp Package id 0", Some(48.0))]),
            Some(48.0)
        );
    }

    #[test]
    fn test_skips_cpu_components_without_reading() {
        let readings = [
            ("cpu_thermal temp1", None),
            ("cpu_thermal temp2", Some(f32::NAN)),
            ("soc_thermal", Some(45.0)),
        ];
        assert_eq!(cpu_temperature(readings), Some(45.0));
    }

    #[test]
    fn test_no_cpu_component() {
        assert_eq!(cpu_temperature([("nvme Composite", Some(38.0))]), None);
        assert_eq!(cpu_temperature(Vec::<(&str, Option<f32>)>::new()), None);
        assert_eq!(NoAmbient.sample(), None);
    }
}
