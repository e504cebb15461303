use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sprout_core::{PumpStatus, SensorReading};

use crate::config::SimulationConfig;

/// Physical soil model used while no device is connected.
///
/// Moisture rises by a fixed increment while the pump runs and otherwise decays
/// in proportion to temperature. Temperature and humidity wander by at most half
/// a walk step per tick.
pub struct Simulator {
    rng: StdRng,
    pump_increment: f64,
    decay_factor: f64,
    walk_step: f64,
}

impl Simulator {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            rng,
            pump_increment: config.pump_increment,
            decay_factor: config.decay_factor,
            walk_step: config.walk_step,
        }
    }

    /// Derive the next reading from the previous one.
    pub fn next_reading(&mut self, prev: &SensorReading, pump: PumpStatus) -> SensorReading {
        let soil_moisture = match pump {
            PumpStatus::On => (prev.soil_moisture + self.pump_increment).min(100.0),
            PumpStatus::Off => {
                (prev.soil_moisture - self.decay_factor * (prev.temperature / 20.0)).max(0.0)
            }
        };

        let temperature = prev.temperature + self.jitter();
        let humidity = (prev.humidity + self.jitter()).clamp(0.0, 100.0);

        SensorReading {
            soil_moisture: round1(soil_moisture),
            temperature: round1(temperature),
            humidity: round1(humidity),
        }
    }

    fn jitter(&mut self) -> f64 {
        (self.rng.random::<f64>() - 0.5) * self.walk_step
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator() -> Simulator {
        Simulator::new(&SimulationConfig {
            seed: Some(7),
            ..SimulationConfig::default()
        })
    }

    #[test]
    fn pump_on_raises_moisture_up_to_cap() {
        let mut sim = simulator();
        let mut reading = SensorReading {
            soil_moisture: 97.0,
            temperature: 22.0,
            humidity: 60.0,
        };

        reading = sim.next_reading(&reading, PumpStatus::On);
        assert_eq!(reading.soil_moisture, 99.0);
        reading = sim.next_reading(&reading, PumpStatus::On);
        assert_eq!(reading.soil_moisture, 100.0);
    }

    #[test]
    fn pump_off_decays_with_temperature_down_to_zero() {
        let mut sim = simulator();
        let reading = SensorReading {
            soil_moisture: 40.0,
            temperature: 20.0,
            humidity: 60.0,
        };
        let next = sim.next_reading(&reading, PumpStatus::Off);
        assert_eq!(next.soil_moisture, 39.5);

        let hot = SensorReading {
            soil_moisture: 40.0,
            temperature: 40.0,
            humidity: 60.0,
        };
        assert_eq!(sim.next_reading(&hot, PumpStatus::Off).soil_moisture, 39.0);

        let parched = SensorReading {
            soil_moisture: 0.2,
            temperature: 30.0,
            humidity: 60.0,
        };
        assert_eq!(sim.next_reading(&parched, PumpStatus::Off).soil_moisture, 0.0);
    }

    #[test]
    fn walk_is_bounded_and_rounded() {
        let mut sim = simulator();
        let mut reading = SensorReading::default();
        for _ in 0..200 {
            let next = sim.next_reading(&reading, PumpStatus::Off);
            assert!((next.temperature - reading.temperature).abs() <= 0.55);
            assert!((0.0..=100.0).contains(&next.humidity));
            assert_eq!(next.temperature, round1(next.temperature));
            reading = next;
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut a = simulator();
        let mut b = simulator();
        let start = SensorReading::default();
        assert_eq!(
            a.next_reading(&start, PumpStatus::Off),
            b.next_reading(&start, PumpStatus::Off)
        );
    }
}
