// cc-core/src/units.rs

use uom::si::f64::{Energy as UomEnergy, Power as UomPower, Time as UomTime};

pub type Energy = UomEnergy;
pub type Power = UomPower;
pub type Time = UomTime;

#[inline]
pub fn w(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

/// Energy delivered by a constant power over an interval, in watt-hours.
#[inline]
pub fn power_over_wh(watts: f64, seconds: f64) -> f64 {
    use uom::si::energy::watt_hour;
    let energy: Energy = w(watts) * s(seconds);
    energy.get::<watt_hour>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_over_time_in_watt_hours() {
        // 30 W for 5 s
        assert!((power_over_wh(30.0, 5.0) - 150.0 / 3600.0).abs() < 1e-12);
        assert!((power_over_wh(1.0, 3600.0) - 1.0).abs() < 1e-12);
        assert_eq!(power_over_wh(0.25, 0.0), 0.0);
    }
}
