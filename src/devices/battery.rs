/// A bank of identical battery units serving one household.
///
/// `BatteryBank` tracks its state of charge in kWh and enforces the
/// operating envelope used by the day simulator: an hourly rate cap derived
/// from cycles per day, a seasonal reserve floor, and round-trip losses
/// applied on the way in.
#[derive(Debug, Clone)]
pub struct BatteryBank {
    /// Total usable capacity in kilowatt-hours.
    pub capacity_kwh: f64,

    /// State of charge in kilowatt-hours.
    pub soc_kwh: f64,

    /// Energy that must stay in the bank (kWh).
    pub reserve_floor_kwh: f64,

    /// Maximum energy moved in or out per hour (kWh).
    pub max_rate_kwh: f64,

    /// Round-trip efficiency (0..1.0], charged on input.
    pub round_trip_efficiency: f64,
}

/// Share of total capacity held at the start of every representative day.
pub const INITIAL_SOC_FRACTION: f64 = 0.5;

/// Largest reserve share a month may hold back.
pub const MAX_RESERVE_FRACTION: f64 = 0.95;

/// Result of offering surplus solar to the bank for one hour.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChargeOutcome {
    /// Energy drawn from the solar surplus.
    pub input_kwh: f64,
    /// Energy added to the state of charge.
    pub stored_kwh: f64,
}

impl BatteryBank {
    /// Creates a bank holding [`INITIAL_SOC_FRACTION`] of its capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity_kwh` - Total usable capacity in kWh (0 for no battery)
    /// * `cycles_per_day` - Full-capacity cycles per day; bounds the hourly rate
    /// * `round_trip_efficiency` - Storage efficiency in (0, 1]
    /// * `reserve_fraction` - Share of capacity held back, clamped to `[0, 0.95]`
    ///
    /// # Panics
    ///
    /// Panics if capacity or cycles are negative, or efficiency is outside (0, 1].
    pub fn new(
        capacity_kwh: f64,
        cycles_per_day: f64,
        round_trip_efficiency: f64,
        reserve_fraction: f64,
    ) -> Self {
        assert!(capacity_kwh >= 0.0, "capacity must be >= 0");
        assert!(cycles_per_day >= 0.0, "cycles per day must be >= 0");
        assert!(
            round_trip_efficiency > 0.0 && round_trip_efficiency <= 1.0,
            "round-trip efficiency must be in (0, 1]"
        );

        let reserve = if reserve_fraction.is_finite() {
            reserve_fraction.clamp(0.0, MAX_RESERVE_FRACTION)
        } else {
            0.0
        };
        let max_rate_kwh = if capacity_kwh > 0.0 {
            capacity_kwh * cycles_per_day / 24.0
        } else {
            0.0
        };

        Self {
            capacity_kwh,
            soc_kwh: capacity_kwh * INITIAL_SOC_FRACTION,
            reserve_floor_kwh: capacity_kwh * reserve,
            max_rate_kwh,
            round_trip_efficiency,
        }
    }

    /// Whether the bank has any capacity at all.
    pub fn is_present(&self) -> bool {
        self.capacity_kwh > 0.0
    }

    /// Stores as much of `surplus_kwh` as rate and headroom allow.
    ///
    /// Input is limited to `min(surplus, rate cap, headroom / efficiency)`,
    /// so the stored energy never pushes the bank past capacity.
    pub fn charge(&mut self, surplus_kwh: f64) -> ChargeOutcome {
        if !self.is_present() || surplus_kwh <= 0.0 {
            return ChargeOutcome::default();
        }
        let headroom = (self.capacity_kwh - self.soc_kwh).max(0.0);
        if headroom <= 0.0 {
            return ChargeOutcome::default();
        }

        let input_kwh = surplus_kwh
            .min(self.max_rate_kwh)
            .min(headroom / self.round_trip_efficiency);
        if input_kwh <= 0.0 {
            return ChargeOutcome::default();
        }

        let stored_kwh = input_kwh * self.round_trip_efficiency;
        self.soc_kwh = (self.soc_kwh + stored_kwh).min(self.capacity_kwh);
        ChargeOutcome {
            input_kwh,
            stored_kwh,
        }
    }

    /// Energy that could be discharged right now without breaching the reserve.
    pub fn available_kwh(&self) -> f64 {
        (self.soc_kwh - self.reserve_floor_kwh).max(0.0)
    }

    /// Delivers up to `demand_kwh` to the load and returns the amount delivered.
    pub fn discharge(&mut self, demand_kwh: f64) -> f64 {
        if !self.is_present() || demand_kwh <= 0.0 {
            return 0.0;
        }
        let delivered = self
            .max_rate_kwh
            .min(self.available_kwh())
            .min(demand_kwh)
            .max(0.0);
        self.soc_kwh -= delivered;
        delivered
    }

    /// Whether the state of charge sits at the reserve floor (within 1e-6 kWh).
    pub fn at_reserve(&self) -> bool {
        self.is_present() && self.soc_kwh - self.reserve_floor_kwh <= 1e-6
    }
}
