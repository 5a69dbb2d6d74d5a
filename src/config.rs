/// Five minutes of per-second readings, plus the slot that is about to slide out.
pub const WINDOW_CAPACITY: usize = 5 * 60 + 1;

/// Relative deviation from the window average that raises a spot-change alert.
pub const SPOT_CHANGE_THRESHOLD: f64 = 0.10;

/// Names of the fields every input record must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFields {
    pub key: &'static str,
    pub value: &'static str,
    pub timestamp: &'static str,
}

impl RecordFields {
    pub const CURRENCY_PAIR: RecordFields = RecordFields {
        key: "currencyPair",
        value: "rate",
        timestamp: "timestamp",
    };
}

impl Default for RecordFields {
    fn default() -> Self {
        Self::CURRENCY_PAIR
    }
}

/// Design-time parameters handed to the registry and everything it creates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    pub window_capacity: usize,
    pub threshold: f64,
    pub fields: RecordFields,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_capacity: WINDOW_CAPACITY,
            threshold: SPOT_CHANGE_THRESHOLD,
            fields: RecordFields::default(),
        }
    }
}
