//! Control ports and per-block control snapshots.

use crate::chaos::DEFAULT_GROWTH_RATE;

/// Maximum number of control ports a generator may declare.
pub const MAX_PARAMS: usize = 16;

/// Metadata describing one control port.
#[derive(Debug)]
pub struct ParamInfo {
    /// Index into the generator's control snapshot
    pub id: u16,
    /// Stable machine-readable name (used in config files)
    pub symbol: &'static str,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    /// Value used when the port is absent for a block
    pub default: f32,
}

impl ParamInfo {
    pub const fn new(
        id: u16,
        symbol: &'static str,
        name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self { id, symbol, name, min, max, default }
    }

    /// Logistic-map growth rate in [1, 4].
    pub const fn growth_rate(id: u16) -> Self {
        Self::new(id, "growth_rate", "Chaos growth rate", 1.0, 4.0, 3.8)
    }

    /// Chaos intensity in [0, 1].
    pub const fn intensity(id: u16, default: f32) -> Self {
        Self::new(id, "intensity", "Chaos intensity", 0.0, 1.0, default)
    }

    /// Note velocity in [1, 127].
    pub const fn velocity(id: u16, symbol: &'static str, name: &'static str, default: f32) -> Self {
        Self::new(id, symbol, name, 1.0, 127.0, default)
    }

    /// Output MIDI channel in [0, 15].
    pub const fn channel(id: u16) -> Self {
        Self::new(id, "channel", "Output channel", 0.0, 15.0, 0.0)
    }

    /// On/off switch; values above 0.5 mean on.
    pub const fn toggle(id: u16, symbol: &'static str, name: &'static str) -> Self {
        Self::new(id, symbol, name, 0.0, 1.0, 0.0)
    }
}

/// Look up a port by symbol.
pub fn find_param<'a>(params: &'a [ParamInfo], symbol: &str) -> Option<&'a ParamInfo> {
    params.iter().find(|p| p.symbol == symbol)
}

/// One block's snapshot of control values.
///
/// A port that is `None` is absent this block; readers substitute the
/// port's documented default rather than failing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    values: [Option<f32>; MAX_PARAMS],
}

impl Controls {
    /// A snapshot with every port absent.
    pub const fn new() -> Self {
        Self { values: [None; MAX_PARAMS] }
    }

    /// Set a port value. Ids past [`MAX_PARAMS`] are ignored.
    pub fn set(&mut self, id: u16, value: f32) {
        if let Some(slot) = self.values.get_mut(id as usize) {
            *slot = Some(value);
        }
    }

    /// Mark a port absent.
    pub fn unset(&mut self, id: u16) {
        if let Some(slot) = self.values.get_mut(id as usize) {
            *slot = None;
        }
    }

    /// Builder form of [`Controls::set`].
    pub fn with(mut self, id: u16, value: f32) -> Self {
        self.set(id, value);
        self
    }

    /// Raw value, `None` when absent or NaN.
    pub fn get(&self, id: u16) -> Option<f32> {
        self.values
            .get(id as usize)
            .copied()
            .flatten()
            .filter(|v| !v.is_nan())
    }

    /// Present value clamped into the port's range.
    pub fn clamped(&self, info: &ParamInfo) -> Option<f32> {
        self.get(info.id).map(|v| v.clamp(info.min, info.max))
    }

    /// Clamped value, or the port default when absent.
    pub fn value(&self, info: &ParamInfo) -> f32 {
        self.clamped(info).unwrap_or(info.default)
    }

    /// Switch state (> 0.5), off when absent.
    pub fn flag(&self, info: &ParamInfo) -> bool {
        self.value(info) > 0.5
    }

    /// Clamped value truncated to an integer byte (velocities, channels).
    pub fn byte(&self, info: &ParamInfo) -> u8 {
        self.value(info) as u8
    }

    /// Growth rate for [`Chaos::advance`](crate::Chaos::advance).
    ///
    /// Returned unclamped in double precision; the chaos source clamps.
    pub fn growth_rate(&self, info: &ParamInfo) -> f64 {
        self.get(info.id).map(f64::from).unwrap_or(DEFAULT_GROWTH_RATE)
    }
}
