/// A button that does nothing while disabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    label: String,
    enabled: bool,
}

impl Button {
    pub fn new(label: &str) -> Self {
        Self {
            label: String::from(label),
            enabled: true,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = String::from(label);
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns whether the click went through.
    pub fn click(&self) -> bool {
        self.enabled
    }
}

/// A slider over `[min, max]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Slider {
    value: f64,
    min: f64,
    max: f64,
    enabled: bool,
}

impl Slider {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            value: min,
            min,
            max: max.max(min),
            enabled: true,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Moves the slider without it counting as user input.
    pub fn set_value(&mut self, value: f64) {
        self.value = self.clamp(value);
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn set_max(&mut self, max: f64) {
        self.max = max.max(self.min);
        self.value = self.clamp(self.value);
    }

    /// How far along the slider is, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.max > self.min {
            (self.value - self.min) / (self.max - self.min)
        } else {
            0.0
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The user moved the slider. Returns the new value, or `None` while
    /// disabled.
    pub fn change(&mut self, value: f64) -> Option<f64> {
        if !self.enabled || value.is_nan() {
            return None;
        }
        self.value = self.clamp(value);
        Some(self.value)
    }

    fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }
}
