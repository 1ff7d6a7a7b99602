use serde::{Deserialize, Serialize};

use crate::core::{
    DEFAULT_POOL_SIZE, JoinPolicy, MissingFieldPolicy, OrderingStrategy, PinPolicy, TotalFieldSet,
};
use crate::error::{StackError, StackResult};

/// Which series a consumer should chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Proportions,
    #[default]
    Absolute,
}

/// Public engine bootstrap configuration.
///
/// This type is serializable so host applications can persist/load a setup
/// without inventing their own ad-hoc format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_proportion_date_field")]
    pub proportion_date_field: String,
    #[serde(default = "default_total_date_field")]
    pub total_date_field: String,
    #[serde(default)]
    pub total_fields: TotalFieldSet,
    #[serde(default)]
    pub missing_field_policy: MissingFieldPolicy,
    #[serde(default)]
    pub join_policy: JoinPolicy,
    #[serde(default)]
    pub ordering: OrderingStrategy,
    #[serde(default = "default_pins")]
    pub pins: PinPolicy,
    #[serde(default = "default_palette_size")]
    pub palette_size: usize,
    #[serde(default)]
    pub display_mode: DisplayMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Creates a config matching the weekly variant proportion and regional
    /// totals layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            proportion_date_field: default_proportion_date_field(),
            total_date_field: default_total_date_field(),
            total_fields: TotalFieldSet::default(),
            missing_field_policy: MissingFieldPolicy::default(),
            join_policy: JoinPolicy::default(),
            ordering: OrderingStrategy::default(),
            pins: default_pins(),
            palette_size: default_palette_size(),
            display_mode: DisplayMode::default(),
        }
    }

    /// Sets the field names carrying the date in each series.
    #[must_use]
    pub fn with_date_fields(
        mut self,
        proportion_date_field: impl Into<String>,
        total_date_field: impl Into<String>,
    ) -> Self {
        self.proportion_date_field = proportion_date_field.into();
        self.total_date_field = total_date_field.into();
        self
    }

    /// Sets the sub-fields summed into each total.
    #[must_use]
    pub fn with_total_fields(mut self, fields: TotalFieldSet) -> Self {
        self.total_fields = fields;
        self
    }

    #[must_use]
    pub fn with_missing_field_policy(mut self, policy: MissingFieldPolicy) -> Self {
        self.missing_field_policy = policy;
        self
    }

    /// Sets handling of proportion dates without a total.
    #[must_use]
    pub fn with_join_policy(mut self, policy: JoinPolicy) -> Self {
        self.join_policy = policy;
        self
    }

    /// Sets the strategy applied on load.
    #[must_use]
    pub fn with_ordering(mut self, strategy: OrderingStrategy) -> Self {
        self.ordering = strategy;
        self
    }

    #[must_use]
    pub fn with_pins(mut self, pins: PinPolicy) -> Self {
        self.pins = pins;
        self
    }

    /// Sets the number of colors drawn per palette regeneration.
    #[must_use]
    pub fn with_palette_size(mut self, palette_size: usize) -> Self {
        self.palette_size = palette_size;
        self
    }

    #[must_use]
    pub fn with_display_mode(mut self, mode: DisplayMode) -> Self {
        self.display_mode = mode;
        self
    }

    pub fn validate(&self) -> StackResult<()> {
        for (name, field) in [
            ("proportion_date_field", &self.proportion_date_field),
            ("total_date_field", &self.total_date_field),
        ] {
            if field.trim().is_empty() {
                return Err(StackError::InvalidConfig(format!("{name} must be non-empty")));
            }
        }
        self.total_fields.validate()?;
        if self.palette_size == 0 {
            return Err(StackError::InvalidConfig(
                "palette_size must be > 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Serializes config to pretty JSON.
    pub fn to_json_pretty(&self) -> StackResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates config from JSON.
    pub fn from_json_str(input: &str) -> StackResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| StackError::InvalidConfig(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

fn default_proportion_date_field() -> String {
    "week_end".to_owned()
}

fn default_total_date_field() -> String {
    "date".to_owned()
}

fn default_pins() -> PinPolicy {
    PinPolicy::catch_all("Other")
}

fn default_palette_size() -> usize {
    DEFAULT_POOL_SIZE
}
