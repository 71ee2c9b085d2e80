use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub business_rules: BusinessRules,
}

/// Tunable coordination rules. Defaults match the production values.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Windows a user must have stored before submitting for matching.
    #[serde(default = "default_min_availability_slots")]
    pub min_availability_slots: usize,
    /// Shortest acceptable common slot.
    #[serde(default = "default_min_slot_minutes")]
    pub min_slot_minutes: i64,
    /// Visibility penalty applied when cancelling a confirmed date.
    #[serde(default = "default_penalty_hours")]
    pub penalty_hours: i64,
    /// Chat unlocks this many hours before the date starts...
    #[serde(default = "default_chat_opens_before_hours")]
    pub chat_opens_before_hours: i64,
    /// ...and locks again this many hours after the start.
    #[serde(default = "default_chat_closes_after_hours")]
    pub chat_closes_after_hours: i64,
}

fn default_min_availability_slots() -> usize { 3 }
fn default_min_slot_minutes() -> i64 { 90 }
fn default_penalty_hours() -> i64 { 24 }
fn default_chat_opens_before_hours() -> i64 { 4 }
fn default_chat_closes_after_hours() -> i64 { 2 }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            min_availability_slots: default_min_availability_slots(),
            min_slot_minutes: default_min_slot_minutes(),
            penalty_hours: default_penalty_hours(),
            chat_opens_before_hours: default_chat_opens_before_hours(),
            chat_closes_after_hours: default_chat_closes_after_hours(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Every file layer is optional; the serde defaults above cover
            // a bare environment.
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `RENDEZ__BUSINESS_RULES__MIN_SLOT_MINUTES=60`
            .add_source(config::Environment::with_prefix("RENDEZ").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = BusinessRules::default();
        assert_eq!(rules.min_availability_slots, 3);
        assert_eq!(rules.min_slot_minutes, 90);
        assert_eq!(rules.penalty_hours, 24);
        assert_eq!(rules.chat_opens_before_hours, 4);
        assert_eq!(rules.chat_closes_after_hours, 2);
    }
}
