use bistro_core::{StaffRole, StaticRoster};
use bistro_order::{NotificationSettings, Priority};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub restaurant: RestaurantConfig,
    pub notifications: NotificationConfig,
    pub staff: StaffConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RestaurantConfig {
    pub name: String,
    pub currency_label: String,
}

impl Default for RestaurantConfig {
    fn default() -> Self {
        Self {
            name: "Bistro".to_string(),
            currency_label: "лей".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    pub kitchen_prefix: String,
    pub waiters_prefix: String,
    pub management_prefix: String,
    pub management_priority: Priority,
    pub event_buffer: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        let settings = NotificationSettings::default();
        Self {
            kitchen_prefix: settings.kitchen_prefix,
            waiters_prefix: settings.waiters_prefix,
            management_prefix: settings.management_prefix,
            management_priority: settings.management_priority,
            event_buffer: 256,
        }
    }
}

impl NotificationConfig {
    pub fn settings(&self) -> NotificationSettings {
        NotificationSettings {
            kitchen_prefix: self.kitchen_prefix.clone(),
            waiters_prefix: self.waiters_prefix.clone(),
            management_prefix: self.management_prefix.clone(),
            management_priority: self.management_priority,
        }
    }
}

/// Who receives each role's notifications; unset roles use the role name
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StaffConfig {
    pub kitchen: Option<String>,
    pub waiters: Option<String>,
    pub management: Option<String>,
}

impl StaffConfig {
    pub fn roster(&self) -> StaticRoster {
        let entries = [
            (StaffRole::Kitchen, &self.kitchen),
            (StaffRole::Waiters, &self.waiters),
            (StaffRole::Management, &self.management),
        ];

        entries
            .into_iter()
            .fold(StaticRoster::new(), |roster, (role, recipient)| match recipient {
                Some(recipient) => roster.with_recipient(role, recipient.as_str()),
                None => roster,
            })
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            // Per-environment overrides, e.g. config/production.toml
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `BISTRO_NOTIFICATIONS__EVENT_BUFFER=64`
            .add_source(config::Environment::with_prefix("BISTRO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_core::StaffRoster;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = parse("");
        assert_eq!(config.restaurant.name, "Bistro");
        assert_eq!(config.notifications.event_buffer, 256);
        assert_eq!(config.notifications.settings(), NotificationSettings::default());
        assert_eq!(config.staff.roster().recipient_for(StaffRole::Kitchen), None);
    }

    #[test]
    fn test_overrides() {
        let config = parse(
            r#"
            [restaurant]
            currency_label = "MDL"

            [notifications]
            management_priority = "URGENT"
            kitchen_prefix = "[K] "

            [staff]
            management = "night-manager"
            "#,
        );

        assert_eq!(config.restaurant.currency_label, "MDL");
        assert_eq!(config.restaurant.name, "Bistro");

        let settings = config.notifications.settings();
        assert_eq!(settings.management_priority, Priority::Urgent);
        assert_eq!(settings.kitchen_prefix, "[K] ");
        assert_eq!(settings.waiters_prefix, "[ОФИЦИАНТЫ] ");

        let roster = config.staff.roster();
        assert_eq!(roster.recipient_for(StaffRole::Management).as_deref(), Some("night-manager"));
        assert_eq!(roster.recipient_for(StaffRole::Waiters), None);
    }
}
