use chrono::Utc;
use rand::Rng;

const RANDOM_STRING_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Regions tests deploy into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub primary: String,
    pub secondary: String,
    pub ternary: String,
}

impl Locations {
    fn from_env(env: impl Fn(&str) -> Option<String>) -> Self {
        let location = |var: &str, default: &str| env(var).unwrap_or_else(|| default.to_string());
        Self {
            primary: location("ARM_TEST_LOCATION", "westeurope"),
            secondary: location("ARM_TEST_LOCATION_ALT", "northeurope"),
            ternary: location("ARM_TEST_LOCATION_ALT2", "eastus2"),
        }
    }
}

/// Names and randomness shared by one test's fixtures
#[derive(Debug, Clone)]
pub struct TestData {
    pub resource_type: String,
    pub resource_label: String,
    /// `{resource_type}.{resource_label}`
    pub resource_name: String,
    /// `yyMMddHHmmss` followed by two random digits
    pub random_integer: i64,
    /// Five lowercase alphanumerics
    pub random_string: String,
    pub locations: Locations,
}

impl TestData {
    pub fn build(resource_type: &str, label: &str) -> Self {
        Self::build_with_env(resource_type, label, |key| {
            std::env::var(key).ok().filter(|v| !v.is_empty())
        })
    }

    pub fn build_with_env(
        resource_type: &str,
        label: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut rng = rand::thread_rng();
        let timestamp = Utc::now().format("%y%m%d%H%M%S").to_string();
        let random_integer = format!("{}{:02}", timestamp, rng.gen_range(0..100))
            .parse()
            .unwrap_or_default();
        let random_string = (0..5)
            .map(|_| RANDOM_STRING_CHARS[rng.gen_range(0..RANDOM_STRING_CHARS.len())] as char)
            .collect();

        Self {
            resource_type: resource_type.to_string(),
            resource_label: label.to_string(),
            resource_name: format!("{}.{}", resource_type, label),
            random_integer,
            random_string,
            locations: Locations::from_env(env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_values_have_the_expected_shape() {
        let data = TestData::build_with_env("eventgrid_event_subscription", "test", |_| None);
        assert_eq!(data.resource_name, "eventgrid_event_subscription.test");

        let integer = data.random_integer.to_string();
        assert_eq!(integer.len(), 14);

        assert_eq!(data.random_string.len(), 5);
        assert!(
            data.random_string
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn locations_default_and_override() {
        let data = TestData::build_with_env("t", "test", |_| None);
        assert_eq!(data.locations.primary, "westeurope");
        assert_eq!(data.locations.secondary, "northeurope");
        assert_eq!(data.locations.ternary, "eastus2");

        let data = TestData::build_with_env("t", "test", |key| {
            (key == "ARM_TEST_LOCATION").then(|| "uksouth".to_string())
        });
        assert_eq!(data.locations.primary, "uksouth");
        assert_eq!(data.locations.secondary, "northeurope");
    }
}
