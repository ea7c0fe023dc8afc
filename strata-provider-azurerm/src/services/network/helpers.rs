use super::models::InterfaceIPConfiguration;

/// First IP configuration called `name`; unnamed entries never match
pub fn find_network_interface_ip_configuration<'a>(
    configs: Option<&'a [InterfaceIPConfiguration]>,
    name: &str,
) -> Option<&'a InterfaceIPConfiguration> {
    configs?
        .iter()
        .filter(|c| c.name.is_some())
        .find(|c| c.name.as_deref() == Some(name))
}

/// Copy of `configs` with the entry named like `config` replaced by it
///
/// Unnamed entries are dropped; `None` yields an empty list.
pub fn update_network_interface_ip_configuration(
    config: InterfaceIPConfiguration,
    configs: Option<&[InterfaceIPConfiguration]>,
) -> Vec<InterfaceIPConfiguration> {
    let Some(configs) = configs else {
        return Vec::new();
    };
    configs
        .iter()
        .filter(|c| c.name.is_some())
        .map(|c| {
            if c.name == config.name {
                config.clone()
            } else {
                c.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::network::models::{InterfaceIPConfigurationPropertiesFormat, SubResource};

    fn named(name: &str) -> InterfaceIPConfiguration {
        InterfaceIPConfiguration {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn with_pool(name: &str, pool: &str) -> InterfaceIPConfiguration {
        InterfaceIPConfiguration {
            properties: Some(InterfaceIPConfigurationPropertiesFormat {
                load_balancer_backend_address_pools: Some(vec![SubResource {
                    id: Some(pool.to_string()),
                }]),
                ..Default::default()
            }),
            ..named(name)
        }
    }

    #[test]
    fn find_skips_unnamed_and_returns_first_match() {
        let configs = vec![
            InterfaceIPConfiguration::default(),
            with_pool("primary", "first"),
            with_pool("primary", "second"),
        ];
        let found = find_network_interface_ip_configuration(Some(&configs), "primary").unwrap();
        assert_eq!(found, &configs[1]);
        assert!(find_network_interface_ip_configuration(Some(&configs), "other").is_none());
        assert!(find_network_interface_ip_configuration(None, "primary").is_none());
    }

    #[test]
    fn update_replaces_by_name_and_drops_unnamed() {
        let configs = vec![named("a"), InterfaceIPConfiguration::default(), named("b")];
        let updated = update_network_interface_ip_configuration(with_pool("b", "pool"), Some(&configs));
        assert_eq!(updated, vec![named("a"), with_pool("b", "pool")]);
    }

    #[test]
    fn update_of_nothing_is_empty() {
        assert!(update_network_interface_ip_configuration(named("a"), None).is_empty());
        assert!(update_network_interface_ip_configuration(named("a"), Some(&[])).is_empty());
    }

    #[test]
    fn update_without_a_match_keeps_the_list() {
        let configs = vec![named("a"), named("b")];
        assert_eq!(
            update_network_interface_ip_configuration(named("c"), Some(&configs)),
            configs
        );
    }
}
