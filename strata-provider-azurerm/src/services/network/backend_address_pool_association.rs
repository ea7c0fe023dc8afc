//! `network_interface_backend_address_pool_association`
//!
//! Associates one IP configuration of a network interface with a load
//! balancer backend address pool. There is no ARM object for the
//! association itself: the interface is read, the pool reference added to or
//! removed from the IP configuration, and the interface written back.

use std::collections::HashMap;

use strata_core::provider::{ProviderError, ProviderResult, ResourceType};
use strata_core::resource::{Attributes, Resource, ResourceId, State, Value};
use strata_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::helpers::{
    find_network_interface_ip_configuration, update_network_interface_ip_configuration,
};
use super::models::{Interface, SubResource};
use super::parse::{
    BackendAddressPoolAssociationId, BackendAddressPoolId, NetworkInterfaceId,
    NetworkInterfaceIpConfigurationId,
};
use super::API_VERSION;
use crate::client::{ArmClient, ArmResultExt};

pub const TYPE_NAME: &str = "network_interface_backend_address_pool_association";

pub struct BackendAddressPoolAssociationType;

impl ResourceType for BackendAddressPoolAssociationType {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description(
            "Manages the association between a Network Interface and a Load Balancer's Backend Address Pool",
        )
        .attribute(
            AttributeSchema::new("network_interface_id", types::arm_resource_id())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("ip_configuration_name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("backend_address_pool_id", types::arm_resource_id())
                .required()
                .force_new(),
        )
}

fn same_id(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn has_pool(pools: &[SubResource], pool_id: &str) -> bool {
    pools
        .iter()
        .any(|p| p.id.as_deref().is_some_and(|id| same_id(id, pool_id)))
}

fn describe(id: &BackendAddressPoolAssociationId) -> String {
    format!(
        "association between IP Configuration {:?} (Network Interface {:?}) and Backend Address Pool {:?}",
        id.ip_configuration.name,
        id.ip_configuration.network_interface.name,
        id.backend_address_pool.to_string()
    )
}

fn id_from_attributes(
    attributes: &HashMap<String, Value>,
) -> ProviderResult<BackendAddressPoolAssociationId> {
    let required = |key: &str| {
        attributes
            .get_str(key)
            .ok_or_else(|| ProviderError::validation(format!("'{}' is required", key)))
    };
    let network_interface = NetworkInterfaceId::parse(required("network_interface_id")?)?;
    let backend_address_pool = BackendAddressPoolId::parse(required("backend_address_pool_id")?)?;
    Ok(BackendAddressPoolAssociationId {
        ip_configuration: NetworkInterfaceIpConfigurationId::new(
            network_interface,
            required("ip_configuration_name")?,
        ),
        backend_address_pool,
    })
}

async fn get_interface(
    client: &ArmClient,
    nic: &NetworkInterfaceId,
) -> ProviderResult<Option<Interface>> {
    client
        .get::<Interface>(&nic.to_string(), API_VERSION)
        .await
        .context(|| format!("retrieving Network Interface {:?}", nic.name))
}

pub async fn create(client: &ArmClient, resource: &Resource) -> ProviderResult<State> {
    let for_resource = |e: ProviderError| e.for_resource(resource.id.clone());
    let id = id_from_attributes(&resource.attributes).map_err(for_resource)?;
    let nic = &id.ip_configuration.network_interface;
    let pool_id = id.backend_address_pool.to_string();

    let mut interface = get_interface(client, nic)
        .await
        .map_err(for_resource)?
        .ok_or_else(|| {
            for_resource(ProviderError::not_found(format!(
                "Network Interface {:?} was not found",
                nic.to_string()
            )))
        })?;

    let configs = interface
        .properties
        .as_ref()
        .and_then(|p| p.ip_configurations.as_deref());
    let mut config = find_network_interface_ip_configuration(configs, &id.ip_configuration.name)
        .cloned()
        .ok_or_else(|| {
            for_resource(ProviderError::not_found(format!(
                "IP Configuration {:?} was not found on Network Interface {:?}",
                id.ip_configuration.name,
                nic.to_string()
            )))
        })?;

    let properties = config.properties.get_or_insert_with(Default::default);
    let pools = properties
        .load_balancer_backend_address_pools
        .get_or_insert_with(Vec::new);
    if has_pool(pools, &pool_id) {
        return Err(for_resource(ProviderError::requires_import(
            TYPE_NAME,
            &id.to_string(),
        )));
    }
    pools.push(SubResource {
        id: Some(pool_id.clone()),
    });

    log::info!("Creating {}", describe(&id));
    let updated = update_network_interface_ip_configuration(config, configs);
    interface
        .properties
        .get_or_insert_with(Default::default)
        .ip_configurations = Some(updated);
    client
        .put(&nic.to_string(), API_VERSION, &interface)
        .await
        .context(|| format!("creating {}", describe(&id)))
        .map_err(for_resource)?;

    read(client, &resource.id, &id.to_string()).await
}

pub async fn read(client: &ArmClient, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
    let association = BackendAddressPoolAssociationId::parse(identifier)
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    if !is_associated(client, &association)
        .await
        .map_err(|e| e.for_resource(id.clone()))?
    {
        log::info!("{} was not found - removing from state", describe(&association));
        return Ok(State::not_found(id.clone()));
    }

    let attributes = HashMap::from([
        (
            "network_interface_id".to_string(),
            Value::String(association.ip_configuration.network_interface.to_string()),
        ),
        (
            "ip_configuration_name".to_string(),
            Value::String(association.ip_configuration.name.clone()),
        ),
        (
            "backend_address_pool_id".to_string(),
            Value::String(association.backend_address_pool.to_string()),
        ),
    ]);
    Ok(State::existing(id.clone(), attributes).with_identifier(association.to_string()))
}

async fn is_associated(
    client: &ArmClient,
    association: &BackendAddressPoolAssociationId,
) -> ProviderResult<bool> {
    let Some(interface) =
        get_interface(client, &association.ip_configuration.network_interface).await?
    else {
        return Ok(false);
    };
    let configs = interface
        .properties
        .as_ref()
        .and_then(|p| p.ip_configurations.as_deref());
    let pool_id = association.backend_address_pool.to_string();
    Ok(
        find_network_interface_ip_configuration(configs, &association.ip_configuration.name)
            .and_then(|c| c.properties.as_ref())
            .and_then(|p| p.load_balancer_backend_address_pools.as_deref())
            .is_some_and(|pools| has_pool(pools, &pool_id)),
    )
}

pub async fn delete(client: &ArmClient, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
    let for_resource = |e: ProviderError| e.for_resource(id.clone());
    let association =
        BackendAddressPoolAssociationId::parse(identifier).map_err(|e| for_resource(e.into()))?;
    let nic = &association.ip_configuration.network_interface;
    let pool_id = association.backend_address_pool.to_string();

    let Some(mut interface) = get_interface(client, nic).await.map_err(for_resource)? else {
        return Ok(());
    };
    let configs = interface
        .properties
        .as_ref()
        .and_then(|p| p.ip_configurations.as_deref());
    let Some(mut config) =
        find_network_interface_ip_configuration(configs, &association.ip_configuration.name)
            .cloned()
    else {
        return Ok(());
    };

    if let Some(pools) = config
        .properties
        .as_mut()
        .and_then(|p| p.load_balancer_backend_address_pools.as_mut())
    {
        pools.retain(|p| !p.id.as_deref().is_some_and(|id| same_id(id, &pool_id)));
    }

    log::info!("Deleting {}", describe(&association));
    let updated = update_network_interface_ip_configuration(config, configs);
    interface
        .properties
        .get_or_insert_with(Default::default)
        .ip_configurations = Some(updated);
    client
        .put(&nic.to_string(), API_VERSION, &interface)
        .await
        .context(|| format!("deleting {}", describe(&association)))
        .map_err(for_resource)
}

pub async fn exists(client: &ArmClient, identifier: &str) -> ProviderResult<bool> {
    let association = BackendAddressPoolAssociationId::parse(identifier)?;
    is_associated(client, &association).await
}
