//! Live API Management tests, run with `ARM_ACC=1` and
//! `ARM_TEST_API_MANAGEMENT_API_TAG_ID`

use strata_core::provider::Provider;
use strata_core::resource::Attributes;
use strata_provider_azurerm::acceptance::{
    self, ApiTagDescriptionFixture, ExistsInAzure, TestData,
};
use strata_provider_azurerm::{AzureRmProvider, ProviderConfig};

const TYPE_NAME: &str = "api_management_api_tag_description";

fn setup() -> Option<(AzureRmProvider, ApiTagDescriptionFixture, TestData)> {
    if !acceptance::enabled() {
        return None;
    }
    let fixture = ApiTagDescriptionFixture::from_env()?;
    let config = ProviderConfig::from_env().expect("provider configuration");
    let provider = AzureRmProvider::new(config).expect("provider");
    Some((provider, fixture, TestData::build(TYPE_NAME, "test")))
}

#[tokio::test]
async fn lifecycle() {
    let Some((provider, fixture, data)) = setup() else {
        return;
    };
    let basic = fixture.requires_import(&data);
    let test = basic.resource("test").expect("test");

    let state = provider.create(test).await.expect("create");
    let identifier = state.identifier.clone().expect("identifier");
    assert!(fixture.exists(&provider, &identifier).await.expect("exists"));

    let err = provider
        .create(basic.resource("import").expect("import"))
        .await
        .expect_err("second create must fail");
    assert!(err.is_requires_import());

    let updated = fixture.update(&data);
    let state = provider
        .update(&state.id, &identifier, &state, updated.resource("test").expect("test"))
        .await
        .expect("update");
    assert_eq!(
        state.attributes.get_str("description"),
        Some("tag description update")
    );

    provider.delete(&state.id, &identifier).await.expect("delete");
    assert!(!fixture.exists(&provider, &identifier).await.expect("exists"));
}
