//! A miniature service SDK for exercising the replay runtime.
//!
//! Shapes follow the recorded-fixture conventions the harness consumes:
//! PascalCase wire fields, a `RequestMetadata` slot on every request, page
//! tokens on list shapes, and sum-typed detail objects discriminated by
//! `source` / `instanceType`.

use serde::{Deserialize, Serialize};
use srt_core::{ConfigProvider, HarnessError, HarnessResult, RequestMetadata, SdkRequest, TestingConfig};
use srt_harness::{DiscriminatorSpec, PageableRequest, PageableResponse, PolymorphicMap};

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Stand-in service client. Carries only what builders install.
#[derive(Debug, Clone)]
pub struct SampleClient {
    /// Installed host: the endpoint override, or a region-derived host.
    pub host: String,
    /// Region the client was bound to; empty when an endpoint was forced.
    pub region: String,
}

/// Client builder following the standard contract: endpoint override wins,
/// region otherwise.
pub fn build_sample_client(
    provider: &dyn ConfigProvider,
    config: &TestingConfig,
) -> HarnessResult<SampleClient> {
    if let Some(endpoint) = config.endpoint_override() {
        return Ok(SampleClient {
            host: endpoint.to_owned(),
            region: String::new(),
        });
    }
    let region = if config.region.is_empty() {
        provider.default_region().to_owned()
    } else {
        config.region.clone()
    };
    Ok(SampleClient {
        host: format!("gateway.{region}.replay.example.com"),
        region,
    })
}

/// Builder that always fails, for exercising build-failure handling.
pub fn failing_client_builder(
    _provider: &dyn ConfigProvider,
    _config: &TestingConfig,
) -> HarnessResult<SampleClient> {
    Err(HarnessError::Build("credentials rejected".to_owned()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway shapes
// ─────────────────────────────────────────────────────────────────────────────

/// Gateway resource payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Gateway {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub lifecycle_state: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetGatewayRequest {
    #[serde(default)]
    pub gateway_id: String,
    #[serde(default)]
    pub request_metadata: RequestMetadata,
}

impl SdkRequest for GetGatewayRequest {
    fn metadata(&self) -> &RequestMetadata {
        &self.request_metadata
    }
    fn metadata_mut(&mut self) -> &mut RequestMetadata {
        &mut self.request_metadata
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetGatewayResponse {
    #[serde(default)]
    pub gateway: Gateway,
    #[serde(default)]
    pub opc_request_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListGatewaysRequest {
    #[serde(default)]
    pub compartment_id: String,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub request_metadata: RequestMetadata,
}

impl SdkRequest for ListGatewaysRequest {
    fn metadata(&self) -> &RequestMetadata {
        &self.request_metadata
    }
    fn metadata_mut(&mut self) -> &mut RequestMetadata {
        &mut self.request_metadata
    }
}

impl PageableRequest for ListGatewaysRequest {
    fn page_token(&self) -> Option<&str> {
        self.page.as_deref()
    }
    fn set_page_token(&mut self, token: Option<String>) {
        self.page = token;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListGatewaysResponse {
    #[serde(default)]
    pub items: Vec<Gateway>,
    #[serde(default)]
    pub opc_next_page: Option<String>,
    #[serde(default)]
    pub opc_request_id: Option<String>,
}

impl PageableResponse for ListGatewaysResponse {
    fn next_page_token(&self) -> Option<&str> {
        self.opc_next_page.as_deref()
    }
}

/// A page per token in `next_tokens`, each carrying one gateway item.
/// An empty token means "last page" on the wire, matching recorded servers
/// that send an empty `OpcNextPage` rather than omitting it.
#[must_use]
pub fn gateway_pages(next_tokens: &[&str]) -> Vec<ListGatewaysResponse> {
    next_tokens
        .iter()
        .enumerate()
        .map(|(i, token)| ListGatewaysResponse {
            items: vec![Gateway {
                id: format!("g{i}"),
                display_name: format!("gateway-{i}"),
                lifecycle_state: "ACTIVE".to_owned(),
            }],
            opc_next_page: Some((*token).to_owned()),
            opc_request_id: None,
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Instance-configuration shapes (polymorphic)
// ─────────────────────────────────────────────────────────────────────────────

/// Sum-typed configuration source, discriminated by `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum InstanceConfigurationSource {
    /// Configuration described from scratch.
    #[serde(rename = "NONE")]
    Fresh {
        #[serde(rename = "DisplayName", default)]
        display_name: Option<String>,
        #[serde(rename = "LaunchDetails", default)]
        launch_details: Option<InstanceConfigurationInstanceDetails>,
    },
    /// Configuration captured from a running instance.
    #[serde(rename = "INSTANCE")]
    FromInstance {
        #[serde(rename = "InstanceId", default)]
        instance_id: Option<String>,
        #[serde(rename = "DisplayName", default)]
        display_name: Option<String>,
    },
}

/// Sum-typed launch details, discriminated by `instanceType`. Only a compute
/// variant exists today; the registration table tolerates future variants
/// without harness changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "instanceType")]
pub enum InstanceConfigurationInstanceDetails {
    #[serde(rename = "compute")]
    Compute {
        #[serde(rename = "Shape", default)]
        shape: Option<String>,
        #[serde(rename = "ImageId", default)]
        image_id: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateInstanceConfigurationRequest {
    #[serde(default)]
    pub instance_details: Option<InstanceConfigurationSource>,
    #[serde(default)]
    pub request_metadata: RequestMetadata,
}

impl SdkRequest for CreateInstanceConfigurationRequest {
    fn metadata(&self) -> &RequestMetadata {
        &self.request_metadata
    }
    fn metadata_mut(&mut self) -> &mut RequestMetadata {
        &mut self.request_metadata
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateInstanceConfigurationResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub opc_request_id: Option<String>,
}

/// Registration table for the instance-configuration request family.
#[must_use]
pub fn instance_configuration_poly() -> PolymorphicMap {
    PolymorphicMap::new()
        .register(
            "InstanceDetails",
            DiscriminatorSpec::new("source")
                .with_variant("NONE", "NONE")
                .with_variant("INSTANCE", "INSTANCE"),
        )
        .register(
            "LaunchDetails",
            DiscriminatorSpec::new("instanceType").with_variant("compute", "compute"),
        )
}
