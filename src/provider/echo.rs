// ABOUTME: Echo provider returning the rendered task context unchanged
// ABOUTME: Used for dry runs of catalogs and as the reference provider in tests

use async_trait::async_trait;

use super::error::Result;
use super::{CapabilityProvider, CapabilityRequest};

#[derive(Debug, Clone, Default)]
pub struct EchoProvider;

impl EchoProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CapabilityProvider for EchoProvider {
    async fn execute(&self, request: &CapabilityRequest) -> Result<String> {
        Ok(request.context.clone())
    }

    fn name(&self) -> &str {
        "echo"
    }
}
