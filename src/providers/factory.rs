use std::sync::Arc;

use super::base::Provider;
use super::configs::ProviderConfig;
use super::openai::OpenAiCompatibleProvider;
use crate::errors::AgentResult;

pub fn get_provider(config: ProviderConfig) -> AgentResult<Arc<dyn Provider>> {
    match config {
        ProviderConfig::OpenAiCompatible(openai_config) => {
            Ok(Arc::new(OpenAiCompatibleProvider::new(openai_config)?))
        }
    }
}
