//! Sampling settings forwarded to the model.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Settings controlling text generation.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_leaves_unset_fields_empty() {
        let settings = GenerationSettings::builder().temperature(0.2).build();
        assert_eq!(settings.temperature, Some(0.2));
        assert!(settings.max_tokens.is_none());
    }
}
