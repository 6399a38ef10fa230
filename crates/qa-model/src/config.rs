//! Configuration for the QA model
//!
//! Handles model location, inference window sizes and device selection.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Default checkpoint: BERT base fine-tuned for extractive QA on SQuAD 2.0
pub const DEFAULT_MODEL_ID: &str = "deepset/bert-base-cased-squad2";

/// QA model configuration
#[derive(Debug, Clone, PartialEq)]
pub struct QaModelConfig {
    /// Hugging Face Hub model id
    pub model_id: String,
    /// Hub revision (branch, tag or commit)
    pub revision: String,
    /// Local directory holding the model files; skips the Hub when set
    pub model_dir: Option<PathBuf>,
    /// Maximum tokens per window (question + context + special tokens)
    pub max_seq_len: usize,
    /// Tokens of overlap between consecutive context windows
    pub doc_stride: usize,
    /// Maximum answer length in tokens
    pub max_answer_len: usize,
    /// Lowercase input when building a tokenizer from `vocab.txt`
    pub lowercase: bool,
    /// Run on CPU even when an accelerator is available
    pub force_cpu: bool,
}

impl Default for QaModelConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            revision: "main".to_string(),
            model_dir: None,
            max_seq_len: 384,
            doc_stride: 128,
            max_answer_len: 15,
            lowercase: false,
            force_cpu: false,
        }
    }
}

impl QaModelConfig {
    /// Configuration for a Hub model id, lowercasing if the id says "uncased"
    pub fn hub(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            lowercase: model_id.contains("uncased"),
            ..Self::default()
        }
    }

    /// Configuration for model files already on disk
    pub fn local(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: Some(model_dir.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - QA_MODEL_ID: Hub model id (default: deepset/bert-base-cased-squad2)
    /// - QA_MODEL_REVISION: Hub revision (default: "main")
    /// - QA_MODEL_DIR: local model directory
    /// - QA_MAX_SEQ_LEN, QA_DOC_STRIDE, QA_MAX_ANSWER_LEN: window sizes
    /// - QA_LOWERCASE, QA_FORCE_CPU: "true" or "false"
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_id = lookup("QA_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
        let mut config = Self::hub(&model_id);

        if let Some(revision) = lookup("QA_MODEL_REVISION") {
            config.revision = revision;
        }
        config.model_dir = lookup("QA_MODEL_DIR").map(PathBuf::from);

        if let Some(raw) = lookup("QA_MAX_SEQ_LEN") {
            config.max_seq_len = parse_number("QA_MAX_SEQ_LEN", &raw)?;
        }
        if let Some(raw) = lookup("QA_DOC_STRIDE") {
            config.doc_stride = parse_number("QA_DOC_STRIDE", &raw)?;
        }
        if let Some(raw) = lookup("QA_MAX_ANSWER_LEN") {
            config.max_answer_len = parse_number("QA_MAX_ANSWER_LEN", &raw)?;
        }
        if let Some(raw) = lookup("QA_LOWERCASE") {
            config.lowercase = parse_flag("QA_LOWERCASE", &raw)?;
        }
        if let Some(raw) = lookup("QA_FORCE_CPU") {
            config.force_cpu = parse_flag("QA_FORCE_CPU", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check window sizes are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_answer_len == 0 {
            return Err(anyhow!("max_answer_len must be at least 1"));
        }
        if self.doc_stride >= self.max_seq_len {
            return Err(anyhow!(
                "doc_stride ({}) must be smaller than max_seq_len ({})",
                self.doc_stride,
                self.max_seq_len
            ));
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("{} must be a positive integer, got '{}'", key, raw))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(anyhow!("{} must be true or false, got '{}'", key, raw)),
    }
}

/// BERT architecture parameters read from `config.json`
#[derive(Debug, Clone, Deserialize)]
pub struct BertConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
}

fn default_hidden_act() -> String {
    "gelu".to_string()
}

fn default_type_vocab_size() -> usize {
    2
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = QaModelConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, QaModelConfig::default());
        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert!(!config.lowercase);
    }

    #[test]
    fn test_uncased_model_lowercases() {
        let config = QaModelConfig::hub("nlpaueb/legal-bert-base-uncased");
        assert!(config.lowercase);
    }

    #[test]
    fn test_reads_overrides() {
        let config = QaModelConfig::from_lookup(lookup_from(&[
            ("QA_MODEL_DIR", "/models/qa"),
            ("QA_MAX_SEQ_LEN", "512"),
            ("QA_DOC_STRIDE", "64"),
            ("QA_FORCE_CPU", "true"),
        ]))
        .unwrap();
        assert_eq!(config.model_dir, Some(PathBuf::from("/models/qa")));
        assert_eq!(config.max_seq_len, 512);
        assert_eq!(config.doc_stride, 64);
        assert!(config.force_cpu);
    }

    #[test]
    fn test_rejects_stride_larger_than_window() {
        let result = QaModelConfig::from_lookup(lookup_from(&[
            ("QA_MAX_SEQ_LEN", "128"),
            ("QA_DOC_STRIDE", "128"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(QaModelConfig::from_lookup(lookup_from(&[("QA_MAX_SEQ_LEN", "many")])).is_err());
        assert!(QaModelConfig::from_lookup(lookup_from(&[("QA_FORCE_CPU", "maybe")])).is_err());
    }

    #[test]
    fn test_bert_config_defaults() {
        let raw = r#"{
            "vocab_size": 28996, "hidden_size": 768, "num_hidden_layers": 12,
            "num_attention_heads": 12, "intermediate_size": 3072,
            "max_position_embeddings": 512
        }"#;
        let config: BertConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.hidden_act, "gelu");
        assert_eq!(config.type_vocab_size, 2);
        assert_eq!(config.layer_norm_eps, 1e-12);
    }
}
