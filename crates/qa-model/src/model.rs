//! Extractive QA model integration using Hugging Face Candle
//!
//! Answers a question by selecting the most probable span of the context.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use compliance_engine::{Answer, QaError, QuestionAnswerer};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::{Encoding, Tokenizer, TruncationParams, TruncationStrategy};

use crate::bert::BertForQuestionAnswering;
use crate::config::{BertConfig, QaModelConfig};
use crate::span::{best_span, SpanCandidate};

/// Where the weights live and in which format
#[derive(Debug, Clone, PartialEq)]
pub enum WeightsFile {
    SafeTensors(PathBuf),
    Pytorch(PathBuf),
}

/// Where the tokenizer comes from
#[derive(Debug, Clone, PartialEq)]
pub enum TokenizerFile {
    Json(PathBuf),
    Vocab(PathBuf),
}

/// Resolved model files
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub weights: WeightsFile,
    pub tokenizer: TokenizerFile,
}

impl ModelFiles {
    /// Locate model files in a local directory
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let config = dir.join("config.json");
        if !config.exists() {
            return Err(anyhow!("Config not found at {}", config.display()));
        }

        let weights = first_existing(dir, &["model.safetensors", "pytorch_model.bin"])
            .map(|path| {
                if path.extension().is_some_and(|ext| ext == "safetensors") {
                    WeightsFile::SafeTensors(path)
                } else {
                    WeightsFile::Pytorch(path)
                }
            })
            .ok_or_else(|| anyhow!("Model weights not found in {}", dir.display()))?;

        let tokenizer = first_existing(dir, &["tokenizer.json", "vocab.txt"])
            .map(|path| {
                if path.extension().is_some_and(|ext| ext == "json") {
                    TokenizerFile::Json(path)
                } else {
                    TokenizerFile::Vocab(path)
                }
            })
            .ok_or_else(|| anyhow!("Tokenizer not found in {}", dir.display()))?;

        Ok(Self {
            config,
            weights,
            tokenizer,
        })
    }

    /// Download model files from the Hugging Face Hub
    pub fn download(model_id: &str, revision: &str) -> Result<Self> {
        tracing::info!("Downloading {} ({}) from Hugging Face Hub...", model_id, revision);

        let api = Api::new()?;
        let repo = api.repo(Repo::with_revision(
            model_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));

        let config = repo.get("config.json")?;

        let weights = match repo.get("model.safetensors") {
            Ok(path) => WeightsFile::SafeTensors(path),
            Err(_) => WeightsFile::Pytorch(repo.get("pytorch_model.bin")?),
        };

        let tokenizer = match repo.get("tokenizer.json") {
            Ok(path) => TokenizerFile::Json(path),
            Err(_) => TokenizerFile::Vocab(repo.get("vocab.txt")?),
        };

        Ok(Self {
            config,
            weights,
            tokenizer,
        })
    }
}

fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|name| dir.join(name)).find(|path| path.exists())
}

/// Build a BERT WordPiece tokenizer from a bare `vocab.txt`
fn wordpiece_tokenizer(vocab: &Path, lowercase: bool) -> Result<Tokenizer> {
    let vocab = vocab
        .to_str()
        .ok_or_else(|| anyhow!("Vocab path is not valid UTF-8: {}", vocab.display()))?;
    let wordpiece = WordPiece::from_file(vocab)
        .unk_token("[UNK]".to_string())
        .build()
        .map_err(|e| anyhow!("Failed to load vocab: {}", e))?;

    let mut tokenizer = Tokenizer::new(wordpiece);
    let cls = tokenizer
        .token_to_id("[CLS]")
        .ok_or_else(|| anyhow!("Vocab has no [CLS] token"))?;
    let sep = tokenizer
        .token_to_id("[SEP]")
        .ok_or_else(|| anyhow!("Vocab has no [SEP] token"))?;

    tokenizer
        .with_normalizer(Some(BertNormalizer::new(true, true, None, lowercase)))
        .with_pre_tokenizer(Some(BertPreTokenizer))
        .with_post_processor(Some(BertProcessing::new(
            ("[SEP]".to_string(), sep),
            ("[CLS]".to_string(), cls),
        )));

    Ok(tokenizer)
}

/// Truncate only the context, overflowing into windows that overlap by
/// `doc_stride` tokens
fn configure_windows(tokenizer: &mut Tokenizer, config: &QaModelConfig) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: config.max_seq_len,
            stride: config.doc_stride,
            strategy: TruncationStrategy::OnlySecond,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Invalid truncation settings: {}", e))?;
    tokenizer.with_padding(None);
    Ok(())
}

fn select_device(force_cpu: bool) -> Result<Device> {
    if force_cpu {
        return Ok(Device::Cpu);
    }
    let device = if candle_core::utils::cuda_is_available() {
        Device::new_cuda(0)?
    } else if candle_core::utils::metal_is_available() {
        Device::new_metal(0)?
    } else {
        Device::Cpu
    };
    Ok(device)
}

/// Extractive BERT QA model
pub struct BertQaModel {
    model: BertForQuestionAnswering,
    tokenizer: Tokenizer,
    device: Device,
    max_answer_len: usize,
}

impl BertQaModel {
    /// Load the model described by `config`, downloading it if no local
    /// directory is configured
    pub fn load(config: &QaModelConfig) -> Result<Self> {
        config.validate()?;
        let files = match &config.model_dir {
            Some(dir) => ModelFiles::from_dir(dir)?,
            None => ModelFiles::download(&config.model_id, &config.revision)?,
        };
        Self::load_files(&files, config)
    }

    /// Load the model from already resolved files
    pub fn load_files(files: &ModelFiles, config: &QaModelConfig) -> Result<Self> {
        let device = select_device(config.force_cpu)?;
        tracing::info!("Loading QA model on device: {:?}", device);

        let config_str = std::fs::read_to_string(&files.config)?;
        let bert_config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| anyhow!("Failed to parse config.json: {}", e))?;

        tracing::info!(
            "Loaded config: {} layers, {} hidden size, {} attention heads",
            bert_config.num_hidden_layers,
            bert_config.hidden_size,
            bert_config.num_attention_heads
        );

        let mut tokenizer = match &files.tokenizer {
            TokenizerFile::Json(path) => Tokenizer::from_file(path)
                .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?,
            TokenizerFile::Vocab(path) => wordpiece_tokenizer(path, config.lowercase)?,
        };
        configure_windows(&mut tokenizer, config)?;

        let vb = match &files.weights {
            WeightsFile::SafeTensors(path) => {
                tracing::info!("Loading model weights from {}", path.display());
                // SAFETY: the weights file is not modified while mapped
                unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, &device)? }
            }
            WeightsFile::Pytorch(path) => {
                tracing::info!("Loading PyTorch weights from {}", path.display());
                VarBuilder::from_pth(path, DType::F32, &device)?
            }
        };

        let model = BertForQuestionAnswering::load(vb, &bert_config)?;
        tracing::info!("QA model loaded successfully");

        Ok(Self {
            model,
            tokenizer,
            device,
            max_answer_len: config.max_answer_len,
        })
    }

    /// Extract the most probable answer to `question` from `context`
    pub fn extract(&self, question: &str, context: &str) -> Result<Answer> {
        let encoding = self
            .tokenizer
            .encode((question, context), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let mut best: Option<(SpanCandidate, usize, usize)> = None;
        let windows = std::iter::once(&encoding).chain(encoding.get_overflowing().iter());

        for window in windows {
            let Some(span) = self.score_window(window)? else {
                continue;
            };
            if best.map_or(true, |(b, _, _)| span.score > b.score) {
                let offsets = window.get_offsets();
                best = Some((span, offsets[span.start].0, offsets[span.end].1));
            }
        }

        let Some((span, start, end)) = best else {
            return Ok(Answer::new("", 0.0));
        };

        let text = context
            .get(start..end)
            .ok_or_else(|| anyhow!("Answer offsets {}..{} fall outside the context", start, end))?;

        tracing::debug!(score = span.score, answer = text, "Extracted answer");
        Ok(Answer::new(text.trim(), f64::from(span.score)))
    }

    /// Run one window through the model and pick its best context span
    fn score_window(&self, window: &Encoding) -> Result<Option<SpanCandidate>> {
        let seq_len = window.get_ids().len();

        let input_ids = Tensor::new(window.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(window.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let position_ids = Tensor::arange(0u32, seq_len as u32, &self.device)?.unsqueeze(0)?;
        // No padding within a window, every token attends to every other
        let attention_mask = Tensor::zeros((1, 1, 1, seq_len), DType::F32, &self.device)?;

        let logits = self
            .model
            .forward(&input_ids, &token_type_ids, &position_ids, &attention_mask)?
            .squeeze(0)?
            .to_vec2::<f32>()?;

        let start_logits: Vec<f32> = logits.iter().map(|pair| pair[0]).collect();
        let end_logits: Vec<f32> = logits.iter().map(|pair| pair[1]).collect();
        let context_mask: Vec<bool> = window
            .get_sequence_ids()
            .into_iter()
            .map(|id| id == Some(1))
            .collect();

        Ok(best_span(
            &start_logits,
            &end_logits,
            &context_mask,
            self.max_answer_len,
        ))
    }
}

impl QuestionAnswerer for BertQaModel {
    fn answer(&self, question: &str, context: &str) -> Result<Answer, QaError> {
        self.extract(question, context)
            .map_err(|e| QaError::Inference(format!("{:#}", e)))
    }
}
