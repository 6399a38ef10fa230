//! BERT encoder with an extractive question-answering head

use anyhow::{anyhow, Result};
use candle_core::{Module, Tensor};
use candle_nn::{layer_norm, linear, Activation, Embedding, LayerNorm, Linear, VarBuilder};

use crate::config::BertConfig;

/// Load a layer norm stored either as weight/bias or as gamma/beta
fn load_layer_norm(size: usize, eps: f64, vb: VarBuilder) -> Result<LayerNorm> {
    if vb.contains_tensor("weight") {
        return Ok(layer_norm(size, eps, vb)?);
    }
    let weight = vb.get(size, "gamma")?;
    let bias = vb.get(size, "beta")?;
    Ok(LayerNorm::new(weight, bias, eps))
}

/// BERT Embeddings layer
struct BertEmbeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
}

impl BertEmbeddings {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let word_embeddings = candle_nn::embedding(
            config.vocab_size,
            config.hidden_size,
            vb.pp("word_embeddings"),
        )?;
        let position_embeddings = candle_nn::embedding(
            config.max_position_embeddings,
            config.hidden_size,
            vb.pp("position_embeddings"),
        )?;
        let token_type_embeddings = candle_nn::embedding(
            config.type_vocab_size,
            config.hidden_size,
            vb.pp("token_type_embeddings"),
        )?;
        let layer_norm = load_layer_norm(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("LayerNorm"),
        )?;

        Ok(Self {
            word_embeddings,
            position_embeddings,
            token_type_embeddings,
            layer_norm,
        })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        position_ids: &Tensor,
    ) -> Result<Tensor> {
        let word_embeds = self.word_embeddings.forward(input_ids)?;
        let position_embeds = self.position_embeddings.forward(position_ids)?;
        let token_type_embeds = self.token_type_embeddings.forward(token_type_ids)?;

        let embeddings = ((word_embeds + position_embeds)? + token_type_embeds)?;
        Ok(self.layer_norm.forward(&embeddings)?)
    }
}

/// BERT Self-Attention layer
struct BertSelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    num_attention_heads: usize,
    attention_head_size: usize,
}

impl BertSelfAttention {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let attention_head_size = config.hidden_size / config.num_attention_heads;
        let all_head_size = config.num_attention_heads * attention_head_size;

        let query = linear(config.hidden_size, all_head_size, vb.pp("query"))?;
        let key = linear(config.hidden_size, all_head_size, vb.pp("key"))?;
        let value = linear(config.hidden_size, all_head_size, vb.pp("value"))?;

        Ok(Self {
            query,
            key,
            value,
            num_attention_heads: config.num_attention_heads,
            attention_head_size,
        })
    }

    /// [batch, seq, hidden] -> [batch, heads, seq, head_size]
    fn transpose_for_scores(&self, x: &Tensor) -> Result<Tensor> {
        let mut new_shape = x.dims().to_vec();
        new_shape.pop();
        new_shape.push(self.num_attention_heads);
        new_shape.push(self.attention_head_size);
        Ok(x.reshape(new_shape)?.transpose(1, 2)?.contiguous()?)
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let query_layer = self.transpose_for_scores(&self.query.forward(hidden_states)?)?;
        let key_layer = self.transpose_for_scores(&self.key.forward(hidden_states)?)?;
        let value_layer = self.transpose_for_scores(&self.value.forward(hidden_states)?)?;

        let attention_scores = query_layer.matmul(&key_layer.t()?)?;
        let attention_scores = (attention_scores / (self.attention_head_size as f64).sqrt())?;
        let attention_scores = attention_scores.broadcast_add(attention_mask)?;

        let attention_probs = candle_nn::ops::softmax_last_dim(&attention_scores)?;

        let context_layer = attention_probs.matmul(&value_layer)?;
        let context_layer = context_layer.transpose(1, 2)?.contiguous()?;

        let mut new_shape = context_layer.dims().to_vec();
        new_shape.pop();
        new_shape.pop();
        new_shape.push(self.num_attention_heads * self.attention_head_size);

        Ok(context_layer.reshape(new_shape)?)
    }
}

/// Dense projection followed by residual add and layer norm
struct ResidualOutput {
    dense: Linear,
    layer_norm: LayerNorm,
}

impl ResidualOutput {
    fn load(vb: VarBuilder, in_dim: usize, config: &BertConfig) -> Result<Self> {
        let dense = linear(in_dim, config.hidden_size, vb.pp("dense"))?;
        let layer_norm = load_layer_norm(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("LayerNorm"),
        )?;

        Ok(Self { dense, layer_norm })
    }

    fn forward(&self, hidden_states: &Tensor, input_tensor: &Tensor) -> Result<Tensor> {
        let hidden_states = self.dense.forward(hidden_states)?;
        Ok(self.layer_norm.forward(&(hidden_states + input_tensor)?)?)
    }
}

/// BERT Layer (one transformer block)
struct BertLayer {
    self_attention: BertSelfAttention,
    attention_output: ResidualOutput,
    intermediate: Linear,
    activation: Activation,
    output: ResidualOutput,
}

impl BertLayer {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let attention_vb = vb.pp("attention");
        let self_attention = BertSelfAttention::load(attention_vb.pp("self"), config)?;
        let attention_output =
            ResidualOutput::load(attention_vb.pp("output"), config.hidden_size, config)?;

        let intermediate = linear(
            config.hidden_size,
            config.intermediate_size,
            vb.pp("intermediate").pp("dense"),
        )?;
        let activation = match config.hidden_act.as_str() {
            "gelu" => Activation::Gelu,
            "relu" => Activation::Relu,
            other => return Err(anyhow!("Unsupported activation: {}", other)),
        };
        let output = ResidualOutput::load(vb.pp("output"), config.intermediate_size, config)?;

        Ok(Self {
            self_attention,
            attention_output,
            intermediate,
            activation,
            output,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let attended = self.self_attention.forward(hidden_states, attention_mask)?;
        let attention_output = self.attention_output.forward(&attended, hidden_states)?;

        let intermediate = self.intermediate.forward(&attention_output)?;
        let intermediate = self.activation.forward(&intermediate)?;
        self.output.forward(&intermediate, &attention_output)
    }
}

/// BERT encoder plus the span-prediction head
pub struct BertForQuestionAnswering {
    embeddings: BertEmbeddings,
    layers: Vec<BertLayer>,
    qa_outputs: Linear,
}

impl BertForQuestionAnswering {
    /// Load from a checkpoint's root `VarBuilder`.
    ///
    /// Accepts encoders stored with or without the `bert.` prefix; the
    /// `qa_outputs` head is required.
    pub fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        if !vb.contains_tensor("qa_outputs.weight") {
            return Err(anyhow!(
                "Checkpoint has no question-answering head (qa_outputs); use a QA fine-tuned model"
            ));
        }
        let qa_outputs = linear(config.hidden_size, 2, vb.pp("qa_outputs"))?;

        let encoder_vb = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            vb.pp("bert")
        } else {
            vb.clone()
        };

        let embeddings = BertEmbeddings::load(encoder_vb.pp("embeddings"), config)?;

        let mut layers = Vec::with_capacity(config.num_hidden_layers);
        let layer_vb = encoder_vb.pp("encoder").pp("layer");
        for i in 0..config.num_hidden_layers {
            layers.push(BertLayer::load(layer_vb.pp(i), config)?);
        }

        Ok(Self {
            embeddings,
            layers,
            qa_outputs,
        })
    }

    /// Returns `[batch, seq, 2]` logits: start in channel 0, end in channel 1
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        position_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let mut hidden_states = self
            .embeddings
            .forward(input_ids, token_type_ids, position_ids)?;

        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, attention_mask)?;
        }

        Ok(self.qa_outputs.forward(&hidden_states)?)
    }
}
