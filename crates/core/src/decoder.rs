//! GPT-2 decoder view of a [`DTrOCRConfig`].
//!
//! The decoder sees the same hidden size, depth and head count as the rest of
//! the model; the GPT-2 specific pieces (MLP width, activation, attention
//! scaling) come from the fixed fields of the record.

use candle_nn::Activation;

use crate::config::{AttnImplementation, DTrOCRConfig};
use crate::error::ConfigError;
use crate::hf_config::ModelConfig;

const GPT2_ARCHITECTURE: &str = "GPT2LMHeadModel";

/// GPT-2's MLP width when `n_inner` is unset: `4 * hidden_size`, saturating
/// at `usize::MAX`.
pub fn default_n_inner(hidden_size: usize) -> usize {
    hidden_size.checked_mul(4).unwrap_or_else(|| {
        tracing::warn!(hidden_size, "4 * hidden_size overflows, saturating n_inner");
        usize::MAX
    })
}

/// Map an HF `activation_function` name onto a candle activation.
pub fn parse_activation(name: &str) -> Activation {
    match name {
        "gelu_new" => Activation::NewGelu,
        "gelu" => Activation::Gelu,
        "relu" => Activation::Relu,
        "silu" | "swish" => Activation::Silu,
        other => {
            tracing::warn!(activation = other, "unrecognised activation, using gelu_new");
            Activation::NewGelu
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gpt2DecoderConfig {
    pub model_id: String,
    pub vocab_size: usize,
    pub n_positions: usize,
    pub n_embd: usize,
    pub n_layer: usize,
    pub n_head: usize,
    /// Resolved MLP width.
    pub n_inner: usize,
    pub activation_function: String,
    pub activation: Activation,
    pub resid_pdrop: f32,
    pub embd_pdrop: f32,
    pub attn_pdrop: f32,
    pub layer_norm_epsilon: f64,
    pub scale_attn_weights: bool,
    pub scale_attn_by_inverse_layer_idx: bool,
    pub reorder_and_upcast_attn: bool,
    pub add_cross_attention: bool,
    pub attn_implementation: AttnImplementation,
}

impl Gpt2DecoderConfig {
    pub fn from_dtrocr(cfg: &DTrOCRConfig) -> Self {
        let n_inner = cfg.n_inner().unwrap_or_else(|| {
            let n_inner = default_n_inner(cfg.hidden_size);
            tracing::debug!(n_inner, "n_inner unset, using 4 * hidden_size");
            n_inner
        });

        Self {
            model_id: cfg.gpt2_hf_model.clone(),
            vocab_size: cfg.vocab_size,
            n_positions: cfg.max_position_embeddings,
            n_embd: cfg.hidden_size,
            n_layer: cfg.num_hidden_layers,
            n_head: cfg.num_attention_heads,
            n_inner,
            activation_function: cfg.activation_function().to_string(),
            activation: parse_activation(cfg.activation_function()),
            resid_pdrop: cfg.resid_pdrop,
            embd_pdrop: cfg.embd_pdrop,
            attn_pdrop: cfg.attn_pdrop,
            layer_norm_epsilon: cfg.layer_norm_epsilon,
            scale_attn_weights: cfg.scale_attn_weights(),
            scale_attn_by_inverse_layer_idx: cfg.scale_attn_by_inverse_layer_idx(),
            reorder_and_upcast_attn: cfg.reorder_and_upcast_attn(),
            add_cross_attention: cfg.add_cross_attention(),
            attn_implementation: cfg.attn_implementation,
        }
    }

    /// Read the decoder shape back out of an HF `config.json`.
    ///
    /// GPT-2 keeps its specific fields outside the generic schema, so they are
    /// looked up in `extra` with GPT-2's own defaults. An explicit `n_inner`
    /// wins over `intermediate_size`.
    pub fn from_model_config(model_id: impl Into<String>, cfg: &ModelConfig) -> Self {
        let get_f64 = |key: &str, default: f64| {
            cfg.extra
                .get(key)
                .and_then(|v| v.as_f64())
                .unwrap_or(default)
        };
        let get_bool = |key: &str, default: bool| {
            cfg.extra
                .get(key)
                .and_then(|v| v.as_bool())
                .unwrap_or(default)
        };

        let n_inner = cfg
            .extra
            .get("n_inner")
            .and_then(|v| v.as_u64())
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(cfg.intermediate_size);

        let attn_implementation = match cfg
            .extra
            .get("attn_implementation")
            .and_then(|v| v.as_str())
        {
            Some(name) => name.parse::<AttnImplementation>().unwrap_or_else(|e: ConfigError| {
                tracing::warn!(error = %e, "falling back to sdpa");
                AttnImplementation::default()
            }),
            None => AttnImplementation::default(),
        };

        Self {
            model_id: model_id.into(),
            vocab_size: cfg.vocab_size,
            n_positions: cfg.max_position_embeddings,
            n_embd: cfg.hidden_size,
            n_layer: cfg.num_hidden_layers,
            n_head: cfg.num_attention_heads,
            n_inner,
            activation_function: cfg.hidden_act.clone(),
            activation: parse_activation(&cfg.hidden_act),
            resid_pdrop: get_f64("resid_pdrop", 0.1) as f32,
            embd_pdrop: get_f64("embd_pdrop", 0.1) as f32,
            attn_pdrop: get_f64("attn_pdrop", 0.1) as f32,
            layer_norm_epsilon: cfg.layer_norm_epsilon,
            scale_attn_weights: get_bool("scale_attn_weights", true),
            scale_attn_by_inverse_layer_idx: get_bool("scale_attn_by_inverse_layer_idx", false),
            reorder_and_upcast_attn: get_bool("reorder_and_upcast_attn", false),
            add_cross_attention: get_bool("add_cross_attention", false),
            attn_implementation,
        }
    }

    pub fn head_dim(&self) -> Result<usize, ConfigError> {
        if self.n_head == 0 {
            return Err(ConfigError::ZeroDimension {
                field: "num_attention_heads",
            });
        }
        if self.n_embd % self.n_head != 0 {
            return Err(ConfigError::IndivisibleHeads {
                hidden_size: self.n_embd,
                num_heads: self.n_head,
            });
        }
        Ok(self.n_embd / self.n_head)
    }

    /// Multiplier applied to `q @ k^T` in block `layer_idx` (0-based).
    pub fn attn_scale(&self, layer_idx: usize) -> Result<f64, ConfigError> {
        let head_dim = self.head_dim()?;
        let mut scale = 1.0;
        if self.scale_attn_weights {
            scale /= (head_dim as f64).sqrt();
        }
        if self.scale_attn_by_inverse_layer_idx {
            scale /= layer_idx as f64 + 1.0;
        }
        Ok(scale)
    }

    /// Lower into the HF schema consumed by GPT-2 construction.
    ///
    /// Never fails: an uncomputable head dimension is written as 0 and left
    /// for model construction to reject.
    pub fn to_model_config(&self) -> ModelConfig {
        let head_dim = self.head_dim().unwrap_or(0);
        tracing::debug!(
            model = %self.model_id,
            hidden_size = self.n_embd,
            num_layers = self.n_layer,
            num_heads = self.n_head,
            head_dim,
            "lowering decoder config"
        );

        let mut extra = serde_json::Map::new();
        extra.insert("n_inner".into(), self.n_inner.into());
        extra.insert("resid_pdrop".into(), f64::from(self.resid_pdrop).into());
        extra.insert("embd_pdrop".into(), f64::from(self.embd_pdrop).into());
        extra.insert("attn_pdrop".into(), f64::from(self.attn_pdrop).into());
        extra.insert("scale_attn_weights".into(), self.scale_attn_weights.into());
        extra.insert(
            "scale_attn_by_inverse_layer_idx".into(),
            self.scale_attn_by_inverse_layer_idx.into(),
        );
        extra.insert(
            "reorder_and_upcast_attn".into(),
            self.reorder_and_upcast_attn.into(),
        );
        extra.insert("add_cross_attention".into(), self.add_cross_attention.into());
        extra.insert(
            "attn_implementation".into(),
            self.attn_implementation.as_str().into(),
        );

        ModelConfig {
            architectures: vec![GPT2_ARCHITECTURE.to_string()],
            model_type: Some("gpt2".to_string()),
            hidden_size: self.n_embd,
            num_attention_heads: self.n_head,
            // GPT-2 is MHA
            num_key_value_heads: self.n_head,
            num_hidden_layers: self.n_layer,
            intermediate_size: self.n_inner,
            vocab_size: self.vocab_size,
            max_position_embeddings: self.n_positions,
            head_dim,
            hidden_act: self.activation_function.clone(),
            layer_norm_epsilon: self.layer_norm_epsilon,
            attention_bias: Some(true),
            extra,
            ..ModelConfig::default()
        }
    }
}
