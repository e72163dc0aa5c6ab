//! HuggingFace `config.json` schema read by decoder construction.
//!
//! GPT-2 checkpoints spell their sizes `n_embd` / `n_head` / `n_layer` /
//! `n_positions`; the aliases below accept those alongside the generic names.
//! Keys the schema does not name land in `extra`.
//!
//! The core sizes are required. Shape fields GPT-2 never writes
//! (`num_key_value_heads`, `intermediate_size`, `head_dim`) are derived from
//! the sizes that were read when absent.

use serde::Deserialize;

use crate::decoder::default_n_inner;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawModelConfig")]
pub struct ModelConfig {
    pub architectures: Vec<String>,
    pub model_type: Option<String>,
    pub hidden_size: usize,
    pub num_attention_heads: usize,
    pub num_key_value_heads: usize,
    pub num_hidden_layers: usize,
    pub intermediate_size: usize,
    pub vocab_size: usize,
    pub max_position_embeddings: usize,
    pub head_dim: usize,
    pub hidden_act: String,
    pub layer_norm_epsilon: f64,
    pub tie_word_embeddings: bool,
    pub bos_token_id: u32,
    pub eos_token_id: u32,
    pub sliding_window: Option<usize>,
    pub attention_bias: Option<bool>,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `config.json` as written, before the derived shape fields are filled in.
#[derive(Deserialize)]
struct RawModelConfig {
    #[serde(default)]
    architectures: Vec<String>,
    #[serde(default)]
    model_type: Option<String>,
    #[serde(alias = "n_embd")]
    hidden_size: usize,
    #[serde(alias = "n_head")]
    num_attention_heads: usize,
    #[serde(default)]
    num_key_value_heads: Option<usize>,
    #[serde(alias = "n_layer")]
    num_hidden_layers: usize,
    #[serde(default)]
    intermediate_size: Option<usize>,
    vocab_size: usize,
    #[serde(alias = "n_positions")]
    max_position_embeddings: usize,
    #[serde(default)]
    head_dim: Option<usize>,
    #[serde(alias = "activation_function", default = "default_hidden_act")]
    hidden_act: String,
    #[serde(default = "default_layer_norm_epsilon")]
    layer_norm_epsilon: f64,
    #[serde(default = "default_tie_word_embeddings")]
    tie_word_embeddings: bool,
    #[serde(default = "default_gpt2_special_token")]
    bos_token_id: u32,
    #[serde(default = "default_gpt2_special_token")]
    eos_token_id: u32,
    #[serde(default)]
    sliding_window: Option<usize>,
    #[serde(default)]
    attention_bias: Option<bool>,

    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

fn default_hidden_act() -> String {
    "gelu_new".to_string()
}

fn default_layer_norm_epsilon() -> f64 {
    1e-5
}

fn default_tie_word_embeddings() -> bool {
    true
}

fn default_gpt2_special_token() -> u32 {
    50256
}

impl From<RawModelConfig> for ModelConfig {
    fn from(raw: RawModelConfig) -> Self {
        // GPT-2 writes `n_inner` (often null) instead of `intermediate_size`.
        let intermediate_size = raw.intermediate_size.unwrap_or_else(|| {
            raw.extra
                .get("n_inner")
                .and_then(|v| v.as_u64())
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or_else(|| default_n_inner(raw.hidden_size))
        });
        let head_dim = raw.head_dim.unwrap_or_else(|| {
            raw.hidden_size
                .checked_div(raw.num_attention_heads)
                .unwrap_or(0)
        });

        Self {
            architectures: raw.architectures,
            model_type: raw.model_type,
            hidden_size: raw.hidden_size,
            num_attention_heads: raw.num_attention_heads,
            // MHA unless the checkpoint says otherwise
            num_key_value_heads: raw.num_key_value_heads.unwrap_or(raw.num_attention_heads),
            num_hidden_layers: raw.num_hidden_layers,
            intermediate_size,
            vocab_size: raw.vocab_size,
            max_position_embeddings: raw.max_position_embeddings,
            head_dim,
            hidden_act: raw.hidden_act,
            layer_norm_epsilon: raw.layer_norm_epsilon,
            tie_word_embeddings: raw.tie_word_embeddings,
            bos_token_id: raw.bos_token_id,
            eos_token_id: raw.eos_token_id,
            sliding_window: raw.sliding_window,
            attention_bias: raw.attention_bias,
            extra: raw.extra,
        }
    }
}

impl Default for ModelConfig {
    /// GPT-2 small (124M).
    fn default() -> Self {
        Self {
            architectures: vec!["GPT2LMHeadModel".to_string()],
            model_type: Some("gpt2".to_string()),
            hidden_size: 768,
            num_attention_heads: 12,
            num_key_value_heads: 12,
            num_hidden_layers: 12,
            intermediate_size: 3072,
            vocab_size: 50257,
            max_position_embeddings: 1024,
            head_dim: 64,
            hidden_act: "gelu_new".to_string(),
            layer_norm_epsilon: 1e-5,
            tie_word_embeddings: true,
            bos_token_id: 50256,
            eos_token_id: 50256,
            sliding_window: None,
            attention_bias: Some(true),
            extra: serde_json::Map::new(),
        }
    }
}

impl ModelConfig {
    /// First entry of `architectures`, if any.
    pub fn architecture(&self) -> Option<&str> {
        self.architectures.first().map(String::as_str)
    }
}
