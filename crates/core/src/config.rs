//! Hyperparameter record for DTrOCR.
//!
//! DTrOCR pairs a Florence-2 vision encoder with a GPT-2 decoder. The record
//! below holds every knob model assembly reads to size embedding tables,
//! attention heads, positional encodings and the patch embedding. It is a
//! plain value: building one never fails and never validates, so nonsensical
//! values surface only where a consumer (see [`crate::decoder`] and
//! [`crate::encoder`]) derives something from them.

use std::fmt;
use std::str::FromStr;

use crate::decoder::Gpt2DecoderConfig;
use crate::encoder::VisionEncoderConfig;
use crate::error::ConfigError;

pub const DEFAULT_GPT2_HF_MODEL: &str = "openai-community/gpt2";
pub const DEFAULT_FLORENCE_HF_MODEL: &str = "microsoft/Florence-2-large";

// ─── Attention kernel ────────────────────────────────────────────────────────

/// Scaled dot-product attention kernel requested for the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttnImplementation {
    /// PyTorch-style fused scaled dot-product attention.
    #[default]
    Sdpa,
    /// FlashAttention-2 kernels.
    FlashAttention2,
}

impl AttnImplementation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sdpa => "sdpa",
            Self::FlashAttention2 => "flash_attention_2",
        }
    }

    pub fn is_flash(&self) -> bool {
        matches!(self, Self::FlashAttention2)
    }
}

impl fmt::Display for AttnImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttnImplementation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sdpa" => Ok(Self::Sdpa),
            "flash_attention_2" => Ok(Self::FlashAttention2),
            other => Err(ConfigError::UnknownAttnImplementation(other.to_string())),
        }
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// DTrOCR model configuration.
///
/// Defaults describe the `openai-community/gpt2` decoder paired with
/// `microsoft/Florence-2-large`. Override any field with struct update syntax
/// or the `with_*` setters:
///
/// ```
/// use dtrocr_core::config::DTrOCRConfig;
///
/// let cfg = DTrOCRConfig::new()
///     .with_image_size((32, 128))
///     .with_patch_size((4, 8));
/// assert_eq!(cfg.hidden_size, 768);
/// ```
///
/// The GPT-2 behaviour flags (`n_inner`, attention scaling, activation, ...)
/// are constants of the architecture and are only readable through
/// accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct DTrOCRConfig {
    /// Pretrained decoder checkpoint.
    pub gpt2_hf_model: String,
    /// Pretrained vision encoder checkpoint.
    pub florence_hf_model: String,
    pub vocab_size: usize,
    pub max_position_embeddings: usize,
    /// Channel width shared by the encoder output and the decoder.
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    /// (height, width)
    pub patch_size: (usize, usize),
    /// (height, width)
    pub image_size: (usize, usize),
    pub num_channels: usize,
    pub resid_pdrop: f32,
    pub embd_pdrop: f32,
    pub attn_pdrop: f32,
    pub layer_norm_epsilon: f64,
    pub attn_implementation: AttnImplementation,
}

impl Default for DTrOCRConfig {
    fn default() -> Self {
        Self {
            gpt2_hf_model: DEFAULT_GPT2_HF_MODEL.to_string(),
            florence_hf_model: DEFAULT_FLORENCE_HF_MODEL.to_string(),
            vocab_size: 50257,
            max_position_embeddings: 256,
            hidden_size: 768,
            // Florence-2-large: 24 layers, 16 heads
            num_hidden_layers: 24,
            num_attention_heads: 16,
            patch_size: (16, 16),
            image_size: (768, 768),
            num_channels: 3,
            resid_pdrop: 0.1,
            embd_pdrop: 0.1,
            attn_pdrop: 0.1,
            layer_norm_epsilon: 1e-5,
            attn_implementation: AttnImplementation::Sdpa,
        }
    }
}

impl DTrOCRConfig {
    pub const N_INNER: Option<usize> = None;
    pub const SCALE_ATTN_WEIGHTS: bool = true;
    pub const SCALE_ATTN_BY_INVERSE_LAYER_IDX: bool = false;
    pub const REORDER_AND_UPCAST_ATTN: bool = false;
    pub const ADD_CROSS_ATTENTION: bool = false;
    pub const ACTIVATION_FUNCTION: &'static str = "gelu_new";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gpt2_hf_model(mut self, model: impl Into<String>) -> Self {
        self.gpt2_hf_model = model.into();
        self
    }

    pub fn with_florence_hf_model(mut self, model: impl Into<String>) -> Self {
        self.florence_hf_model = model.into();
        self
    }

    pub fn with_vocab_size(mut self, vocab_size: usize) -> Self {
        self.vocab_size = vocab_size;
        self
    }

    pub fn with_max_position_embeddings(mut self, max_position_embeddings: usize) -> Self {
        self.max_position_embeddings = max_position_embeddings;
        self
    }

    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    pub fn with_num_hidden_layers(mut self, num_hidden_layers: usize) -> Self {
        self.num_hidden_layers = num_hidden_layers;
        self
    }

    pub fn with_num_attention_heads(mut self, num_attention_heads: usize) -> Self {
        self.num_attention_heads = num_attention_heads;
        self
    }

    pub fn with_patch_size(mut self, patch_size: (usize, usize)) -> Self {
        self.patch_size = patch_size;
        self
    }

    pub fn with_image_size(mut self, image_size: (usize, usize)) -> Self {
        self.image_size = image_size;
        self
    }

    pub fn with_num_channels(mut self, num_channels: usize) -> Self {
        self.num_channels = num_channels;
        self
    }

    pub fn with_resid_pdrop(mut self, p: f32) -> Self {
        self.resid_pdrop = p;
        self
    }

    pub fn with_embd_pdrop(mut self, p: f32) -> Self {
        self.embd_pdrop = p;
        self
    }

    pub fn with_attn_pdrop(mut self, p: f32) -> Self {
        self.attn_pdrop = p;
        self
    }

    pub fn with_layer_norm_epsilon(mut self, eps: f64) -> Self {
        self.layer_norm_epsilon = eps;
        self
    }

    pub fn with_attn_implementation(mut self, attn_implementation: AttnImplementation) -> Self {
        self.attn_implementation = attn_implementation;
        self
    }

    /// Decoder MLP width. `None` means GPT-2's `4 * hidden_size`.
    pub fn n_inner(&self) -> Option<usize> {
        Self::N_INNER
    }

    pub fn scale_attn_weights(&self) -> bool {
        Self::SCALE_ATTN_WEIGHTS
    }

    pub fn scale_attn_by_inverse_layer_idx(&self) -> bool {
        Self::SCALE_ATTN_BY_INVERSE_LAYER_IDX
    }

    pub fn reorder_and_upcast_attn(&self) -> bool {
        Self::REORDER_AND_UPCAST_ATTN
    }

    /// Image features enter the decoder as prefix tokens, not through
    /// cross-attention.
    pub fn add_cross_attention(&self) -> bool {
        Self::ADD_CROSS_ATTENTION
    }

    pub fn activation_function(&self) -> &'static str {
        Self::ACTIVATION_FUNCTION
    }

    /// GPT-2 view of this config for decoder construction.
    pub fn decoder_config(&self) -> Gpt2DecoderConfig {
        Gpt2DecoderConfig::from_dtrocr(self)
    }

    /// Vision encoder view of this config for patch embedding construction.
    pub fn encoder_config(&self) -> VisionEncoderConfig {
        VisionEncoderConfig::from_dtrocr(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_gpt2_florence2_large() {
        let cfg = DTrOCRConfig::new();

        assert_eq!(cfg.gpt2_hf_model, "openai-community/gpt2");
        assert_eq!(cfg.florence_hf_model, "microsoft/Florence-2-large");
        assert_eq!(cfg.vocab_size, 50257);
        assert_eq!(cfg.max_position_embeddings, 256);
        assert_eq!(cfg.hidden_size, 768);
        assert_eq!(cfg.num_hidden_layers, 24);
        assert_eq!(cfg.num_attention_heads, 16);
        assert_eq!(cfg.patch_size, (16, 16));
        assert_eq!(cfg.image_size, (768, 768));
        assert_eq!(cfg.num_channels, 3);
        assert_eq!(cfg.resid_pdrop, 0.1);
        assert_eq!(cfg.embd_pdrop, 0.1);
        assert_eq!(cfg.attn_pdrop, 0.1);
        assert_eq!(cfg.layer_norm_epsilon, 1e-5);
        assert_eq!(cfg.attn_implementation, AttnImplementation::Sdpa);
    }

    #[test]
    fn new_equals_default() {
        assert_eq!(DTrOCRConfig::new(), DTrOCRConfig::default());
    }

    #[test]
    fn setters_override_each_field() {
        let cfg = DTrOCRConfig::new()
            .with_gpt2_hf_model("gpt2-medium")
            .with_florence_hf_model("microsoft/Florence-2-base")
            .with_vocab_size(100)
            .with_max_position_embeddings(512)
            .with_hidden_size(1024)
            .with_num_hidden_layers(12)
            .with_num_attention_heads(8)
            .with_patch_size((4, 8))
            .with_image_size((32, 128))
            .with_num_channels(1)
            .with_resid_pdrop(0.0)
            .with_embd_pdrop(0.2)
            .with_attn_pdrop(0.3)
            .with_layer_norm_epsilon(1e-6)
            .with_attn_implementation(AttnImplementation::FlashAttention2);

        assert_eq!(cfg.gpt2_hf_model, "gpt2-medium");
        assert_eq!(cfg.florence_hf_model, "microsoft/Florence-2-base");
        assert_eq!(cfg.vocab_size, 100);
        assert_eq!(cfg.max_position_embeddings, 512);
        assert_eq!(cfg.hidden_size, 1024);
        assert_eq!(cfg.num_hidden_layers, 12);
        assert_eq!(cfg.num_attention_heads, 8);
        assert_eq!(cfg.patch_size, (4, 8));
        assert_eq!(cfg.image_size, (32, 128));
        assert_eq!(cfg.num_channels, 1);
        assert_eq!(cfg.resid_pdrop, 0.0);
        assert_eq!(cfg.embd_pdrop, 0.2);
        assert_eq!(cfg.attn_pdrop, 0.3);
        assert_eq!(cfg.layer_norm_epsilon, 1e-6);
        assert_eq!(cfg.attn_implementation, AttnImplementation::FlashAttention2);
    }

    #[test]
    fn struct_update_keeps_remaining_defaults() {
        let cfg = DTrOCRConfig {
            hidden_size: 512,
            ..Default::default()
        };
        assert_eq!(cfg.hidden_size, 512);
        assert_eq!(cfg.num_attention_heads, 16);
        assert_eq!(cfg.image_size, (768, 768));
    }

    #[test]
    fn nonsensical_values_are_accepted() {
        let cfg = DTrOCRConfig::new()
            .with_hidden_size(0)
            .with_num_attention_heads(0)
            .with_patch_size((0, 0))
            .with_resid_pdrop(1.5)
            .with_layer_norm_epsilon(-1.0);

        assert_eq!(cfg.hidden_size, 0);
        assert_eq!(cfg.num_attention_heads, 0);
        assert_eq!(cfg.patch_size, (0, 0));
        assert_eq!(cfg.resid_pdrop, 1.5);
        assert_eq!(cfg.layer_norm_epsilon, -1.0);
    }

    #[test]
    fn fixed_fields_ignore_overrides() {
        let cfg = DTrOCRConfig::new()
            .with_hidden_size(64)
            .with_num_hidden_layers(1)
            .with_attn_implementation(AttnImplementation::FlashAttention2);

        for c in [DTrOCRConfig::new(), cfg] {
            assert_eq!(c.n_inner(), None);
            assert!(c.scale_attn_weights());
            assert!(!c.scale_attn_by_inverse_layer_idx());
            assert!(!c.reorder_and_upcast_attn());
            assert!(!c.add_cross_attention());
            assert_eq!(c.activation_function(), "gelu_new");
        }
    }

    #[test]
    fn attn_implementation_string_forms() {
        for imp in [AttnImplementation::Sdpa, AttnImplementation::FlashAttention2] {
            assert_eq!(imp.as_str().parse::<AttnImplementation>().unwrap(), imp);
            assert_eq!(imp.to_string(), imp.as_str());
        }
        assert!(AttnImplementation::FlashAttention2.is_flash());
        assert!(!AttnImplementation::default().is_flash());
    }

    #[test]
    fn unknown_attn_implementation_is_rejected() {
        let err = "eager".parse::<AttnImplementation>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownAttnImplementation(ref s) if s == "eager"));
    }
}
