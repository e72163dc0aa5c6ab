use crate::config::DTrOCRConfig;

/// Square-image config: 64 hidden, 2 layers, 4 heads, 32x32 image in 8x8
/// patches (16 patch tokens, 48 text positions).
pub fn tiny_dtrocr_config() -> DTrOCRConfig {
    DTrOCRConfig {
        vocab_size: 256,
        max_position_embeddings: 64,
        hidden_size: 64,
        num_hidden_layers: 2,
        num_attention_heads: 4,
        patch_size: (8, 8),
        image_size: (32, 32),
        ..DTrOCRConfig::default()
    }
}

/// Text-line config: a wide 16x64 grayscale strip in 4x8 patches
/// (32 patch tokens, 32 text positions).
pub fn tiny_text_line_config() -> DTrOCRConfig {
    DTrOCRConfig {
        patch_size: (4, 8),
        image_size: (16, 64),
        num_channels: 1,
        ..tiny_dtrocr_config()
    }
}
