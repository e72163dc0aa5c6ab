//! Vision encoder view of a [`DTrOCRConfig`]: patch geometry for the image
//! front end.
//!
//! Images are cut into a grid of `patch_size` rectangles; each patch becomes
//! one token. DTrOCR feeds those tokens to the decoder ahead of the text, so
//! both share the decoder's position table.

use candle_core::Shape;

use crate::config::DTrOCRConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct VisionEncoderConfig {
    pub model_id: String,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    /// (height, width)
    pub image_size: (usize, usize),
    /// (height, width)
    pub patch_size: (usize, usize),
    pub num_channels: usize,
    pub layer_norm_eps: f64,
}

impl VisionEncoderConfig {
    pub fn from_dtrocr(cfg: &DTrOCRConfig) -> Self {
        Self {
            model_id: cfg.florence_hf_model.clone(),
            hidden_size: cfg.hidden_size,
            num_hidden_layers: cfg.num_hidden_layers,
            num_attention_heads: cfg.num_attention_heads,
            image_size: cfg.image_size,
            patch_size: cfg.patch_size,
            num_channels: cfg.num_channels,
            layer_norm_eps: cfg.layer_norm_epsilon,
        }
    }

    /// Patches along (height, width).
    pub fn patch_grid(&self) -> Result<(usize, usize), ConfigError> {
        let (image_h, image_w) = self.image_size;
        let (patch_h, patch_w) = self.patch_size;
        Ok((
            patches_along("height", "patch_size.height", image_h, patch_h)?,
            patches_along("width", "patch_size.width", image_w, patch_w)?,
        ))
    }

    pub fn num_patches(&self) -> Result<usize, ConfigError> {
        let (rows, cols) = self.patch_grid()?;
        rows.checked_mul(cols).ok_or(ConfigError::Overflow {
            field: "num_patches",
        })
    }

    /// Length of one flattened patch: `channels * patch_h * patch_w`.
    pub fn patch_dim(&self) -> Result<usize, ConfigError> {
        self.num_channels
            .checked_mul(self.patch_size.0)
            .and_then(|n| n.checked_mul(self.patch_size.1))
            .ok_or(ConfigError::Overflow { field: "patch_dim" })
    }

    /// Shape of a `pixel_values` batch: [batch, channels, height, width].
    pub fn pixel_values_shape(&self, batch_size: usize) -> Shape {
        Shape::from((
            batch_size,
            self.num_channels,
            self.image_size.0,
            self.image_size.1,
        ))
    }

    /// Text positions left once the patch tokens have taken their share of
    /// `max_position_embeddings`. `None` if the patches alone overflow it.
    pub fn max_text_tokens(
        &self,
        max_position_embeddings: usize,
    ) -> Result<Option<usize>, ConfigError> {
        let num_patches = self.num_patches()?;
        let remaining = max_position_embeddings.checked_sub(num_patches);
        if remaining.is_none() {
            tracing::warn!(
                num_patches,
                max_position_embeddings,
                "patch grid exceeds the position table"
            );
        }
        Ok(remaining)
    }
}

fn patches_along(
    axis: &'static str,
    field: &'static str,
    image: usize,
    patch: usize,
) -> Result<usize, ConfigError> {
    if patch == 0 {
        return Err(ConfigError::ZeroDimension { field });
    }
    if image % patch != 0 {
        return Err(ConfigError::IndivisiblePatch { axis, image, patch });
    }
    Ok(image / patch)
}

impl DTrOCRConfig {
    /// Text tokens that fit beside the image prefix; see
    /// [`VisionEncoderConfig::max_text_tokens`].
    pub fn max_text_tokens(&self) -> Result<Option<usize>, ConfigError> {
        self.encoder_config()
            .max_text_tokens(self.max_position_embeddings)
    }
}
