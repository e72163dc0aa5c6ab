use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown attention implementation: {0}")]
    UnknownAttnImplementation(String),

    #[error("{field} must be greater than zero")]
    ZeroDimension { field: &'static str },

    #[error("hidden_size ({hidden_size}) is not divisible by num_heads ({num_heads})")]
    IndivisibleHeads { hidden_size: usize, num_heads: usize },

    #[error("image {axis} ({image}) is not a multiple of patch {axis} ({patch})")]
    IndivisiblePatch {
        axis: &'static str,
        image: usize,
        patch: usize,
    },

    #[error("{field} overflows usize")]
    Overflow { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_unknown_attn_implementation() {
        let e = ConfigError::UnknownAttnImplementation("eager".into());
        assert_eq!(e.to_string(), "unknown attention implementation: eager");
    }

    #[test]
    fn error_display_zero_dimension() {
        let e = ConfigError::ZeroDimension {
            field: "num_attention_heads",
        };
        assert_eq!(e.to_string(), "num_attention_heads must be greater than zero");
    }

    #[test]
    fn error_display_indivisible_heads() {
        let e = ConfigError::IndivisibleHeads {
            hidden_size: 100,
            num_heads: 16,
        };
        assert_eq!(
            e.to_string(),
            "hidden_size (100) is not divisible by num_heads (16)"
        );
    }

    #[test]
    fn error_display_indivisible_patch() {
        let e = ConfigError::IndivisiblePatch {
            axis: "width",
            image: 130,
            patch: 8,
        };
        assert_eq!(
            e.to_string(),
            "image width (130) is not a multiple of patch width (8)"
        );
    }

    #[test]
    fn error_display_overflow() {
        let e = ConfigError::Overflow {
            field: "num_patches",
        };
        assert_eq!(e.to_string(), "num_patches overflows usize");
    }
}
