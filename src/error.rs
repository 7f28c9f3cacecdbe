//! Error types for scene construction and the blessing service.

use crate::instance::LayerKind;

/// Precondition violations detected while building the scene.
///
/// None of these can occur once a [`crate::tree::TreeScene`] exists; the
/// per-frame path is total.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// A spiral or volume layer was configured with no elements.
    #[error("layer {layer} must contain at least one element")]
    EmptyLayer { layer: LayerKind },

    /// Scale range with min greater than max.
    #[error("layer {layer} has an inverted scale range [{min}, {max}]")]
    InvertedScaleRange { layer: LayerKind, min: f32, max: f32 },

    /// Negative or non-finite radius/height.
    #[error("layer {layer} has an invalid {what}: {value}")]
    InvalidDimension {
        layer: LayerKind,
        what: &'static str,
        value: f32,
    },

    /// Morph rates must be strictly positive or the layer never moves.
    #[error("layer {layer} has a non-positive morph rate: {rate}")]
    InvalidMorphRate { layer: LayerKind, rate: f32 },
}

/// Failures inside the blessing request flow.
///
/// These never escape [`crate::blessing::BlessingClient::request_blessing`];
/// they are logged and replaced by the fallback blessing.
#[derive(Debug, thiserror::Error)]
pub enum BlessingError {
    /// No API key in `API_KEY` / `GEMINI_API_KEY`.
    #[error("API key is missing (set API_KEY or GEMINI_API_KEY)")]
    MissingApiKey,

    /// Connection, TLS or body-read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// The service answered but carried no text.
    #[error("no response text from the service")]
    EmptyResponse,

    /// Response text was not a `{message, mood}` object.
    #[error("malformed blessing JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}
