use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("API key is missing. Please add your Gemini API key in Settings.")]
    NoCredential,

    #[error("Invalid API configuration ({0}). Please check your API key in Settings.")]
    InvalidEndpoint(String),

    #[error("Could not reach Gemini: {0}")]
    TransportError(String),

    #[error("Gemini API returned an error ({status}): {body}")]
    RemoteRejected { status: u16, body: String },

    #[error("Received an invalid response from the server: {0}")]
    MalformedEnvelope(String),

    #[error("The AI couldn't analyse this meal. Try a clearer photo with better lighting.")]
    UnparseableResponse {
        raw: String,
        cleaned: String,
        reason: String,
    },

    #[error("The AI response is missing the `{0}` field.")]
    MissingField(String),

    #[error("Failed to save meal: {0}")]
    PersistenceFailure(String),

    #[error("Failed to prepare image: {0}")]
    ImageEncoding(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl CoreError {
    /// Short heading shown above the message in the error state.
    pub fn title(&self) -> &'static str {
        match self {
            CoreError::NoCredential => "API Key Required",
            CoreError::InvalidEndpoint(_) => "Configuration Error",
            CoreError::TransportError(_) => "Network Error",
            CoreError::RemoteRejected { .. } => "API Error",
            CoreError::MalformedEnvelope(_)
            | CoreError::UnparseableResponse { .. }
            | CoreError::MissingField(_) => "Analysis Failed",
            CoreError::PersistenceFailure(_) => "Save Failed",
            CoreError::ImageEncoding(_) => "Image Error",
            CoreError::InvalidInput(_) => "Invalid Input",
            CoreError::Cancelled => "Cancelled",
        }
    }
}
