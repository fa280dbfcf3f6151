/// Failures while capturing or transcribing an utterance.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The recognizer returned no transcription for the audio.
    #[error("speech could not be understood")]
    UnrecognizedSpeech,

    /// The recognition service failed or could not be reached.
    #[error("{0}")]
    Service(String),

    /// The captured audio could not be stored or decoded.
    #[error("audio error: {0}")]
    Audio(String),
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        SpeechError::Service(err.to_string())
    }
}

impl From<hound::Error> for SpeechError {
    fn from(err: hound::Error) -> Self {
        SpeechError::Audio(err.to_string())
    }
}

impl From<std::io::Error> for SpeechError {
    fn from(err: std::io::Error) -> Self {
        SpeechError::Audio(err.to_string())
    }
}
