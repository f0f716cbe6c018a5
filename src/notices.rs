use serde::Deserialize;

/// Lifecycle notice from the external voice-capture capability.
///
/// Only `Transcript` carries text the workspace acts on; the rest are
/// informational and end up in the event log.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoiceNotice {
    ListeningStarted,
    Transcript { text: String },
    Error { code: String },
    Ended,
}

impl VoiceNotice {
    pub fn message(&self) -> String {
        match self {
            VoiceNotice::ListeningStarted => "Voice capture listening".to_string(),
            VoiceNotice::Transcript { text } => format!("Voice transcript received: {text}"),
            VoiceNotice::Error { code } => format!("Voice recognition error: {code}"),
            VoiceNotice::Ended => "Voice capture ended".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    OfflineCache,
    Clipboard,
    Storage,
    SpeechRecognition,
}

impl Capability {
    fn label(&self) -> &'static str {
        match self {
            Capability::OfflineCache => "Offline cache",
            Capability::Clipboard => "Clipboard",
            Capability::Storage => "Draft storage",
            Capability::SpeechRecognition => "Speech recognition",
        }
    }
}

/// Success/failure report from an external collaborator (offline cache,
/// clipboard, storage). Never affects run state; only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct CapabilityNotice {
    pub capability: Capability,
    pub ok: bool,
    pub detail: Option<String>,
}

impl CapabilityNotice {
    pub fn message(&self) -> String {
        let label = self.capability.label();
        match (self.ok, self.detail.as_deref()) {
            (true, None) => format!("{label} ready"),
            (true, Some(detail)) => format!("{label} ready: {detail}"),
            (false, None) => format!("{label} unavailable"),
            (false, Some(detail)) => format!("{label} unavailable: {detail}"),
        }
    }
}
