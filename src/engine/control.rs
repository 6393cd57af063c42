//! Delivery control vocabulary for the cached-identity engine
//!
//! Language tags prefix cross-lingual text. Fine-control dimensions
//! (emotion, speed, volume, pitch) compile into one instruction sentence.

use crate::END_OF_PROMPT;

/// Language code to inline tag. Unknown codes use the first entry.
pub const LANGUAGE_TAGS: [(&str, &str); 10] = [
    ("zh", "<|zh|>"),
    ("en", "<|en|>"),
    ("jp", "<|jp|>"),
    ("ko", "<|ko|>"),
    ("yue", "<|yue|>"),
    ("de", "<|de|>"),
    ("es", "<|es|>"),
    ("fr", "<|fr|>"),
    ("it", "<|it|>"),
    ("ru", "<|ru|>"),
];

/// Tag for a language code, falling back to `zh`
pub fn language_tag(code: &str) -> &'static str {
    let code = code.trim().to_ascii_lowercase();
    LANGUAGE_TAGS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, tag)| *tag)
        .unwrap_or(LANGUAGE_TAGS[0].1)
}

/// Whether `code` has its own tag
pub fn is_supported_language(code: &str) -> bool {
    let code = code.trim().to_ascii_lowercase();
    LANGUAGE_TAGS.iter().any(|(c, _)| *c == code)
}

/// Prefix `text` with the tag for `code`
pub fn tag_text(code: &str, text: &str) -> String {
    format!("{}{}", language_tag(code), text)
}

/// Append the end-of-prompt marker unless already present
pub fn ensure_end_marker(prompt: &str) -> String {
    if prompt.ends_with(END_OF_PROMPT) {
        prompt.to_string()
    } else {
        format!("{}{}", prompt, END_OF_PROMPT)
    }
}

/// Emotion descriptors understood by fine-control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emotion {
    Sad,
    Happy,
    Angry,
    Excited,
    Calm,
    Whisper,
    Shouting,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Sad,
        Emotion::Happy,
        Emotion::Angry,
        Emotion::Excited,
        Emotion::Calm,
        Emotion::Whisper,
        Emotion::Shouting,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sad" => Some(Emotion::Sad),
            "happy" => Some(Emotion::Happy),
            "angry" => Some(Emotion::Angry),
            "excited" => Some(Emotion::Excited),
            "calm" => Some(Emotion::Calm),
            "whisper" => Some(Emotion::Whisper),
            "shouting" => Some(Emotion::Shouting),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Emotion::Sad => "sad",
            Emotion::Happy => "happy",
            Emotion::Angry => "angry",
            Emotion::Excited => "excited",
            Emotion::Calm => "calm",
            Emotion::Whisper => "whisper",
            Emotion::Shouting => "shouting",
        }
    }

    /// Instruction phrase for this emotion
    pub fn phrase(&self) -> &'static str {
        match self {
            Emotion::Sad => "请用悲伤的语气",
            Emotion::Happy => "请用开心的语气",
            Emotion::Angry => "请用愤怒的语气",
            Emotion::Excited => "请用兴奋的语气",
            Emotion::Calm => "请用平静的语气",
            Emotion::Whisper => "请用耳语的方式",
            Emotion::Shouting => "请用大声喊的方式",
        }
    }
}

/// Pitch descriptors understood by fine-control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pitch {
    High,
    Low,
    Normal,
}

impl Pitch {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Pitch::High),
            "low" => Some(Pitch::Low),
            "normal" => Some(Pitch::Normal),
            _ => None,
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Pitch::High => "请用高一些的音调",
            Pitch::Low => "请用低一些的音调",
            Pitch::Normal => "请用正常的音调",
        }
    }
}

const SLOWER: &str = "请用慢一些的语速";
const LOUDER: &str = "请用大一些的音量";
const QUIETER: &str = "请用小一些的音量";
const SENTENCE_END: &str = "。";

/// Structured delivery parameters
///
/// `emotion` and `pitch` stay as the caller's raw strings; values outside
/// the vocabulary contribute nothing to the compiled sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct FineControl {
    pub emotion: Option<String>,
    pub speed: f32,
    pub volume: f32,
    pub pitch: Option<String>,
}

impl Default for FineControl {
    fn default() -> Self {
        Self {
            emotion: None,
            speed: 1.0,
            volume: 1.0,
            pitch: None,
        }
    }
}

impl FineControl {
    /// Recognized phrases in emotion, speed, volume, pitch order
    pub fn phrases(&self) -> Vec<String> {
        let mut parts = Vec::with_capacity(4);

        if let Some(emotion) = self.emotion.as_deref().and_then(Emotion::from_name) {
            parts.push(emotion.phrase().to_string());
        }

        if self.speed > 1.0 {
            parts.push(format!("请用{:.1}倍的语速", self.speed));
        } else if self.speed < 1.0 {
            parts.push(SLOWER.to_string());
        }

        if self.volume > 1.0 {
            parts.push(LOUDER.to_string());
        } else if self.volume < 1.0 {
            parts.push(QUIETER.to_string());
        }

        if let Some(pitch) = self.pitch.as_deref().and_then(Pitch::from_name) {
            parts.push(pitch.phrase().to_string());
        }

        parts
    }

    /// One instruction sentence terminated by the end-of-prompt marker
    pub fn compile(&self) -> String {
        format!("{}{}{}", self.phrases().join(" "), SENTENCE_END, END_OF_PROMPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tags() {
        assert_eq!(language_tag("fr"), "<|fr|>");
        assert_eq!(language_tag(" YUE "), "<|yue|>");
        assert_eq!(language_tag("xx"), "<|zh|>");
        assert_eq!(tag_text("en", "hello"), "<|en|>hello");
        assert!(is_supported_language("ko"));
        assert!(!is_supported_language("pt"));
    }

    #[test]
    fn test_end_marker_not_duplicated() {
        assert_eq!(ensure_end_marker("Be calm"), "Be calm<|endofprompt|>");
        assert_eq!(
            ensure_end_marker("Be calm<|endofprompt|>"),
            "Be calm<|endofprompt|>"
        );
    }

    #[test]
    fn test_happy_at_identity_speed() {
        let control = FineControl {
            emotion: Some("happy".to_string()),
            ..Default::default()
        };
        assert_eq!(control.phrases(), vec!["请用开心的语气".to_string()]);
        assert_eq!(control.compile(), "请用开心的语气。<|endofprompt|>");
    }

    #[test]
    fn test_all_dimensions_in_order() {
        let control = FineControl {
            emotion: Some("sad".to_string()),
            speed: 1.5,
            volume: 0.5,
            pitch: Some("high".to_string()),
        };
        assert_eq!(
            control.compile(),
            "请用悲伤的语气 请用1.5倍的语速 请用小一些的音量 请用高一些的音调。<|endofprompt|>"
        );
    }

    #[test]
    fn test_unrecognized_values_dropped() {
        let control = FineControl {
            emotion: Some("melancholic".to_string()),
            speed: 0.8,
            volume: 1.0,
            pitch: Some("squeaky".to_string()),
        };
        assert_eq!(control.phrases(), vec![SLOWER.to_string()]);
    }

    #[test]
    fn test_empty_control_still_terminated() {
        assert_eq!(FineControl::default().compile(), "。<|endofprompt|>");
    }

    #[test]
    fn test_emotion_vocabulary_roundtrip() {
        for emotion in Emotion::ALL {
            assert_eq!(Emotion::from_name(emotion.name()), Some(emotion));
        }
    }
}
