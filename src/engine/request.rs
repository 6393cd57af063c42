//! Synthesis options and the request union built from them
//!
//! Callers hand in loose [`SynthesisOptions`]. The facade turns them into a
//! [`SynthesisRequest`] exactly once, and every engine matches on that.
//!
//! Selection order:
//! 1. non-empty `instruction` → [`SynthesisRequest::Instruction`]
//! 2. `target_language` → [`SynthesisRequest::CrossLingual`]
//! 3. any of emotion, pitch, speed ≠ 1.0, volume ≠ 1.0 → [`SynthesisRequest::FineControl`]
//! 4. otherwise → [`SynthesisRequest::ZeroShot`], carrying `prompt_text`

use std::fmt;

use serde::{Deserialize, Serialize};

use super::control::FineControl;

/// Loose per-call options as accepted at the facade boundary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOptions {
    pub emotion: Option<String>,
    pub speed: Option<f32>,
    pub volume: Option<f32>,
    pub pitch: Option<String>,
    pub instruction: Option<String>,
    pub target_language: Option<String>,
    /// Prompt text for zero-shot cloning
    pub prompt_text: Option<String>,
}

impl SynthesisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(emotion.into());
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_pitch(mut self, pitch: impl Into<String>) -> Self {
        self.pitch = Some(pitch.into());
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_target_language(mut self, language: impl Into<String>) -> Self {
        self.target_language = Some(language.into());
        self
    }

    pub fn with_prompt_text(mut self, prompt_text: impl Into<String>) -> Self {
        self.prompt_text = Some(prompt_text.into());
        self
    }

    /// Speed with the identity default applied
    pub fn speed(&self) -> f32 {
        self.speed.unwrap_or(1.0)
    }

    /// Volume with the identity default applied
    pub fn volume(&self) -> f32 {
        self.volume.unwrap_or(1.0)
    }

    /// Instruction text, ignoring blank strings
    pub fn instruction(&self) -> Option<&str> {
        self.instruction
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    /// Zero-shot prompt text, ignoring blank strings
    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt_text
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    /// Whether any fine-control dimension departs from its identity value
    pub fn has_fine_control(&self) -> bool {
        self.emotion.is_some()
            || self.pitch.is_some()
            || self.speed() != 1.0
            || self.volume() != 1.0
    }
}

/// Mode an engine ran in; doubles as the file-name tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    /// The feature-vector engine's single primitive
    Clone,
    ZeroShot,
    CrossLingual,
    #[serde(rename = "instruct")]
    Instruction,
    FineControl,
}

impl SynthesisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisMode::Clone => "clone",
            SynthesisMode::ZeroShot => "zero_shot",
            SynthesisMode::CrossLingual => "cross_lingual",
            SynthesisMode::Instruction => "instruct",
            SynthesisMode::FineControl => "fine_control",
        }
    }
}

impl fmt::Display for SynthesisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One synthesis request, already resolved to a single mode
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisRequest {
    ZeroShot {
        /// Prompt text; the engine default applies when absent
        prompt_text: Option<String>,
        speed: f32,
    },
    CrossLingual {
        language: String,
        speed: f32,
    },
    Instruction {
        instruction: String,
        speed: f32,
    },
    FineControl(FineControl),
}

impl Default for SynthesisRequest {
    fn default() -> Self {
        SynthesisRequest::ZeroShot {
            prompt_text: None,
            speed: 1.0,
        }
    }
}

impl SynthesisRequest {
    /// Apply the selection order to loose options
    pub fn from_options(options: &SynthesisOptions) -> Self {
        let speed = options.speed();

        if let Some(instruction) = options.instruction() {
            return SynthesisRequest::Instruction {
                instruction: instruction.to_string(),
                speed,
            };
        }

        if let Some(language) = &options.target_language {
            return SynthesisRequest::CrossLingual {
                language: language.clone(),
                speed,
            };
        }

        if options.has_fine_control() {
            return SynthesisRequest::FineControl(FineControl {
                emotion: options.emotion.clone(),
                speed,
                volume: options.volume(),
                pitch: options.pitch.clone(),
            });
        }

        SynthesisRequest::ZeroShot {
            prompt_text: options.prompt_text().map(str::to_string),
            speed,
        }
    }

    /// Mode this request runs in on the cached-identity engine
    pub fn mode(&self) -> SynthesisMode {
        match self {
            SynthesisRequest::ZeroShot { .. } => SynthesisMode::ZeroShot,
            SynthesisRequest::CrossLingual { .. } => SynthesisMode::CrossLingual,
            SynthesisRequest::Instruction { .. } => SynthesisMode::Instruction,
            SynthesisRequest::FineControl(_) => SynthesisMode::FineControl,
        }
    }

    /// Requested speaking rate
    pub fn speed(&self) -> f32 {
        match self {
            SynthesisRequest::ZeroShot { speed, .. }
            | SynthesisRequest::CrossLingual { speed, .. }
            | SynthesisRequest::Instruction { speed, .. } => *speed,
            SynthesisRequest::FineControl(control) => control.speed,
        }
    }
}
