//! Summary profile and credential configuration.
//!
//! A `SummaryProfile` captures everything that differs between deployments of the
//! summarizer: the system instruction, model identifier, truncation threshold,
//! token budget, and whether the raw article export is offered. Values are
//! resolved once at startup and passed explicitly to the orchestrator.

use std::fmt;
use std::ops::RangeInclusive;

use thiserror::Error;

/// Environment variable holding the generation backend API key.
pub const CREDENTIAL_VAR: &str = "GROQ_API_KEY";

/// Default model identifier for the generation backend.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Default system instruction sent ahead of the article body.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are MEDHA, a sophisticated AI. Summarize the provided text in 5-7 clear, professional bullet points. Be concise but deep. Do not use conversational filler.";

/// Default maximum number of article characters forwarded to generation.
pub const DEFAULT_TRUNCATION_LENGTH: usize = 6000;

/// Default generation token budget.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 600;

/// Accepted truncation lengths, in characters.
pub const TRUNCATION_LENGTH_RANGE: RangeInclusive<usize> = 5000..=6000;

/// Accepted generation token budgets.
pub const MAX_OUTPUT_TOKENS_RANGE: RangeInclusive<u32> = 500..=600;

/// Sampling temperature used for every summary.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The credential is absent from the environment and `.env` file
    #[error("'GROQ_API_KEY' not found in environment or .env file")]
    CredentialMissing,

    /// An environment override or builder value could not be used
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// How the generation credential is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialMode {
    /// Read once from the environment at startup; absence is fatal.
    #[default]
    Store,
    /// Entered by the user per session; absence blocks submission.
    Manual,
}

impl CredentialMode {
    /// Parse from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "store" | "env" => Some(Self::Store),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Bearer credential for the generation backend.
///
/// The value is never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a credential value, returning `None` for blank input.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the raw secret for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}

/// Reads the credential from the process environment.
///
/// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
///
/// # Errors
///
/// Returns `ConfigError::CredentialMissing` if the variable is unset or blank.
pub fn credential_from_env() -> Result<Credential, ConfigError> {
    std::env::var(CREDENTIAL_VAR)
        .ok()
        .and_then(Credential::new)
        .ok_or(ConfigError::CredentialMissing)
}

/// Per-deployment summary settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryProfile {
    system_instruction: String,
    model: String,
    truncation_length: usize,
    max_output_tokens: u32,
    temperature: f32,
    raw_export: bool,
    credential_mode: CredentialMode,
}

impl SummaryProfile {
    /// Returns the system instruction sent with every request.
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Returns the generation model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the maximum article characters forwarded to generation.
    pub fn truncation_length(&self) -> usize {
        self.truncation_length
    }

    /// Returns the generation token budget.
    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    /// Returns the sampling temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Returns true if the untruncated article can be viewed and exported.
    pub fn raw_export(&self) -> bool {
        self.raw_export
    }

    /// Returns how the credential is supplied.
    pub fn credential_mode(&self) -> CredentialMode {
        self.credential_mode
    }
}

impl Default for SummaryProfile {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            truncation_length: DEFAULT_TRUNCATION_LENGTH,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            raw_export: true,
            credential_mode: CredentialMode::Store,
        }
    }
}

/// Builder for constructing `SummaryProfile` instances.
///
/// Values set on the builder take precedence over environment variables,
/// which take precedence over the defaults.
///
/// # Examples
///
/// ```
/// use medha::config::{CredentialMode, SummaryProfileBuilder};
///
/// let profile = SummaryProfileBuilder::new()
///     .model("llama3-8b-8192")
///     .credential_mode(CredentialMode::Manual)
///     .build()
///     .expect("valid profile");
/// assert_eq!(profile.model(), "llama3-8b-8192");
/// ```
#[derive(Debug, Default)]
pub struct SummaryProfileBuilder {
    system_instruction: Option<String>,
    model: Option<String>,
    truncation_length: Option<usize>,
    max_output_tokens: Option<u32>,
    raw_export: Option<bool>,
    credential_mode: Option<CredentialMode>,
}

impl SummaryProfileBuilder {
    /// Creates a new builder with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the system instruction.
    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Sets the model identifier (e.g., "llama-3.1-8b-instant").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the truncation length in characters.
    pub fn truncation_length(mut self, chars: usize) -> Self {
        self.truncation_length = Some(chars);
        self
    }

    /// Sets the generation token budget.
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Enables or disables the raw article view and export.
    pub fn raw_export(mut self, enabled: bool) -> Self {
        self.raw_export = Some(enabled);
        self
    }

    /// Sets how the credential is supplied.
    pub fn credential_mode(mut self, mode: CredentialMode) -> Self {
        self.credential_mode = Some(mode);
        self
    }

    /// Builds the profile.
    ///
    /// # Environment Variables
    ///
    /// For every value not set on the builder, the following are consulted:
    /// `MEDHA_MODEL`, `MEDHA_TRUNCATE_CHARS`, `MEDHA_MAX_TOKENS`,
    /// `MEDHA_RAW_EXPORT` and `MEDHA_KEY_MODE`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if an environment override cannot be
    /// parsed, if the truncation length falls outside `TRUNCATION_LENGTH_RANGE`,
    /// or if the token budget falls outside `MAX_OUTPUT_TOKENS_RANGE`.
    pub fn build(self) -> Result<SummaryProfile, ConfigError> {
        let defaults = SummaryProfile::default();

        let model = match self.model {
            Some(m) => m,
            None => env_value("MEDHA_MODEL").unwrap_or(defaults.model),
        };

        let truncation_length = match self.truncation_length {
            Some(n) => n,
            None => env_parsed("MEDHA_TRUNCATE_CHARS", |v| v.parse().ok())?
                .unwrap_or(defaults.truncation_length),
        };
        if !TRUNCATION_LENGTH_RANGE.contains(&truncation_length) {
            return Err(ConfigError::InvalidValue {
                name: "truncation_length",
                value: truncation_length.to_string(),
            });
        }

        let max_output_tokens = match self.max_output_tokens {
            Some(n) => n,
            None => env_parsed("MEDHA_MAX_TOKENS", |v| v.parse().ok())?
                .unwrap_or(defaults.max_output_tokens),
        };
        if !MAX_OUTPUT_TOKENS_RANGE.contains(&max_output_tokens) {
            return Err(ConfigError::InvalidValue {
                name: "max_output_tokens",
                value: max_output_tokens.to_string(),
            });
        }

        let raw_export = match self.raw_export {
            Some(b) => b,
            None => env_parsed("MEDHA_RAW_EXPORT", parse_flag)?.unwrap_or(defaults.raw_export),
        };

        let credential_mode = match self.credential_mode {
            Some(m) => m,
            None => env_parsed("MEDHA_KEY_MODE", CredentialMode::parse)?
                .unwrap_or(defaults.credential_mode),
        };

        Ok(SummaryProfile {
            system_instruction: self
                .system_instruction
                .unwrap_or(defaults.system_instruction),
            model,
            truncation_length,
            max_output_tokens,
            temperature: defaults.temperature,
            raw_export,
            credential_mode,
        })
    }
}

/// Reads a non-blank environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads and parses an environment variable, rejecting unparseable values.
fn env_parsed<T>(
    name: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    match env_value(name) {
        None => Ok(None),
        Some(value) => parse(&value)
            .map(Some)
            .ok_or(ConfigError::InvalidValue { name, value }),
    }
}

/// Parses a boolean flag such as `true`, `0` or `yes`.
fn parse_flag(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const PROFILE_VARS: [&str; 5] = [
        "MEDHA_MODEL",
        "MEDHA_TRUNCATE_CHARS",
        "MEDHA_MAX_TOKENS",
        "MEDHA_RAW_EXPORT",
        "MEDHA_KEY_MODE",
    ];

    fn clear_profile_env() {
        for var in PROFILE_VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn credential_rejects_blank_values() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
        assert_eq!(Credential::new(" gsk_abc ").unwrap().expose(), "gsk_abc");
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("gsk_secret").unwrap();
        let printed = format!("{credential:?}");
        assert!(!printed.contains("gsk_secret"));
        assert_eq!(printed, "Credential(****)");
    }

    #[test]
    #[serial]
    fn credential_from_env_reads_variable() {
        unsafe {
            std::env::set_var(CREDENTIAL_VAR, "gsk_from_env");
        }
        let credential = credential_from_env().unwrap();
        assert_eq!(credential.expose(), "gsk_from_env");

        unsafe {
            std::env::remove_var(CREDENTIAL_VAR);
        }
        assert!(matches!(
            credential_from_env(),
            Err(ConfigError::CredentialMissing)
        ));
    }

    #[test]
    fn credential_mode_parse() {
        assert_eq!(CredentialMode::parse("store"), Some(CredentialMode::Store));
        assert_eq!(CredentialMode::parse("MANUAL"), Some(CredentialMode::Manual));
        assert_eq!(CredentialMode::parse("prompt"), None);
    }

    #[test]
    #[serial]
    fn build_uses_defaults_without_env() {
        clear_profile_env();

        let profile = SummaryProfileBuilder::new().build().unwrap();
        assert_eq!(profile, SummaryProfile::default());
        assert_eq!(profile.model(), "llama-3.1-8b-instant");
        assert_eq!(profile.truncation_length(), 6000);
        assert_eq!(profile.max_output_tokens(), 600);
        assert!((profile.temperature() - 0.5).abs() < f32::EPSILON);
        assert!(profile.raw_export());
        assert_eq!(profile.credential_mode(), CredentialMode::Store);
    }

    #[test]
    #[serial]
    fn build_reads_environment_overrides() {
        clear_profile_env();
        unsafe {
            std::env::set_var("MEDHA_MODEL", "llama3-8b-8192");
            std::env::set_var("MEDHA_TRUNCATE_CHARS", "5000");
            std::env::set_var("MEDHA_MAX_TOKENS", "500");
            std::env::set_var("MEDHA_RAW_EXPORT", "no");
            std::env::set_var("MEDHA_KEY_MODE", "manual");
        }

        let profile = SummaryProfileBuilder::new().build().unwrap();
        assert_eq!(profile.model(), "llama3-8b-8192");
        assert_eq!(profile.truncation_length(), 5000);
        assert_eq!(profile.max_output_tokens(), 500);
        assert!(!profile.raw_export());
        assert_eq!(profile.credential_mode(), CredentialMode::Manual);

        clear_profile_env();
    }

    #[test]
    #[serial]
    fn builder_values_take_precedence_over_env() {
        clear_profile_env();
        unsafe {
            std::env::set_var("MEDHA_MODEL", "env-model");
            std::env::set_var("MEDHA_KEY_MODE", "manual");
        }

        let profile = SummaryProfileBuilder::new()
            .model("builder-model")
            .credential_mode(CredentialMode::Store)
            .build()
            .unwrap();
        assert_eq!(profile.model(), "builder-model");
        assert_eq!(profile.credential_mode(), CredentialMode::Store);

        clear_profile_env();
    }

    #[test]
    #[serial]
    fn build_rejects_unparseable_env_value() {
        clear_profile_env();
        unsafe {
            std::env::set_var("MEDHA_TRUNCATE_CHARS", "lots");
        }

        let result = SummaryProfileBuilder::new().build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                name: "MEDHA_TRUNCATE_CHARS",
                ..
            })
        ));

        clear_profile_env();
    }

    #[test]
    #[serial]
    fn build_rejects_zero_truncation_length() {
        clear_profile_env();
        let result = SummaryProfileBuilder::new().truncation_length(0).build();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn build_rejects_truncation_length_above_range() {
        clear_profile_env();
        unsafe {
            std::env::set_var("MEDHA_TRUNCATE_CHARS", "100000");
        }

        let result = SummaryProfileBuilder::new().build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "truncation_length", ref value }) if value == "100000"
        ));

        clear_profile_env();
    }

    #[test]
    #[serial]
    fn build_rejects_token_budget_outside_range() {
        clear_profile_env();
        assert!(SummaryProfileBuilder::new().max_output_tokens(499).build().is_err());
        assert!(SummaryProfileBuilder::new().max_output_tokens(601).build().is_err());

        let profile = SummaryProfileBuilder::new()
            .truncation_length(5000)
            .max_output_tokens(500)
            .build()
            .unwrap();
        assert_eq!(profile.truncation_length(), 5000);
        assert_eq!(profile.max_output_tokens(), 500);
    }

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
