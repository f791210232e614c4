use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::provider::ProviderConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Which backend holds generated audio between synthesis and download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStoreKind {
    Filesystem,
    Memory,
}

impl FromStr for AudioStoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fs" | "filesystem" => Ok(AudioStoreKind::Filesystem),
            "memory" | "mem" => Ok(AudioStoreKind::Memory),
            other => bail!("unknown audio store '{other}' (expected 'fs' or 'memory')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Only the provider credential is mandatory; everything else has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub audio_store: AudioStoreKind,
    pub audio_dir: PathBuf,
    pub audio_ttl: Duration,
    pub sweep_interval: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup so tests never
    /// have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let api_key = lookup("OPENAI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .context("Required environment variable 'OPENAI_API_KEY' is not set")?;

        let provider = ProviderConfig {
            api_key,
            base_url: get("OPENAI_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            completion_model: get("GPT_MODEL", "gpt-4o-mini"),
            tts_model: get("TTS_MODEL", "tts-1"),
            tts_voice: get("TTS_VOICE", "alloy"),
            transcription_model: get("STT_MODEL", "whisper-1"),
            transcription_language: get("TRANSCRIPTION_LANGUAGE", "en"),
            request_timeout: Duration::from_secs(parse_number(
                &get("PROVIDER_TIMEOUT_SECS", "120"),
                "PROVIDER_TIMEOUT_SECS",
            )?),
        };

        let audio_ttl = parse_number(&get("AUDIO_TTL_SECS", "600"), "AUDIO_TTL_SECS")?;
        let sweep_interval = parse_number(
            &get("AUDIO_SWEEP_INTERVAL_SECS", "60"),
            "AUDIO_SWEEP_INTERVAL_SECS",
        )?;
        if sweep_interval == 0 {
            bail!("AUDIO_SWEEP_INTERVAL_SECS must be greater than zero");
        }

        Ok(Config {
            provider,
            audio_store: get("AUDIO_STORE", "fs").parse()?,
            audio_dir: PathBuf::from(get("AUDIO_DIR", "temp")),
            audio_ttl: Duration::from_secs(audio_ttl),
            sweep_interval: Duration::from_secs(sweep_interval),
            port: get("PORT", "3001")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG", "info"),
        })
    }
}

fn parse_number(raw: &str, key: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'"))
}
