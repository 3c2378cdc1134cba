use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use planbot_search::{
    SemanticStrategy, Strategy, DEFAULT_POTENTIAL_THRESHOLD, DEFAULT_TOKEN_SORT_THRESHOLD,
    LSA_THRESHOLD, TFIDF_THRESHOLD,
};
use planbot_text::{Preprocessor, TriggerExtractor, DEFAULT_DOMAIN_STOPWORDS};
use planbot_vector_store::{ModelKind, ModelSpec};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TRIGGER_WORD: &str = "!warrenplanbot";
pub const DEFAULT_BOT_NAME: &str = "warrenplanbot";
pub const DEFAULT_CORPUS_DIR: &str = "corpus";
pub const DEFAULT_MODEL_DIR: &str = "models";

/// What happens when the bot decides to reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyMode {
    /// Log the decision only; nothing counts as replied
    #[default]
    DryRun,
    /// Log as if sent and record `replied = true`
    Simulate,
    Send,
}

impl ReplyMode {
    /// Simulation wins when both are requested.
    #[must_use]
    pub const fn from_flags(send: bool, simulate: bool) -> Self {
        if simulate {
            Self::Simulate
        } else if send {
            Self::Send
        } else {
            Self::DryRun
        }
    }
}

/// Statistical fallback at the end of the strategy chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    #[default]
    Lsa,
    Tfidf,
    TokenSortRatio,
}

impl FallbackStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lsa => "lsa",
            Self::Tfidf => "tfidf",
            Self::TokenSortRatio => "token_sort_ratio",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "lsa" => Ok(Self::Lsa),
            "tfidf" => Ok(Self::Tfidf),
            "token_sort_ratio" => Ok(Self::TokenSortRatio),
            other => Err(anyhow!(
                "strategy '{other}' is not supported (expected lsa, tfidf or token_sort_ratio)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub lsa: f64,
    pub tfidf: f64,
    pub token_sort_ratio: f64,
    pub potential_match: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            lsa: LSA_THRESHOLD,
            tfidf: TFIDF_THRESHOLD,
            token_sort_ratio: DEFAULT_TOKEN_SORT_THRESHOLD,
            potential_match: DEFAULT_POTENTIAL_THRESHOLD,
        }
    }
}

/// Chat-completions endpoint used to enrich single-plan replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the bearer token
    pub api_key_env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub trigger_word: String,
    pub bot_name: String,
    pub corpus_dir: PathBuf,
    pub model_dir: PathBuf,
    /// Artifact name inside `model_dir`; defaults to the strategy name
    pub model_name: Option<String>,
    pub strategy: FallbackStrategy,
    pub thresholds: Thresholds,
    pub custom_stopwords: Vec<String>,
    pub reply_mode: ReplyMode,
    /// Suppress audit writes entirely
    pub skip_tracking: bool,
    pub enrichment: Option<EnrichmentConfig>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger_word: DEFAULT_TRIGGER_WORD.to_string(),
            bot_name: DEFAULT_BOT_NAME.to_string(),
            corpus_dir: PathBuf::from(DEFAULT_CORPUS_DIR),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            model_name: None,
            strategy: FallbackStrategy::default(),
            thresholds: Thresholds::default(),
            custom_stopwords: DEFAULT_DOMAIN_STOPWORDS
                .iter()
                .map(|w| (*w).to_string())
                .collect(),
            reply_mode: ReplyMode::default(),
            skip_tracking: false,
            enrichment: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBotConfig {
    #[serde(default)]
    schema_version: Option<u32>,
    trigger_word: Option<String>,
    bot_name: Option<String>,
    corpus_dir: Option<PathBuf>,
    model_dir: Option<PathBuf>,
    model_name: Option<String>,
    strategy: Option<String>,
    #[serde(default)]
    thresholds: RawThresholds,
    custom_stopwords: Option<Vec<String>>,
    reply_mode: Option<ReplyMode>,
    skip_tracking: Option<bool>,
    enrichment: Option<EnrichmentConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThresholds {
    lsa: Option<f64>,
    tfidf: Option<f64>,
    token_sort_ratio: Option<f64>,
    potential_match: Option<f64>,
}

impl BotConfig {
    /// Load a JSON or TOML file and merge it over the defaults. Relative
    /// directories resolve against the file's own directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_bytes(&bytes)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.corpus_dir = resolve(base, &config.corpus_dir);
            config.model_dir = resolve(base, &config.model_dir);
        }
        Ok(config)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = parse_raw(bytes)?;
        let config = Self::from_raw(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn from_raw(raw: RawBotConfig) -> Result<Self> {
        if let Some(schema_version) = raw.schema_version {
            if schema_version != 1 {
                return Err(anyhow!(
                    "schema_version {schema_version} is not supported (expected 1)"
                ));
            }
        }

        let defaults = Self::default();
        let strategy = raw
            .strategy
            .as_deref()
            .map(FallbackStrategy::parse)
            .transpose()?
            .unwrap_or(defaults.strategy);
        let thresholds = Thresholds {
            lsa: raw.thresholds.lsa.unwrap_or(defaults.thresholds.lsa),
            tfidf: raw.thresholds.tfidf.unwrap_or(defaults.thresholds.tfidf),
            token_sort_ratio: raw
                .thresholds
                .token_sort_ratio
                .unwrap_or(defaults.thresholds.token_sort_ratio),
            potential_match: raw
                .thresholds
                .potential_match
                .unwrap_or(defaults.thresholds.potential_match),
        };

        Ok(Self {
            trigger_word: raw.trigger_word.unwrap_or(defaults.trigger_word),
            bot_name: raw.bot_name.unwrap_or(defaults.bot_name),
            corpus_dir: raw.corpus_dir.unwrap_or(defaults.corpus_dir),
            model_dir: raw.model_dir.unwrap_or(defaults.model_dir),
            model_name: raw.model_name.filter(|n| !n.trim().is_empty()),
            strategy,
            thresholds,
            custom_stopwords: raw.custom_stopwords.unwrap_or(defaults.custom_stopwords),
            reply_mode: raw.reply_mode.unwrap_or(defaults.reply_mode),
            skip_tracking: raw.skip_tracking.unwrap_or(defaults.skip_tracking),
            enrichment: raw.enrichment,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.trigger_word.trim().is_empty() {
            return Err(anyhow!("trigger_word must not be empty"));
        }
        if self.bot_name.trim().is_empty() {
            return Err(anyhow!("bot_name must not be empty"));
        }
        for (name, value) in [
            ("thresholds.lsa", self.thresholds.lsa),
            ("thresholds.tfidf", self.thresholds.tfidf),
            ("thresholds.token_sort_ratio", self.thresholds.token_sort_ratio),
            ("thresholds.potential_match", self.thresholds.potential_match),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(anyhow!("{name} must be within 0..=100 (got {value})"));
            }
        }
        if let Some(enrichment) = &self.enrichment {
            if enrichment.endpoint.trim().is_empty() || enrichment.model.trim().is_empty() {
                return Err(anyhow!("enrichment.endpoint and enrichment.model must not be empty"));
            }
        }
        Ok(())
    }

    pub fn trigger(&self) -> Result<TriggerExtractor> {
        TriggerExtractor::new(&self.trigger_word)
            .with_context(|| format!("Invalid trigger word '{}'", self.trigger_word))
    }

    /// Bigram pipeline with this config's domain stopwords; training and
    /// scoring must share it.
    #[must_use]
    pub fn preprocessor(&self) -> Preprocessor {
        Preprocessor::baseline_with_stopwords(&self.custom_stopwords).bigrams()
    }

    #[must_use]
    pub fn fallback(&self) -> Strategy {
        let semantic = |kind: ModelKind, threshold: f64| {
            let name = self
                .model_name
                .clone()
                .unwrap_or_else(|| self.strategy.as_str().to_string());
            Strategy::Semantic(SemanticStrategy {
                model: ModelSpec::new(name, kind, &self.model_dir),
                threshold,
                potential_threshold: self.thresholds.potential_match,
                preprocessor: self.preprocessor(),
            })
        };
        match self.strategy {
            FallbackStrategy::Lsa => semantic(ModelKind::Lsi, self.thresholds.lsa),
            FallbackStrategy::Tfidf => semantic(ModelKind::Tfidf, self.thresholds.tfidf),
            FallbackStrategy::TokenSortRatio => Strategy::TokenSortRatio {
                threshold: self.thresholds.token_sort_ratio,
            },
        }
    }

    /// Rules first, then the configured fallback. The title rule shares
    /// the fallback's stopwords but not its bigrams.
    #[must_use]
    pub fn chain(&self) -> Strategy {
        Strategy::rule_chain(
            Preprocessor::baseline_with_stopwords(&self.custom_stopwords),
            self.fallback(),
        )
    }
}

fn resolve(base: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        base.join(dir)
    }
}

fn parse_raw(bytes: &[u8]) -> Result<RawBotConfig> {
    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(json_err) => {
            let utf8 = std::str::from_utf8(bytes).map_err(|err| anyhow!("{json_err}; {err}"))?;
            let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                anyhow!("Config is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}")
            })?;
            serde_json::to_value(toml_value)
                .map_err(|err| anyhow!("Failed to convert TOML config to JSON: {err}"))?
        }
    };
    serde_json::from_value(value).map_err(|err| anyhow!("Config parse error: {err}"))
}
