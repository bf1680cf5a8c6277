use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::cli::{Args, ProviderKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub analysis_model: Option<String>,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub feedback_delay_ms: u64,
    pub feedback_min_chars: usize,
    pub save_transcript: bool,
    pub transcript_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: None,
            analysis_model: None,
            api_base: None,
            api_key: None,
            timeout_secs: 300,
            feedback_delay_ms: 1000,
            feedback_min_chars: 15,
            save_transcript: false,
            transcript_dir: PathBuf::from(".prompt-copilot/sessions"),
        }
    }
}

impl Config {
    /// Defaults, then the config file (explicit path or the per-user one),
    /// then command-line flags.
    pub fn load(args: &Args) -> Result<Self> {
        let mut cfg = match &args.config {
            Some(path) => Self::from_file(Path::new(path))?,
            None => match default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        cfg.apply_args(args);
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            serde_yaml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
        } else {
            toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
        }
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(p) = args.provider {
            if p != self.provider {
                // models configured for another provider would not resolve
                self.model = None;
                self.analysis_model = None;
            }
            self.provider = p;
        }
        if args.model.is_some() {
            self.model = args.model.clone();
        }
        if args.analysis_model.is_some() {
            self.analysis_model = args.analysis_model.clone();
        }
        if args.api_base.is_some() {
            self.api_base = args.api_base.clone();
        }
        if let Some(t) = args.timeout_secs {
            self.timeout_secs = t;
        }
        self.save_transcript |= args.save_transcript;
    }

    pub fn enhancement_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_models().0.to_string())
    }

    pub fn analysis_model(&self) -> String {
        self.analysis_model
            .clone()
            .unwrap_or_else(|| self.provider.default_models().1.to_string())
    }

    /// Config value first, then the provider's environment variables.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.provider
                .api_key_vars()
                .iter()
                .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        })
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("prompt-copilot").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["prompt-copilot"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn toml_file_then_flags() {
        let mut f = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            f,
            "provider = \"openai\"\nmodel = \"gpt-4o\"\nfeedback_delay_ms = 500\napi_key = \"sk-test\""
        )
        .unwrap();
        let path = f.path().to_str().unwrap().to_string();

        let cfg = Config::load(&args(&["--config", &path, "--timeout-secs", "30"])).unwrap();
        assert_eq!(cfg.provider, ProviderKind::OpenAI);
        assert_eq!(cfg.enhancement_model(), "gpt-4o");
        assert_eq!(cfg.analysis_model(), "gpt-4.1");
        assert_eq!(cfg.feedback_delay_ms, 500);
        assert_eq!(cfg.feedback_min_chars, 15);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.resolve_api_key().as_deref(), Some("sk-test"));
    }

    #[test]
    fn yaml_files_are_supported() {
        let mut f = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(f, "provider: ollama\nsave_transcript: true").unwrap();
        let cfg = Config::from_file(f.path()).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Ollama);
        assert!(cfg.save_transcript);
        assert_eq!(cfg.enhancement_model(), "llama3.1");
    }

    #[test]
    fn switching_provider_drops_foreign_models() {
        let mut cfg = Config { model: Some("gemini-2.5-flash".into()), ..Config::default() };
        cfg.apply_args(&args(&["--provider", "anthropic"]));
        assert_eq!(cfg.provider, ProviderKind::Anthropic);
        assert_eq!(cfg.enhancement_model(), "claude-3-5-haiku-latest");
    }

    #[test]
    fn invalid_file_is_reported() {
        let mut f = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(f, "timeout_secs = \"soon\"").unwrap();
        assert!(Config::from_file(f.path()).is_err());
    }
}
