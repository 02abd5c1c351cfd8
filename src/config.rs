//! Configuração do keywriter carregada a partir de `keywriter.toml`.
//!
//! A struct [`KeywriterConfig`] contém os tempos do pipeline, a taxa de
//! falha e o nome do editor. Valores não presentes no arquivo usam defaults.
//! A variável de ambiente `KEYWRITER_EDITOR` tem precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{KeywriterError, Result};

pub const CONFIG_FILE: &str = "keywriter.toml";

/// Configuração de nível superior carregada de `keywriter.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywriterConfig {
    /// Probabilidade de um job ser sorteado para falhar durante a execução.
    #[serde(default = "default_failure_probability")]
    pub failure_probability: f64,

    /// Atraso antes da primeira etapa de um job.
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,

    /// Atraso extra da primeira etapa por posição entre os jobs elegíveis.
    #[serde(default = "default_start_stagger_ms")]
    pub start_stagger_ms: u64,

    /// Atraso entre etapas.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    /// Atraso extra por etapa por posição entre os jobs elegíveis.
    #[serde(default = "default_step_stagger_ms")]
    pub step_stagger_ms: u64,

    /// Tempo simulado de pontuação de SEO ao salvar manualmente.
    #[serde(default = "default_scoring_delay_ms")]
    pub scoring_delay_ms: u64,

    /// Nome registrado como autor de edições e versões.
    #[serde(default = "default_editor_name")]
    pub editor_name: String,

    /// Artigos concluídos são publicados em `{article_base_url}/{job_id}`.
    #[serde(default = "default_article_base_url")]
    pub article_base_url: String,
}

// Valor padrão da probabilidade de falha: 0.6.
fn default_failure_probability() -> f64 {
    0.6
}

fn default_start_delay_ms() -> u64 {
    200
}

fn default_start_stagger_ms() -> u64 {
    100
}

// Valor padrão do atraso entre etapas: 1000ms.
fn default_step_delay_ms() -> u64 {
    1000
}

fn default_step_stagger_ms() -> u64 {
    200
}

fn default_scoring_delay_ms() -> u64 {
    800
}

// Autor padrão das versões: "You".
fn default_editor_name() -> String {
    "You".to_string()
}

fn default_article_base_url() -> String {
    "https://fakewebsite.com/articles".to_string()
}

impl Default for KeywriterConfig {
    fn default() -> Self {
        Self {
            failure_probability: default_failure_probability(),
            start_delay_ms: default_start_delay_ms(),
            start_stagger_ms: default_start_stagger_ms(),
            step_delay_ms: default_step_delay_ms(),
            step_stagger_ms: default_step_stagger_ms(),
            scoring_delay_ms: default_scoring_delay_ms(),
            editor_name: default_editor_name(),
            article_base_url: default_article_base_url(),
        }
    }
}

impl KeywriterConfig {
    /// Carrega `keywriter.toml` do diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega o arquivo indicado, ou os valores padrão se ele não existir.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<KeywriterConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo para o nome do editor.
        if let Ok(name) = std::env::var("KEYWRITER_EDITOR")
            && !name.trim().is_empty()
        {
            config.editor_name = name;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.failure_probability) {
            return Err(KeywriterError::Config(format!(
                "failure_probability must be within [0, 1], got {}",
                self.failure_probability
            )));
        }
        Ok(())
    }

    /// Atrasos quase nulos para demonstrações e testes.
    pub fn fast(mut self) -> Self {
        self.start_delay_ms = 5;
        self.start_stagger_ms = 1;
        self.step_delay_ms = 20;
        self.step_stagger_ms = 2;
        self.scoring_delay_ms = 10;
        self
    }

    /// Atraso antes da primeira etapa do job na posição `position`.
    pub fn first_step_delay(&self, position: usize) -> Duration {
        Duration::from_millis(self.start_delay_ms + position as u64 * self.start_stagger_ms)
    }

    /// Atraso entre etapas do job na posição `position`.
    pub fn step_delay(&self, position: usize) -> Duration {
        Duration::from_millis(self.step_delay_ms + position as u64 * self.step_stagger_ms)
    }

    pub fn scoring_delay(&self) -> Duration {
        Duration::from_millis(self.scoring_delay_ms)
    }

    pub fn article_url(&self, job_id: u64) -> String {
        format!("{}/{job_id}", self.article_base_url.trim_end_matches('/'))
    }
}
