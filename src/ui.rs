//! Interface de terminal do keywriter: barras de progresso e saída colorida.
//!
//! Usa `indicatif` para uma barra por job e `console` para estilização com
//! cores. O núcleo nunca chama este módulo; ele apenas lê snapshots do store.

use std::collections::HashMap;

use console::{Style, Term};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::editor::ConfirmPrompt;
use crate::pipeline::{CurrentStep, FailureRecord, Job, JobId, JobStatus};
use crate::seed::FileDetails;

/// Uma barra de progresso por job, atualizada a partir de snapshots do store.
pub struct BatchProgress {
    // Agrupa as barras para desenhá-las juntas no stderr.
    multi: MultiProgress,
    bars: HashMap<JobId, ProgressBar>,
    style: ProgressStyle,
    // Verde para jobs concluídos.
    green: Style,
    // Vermelho para jobs falhos.
    red: Style,
}

impl Default for BatchProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchProgress {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template("{prefix:>4} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        Self {
            multi: MultiProgress::new(),
            bars: HashMap::new(),
            style,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    /// Sincroniza as barras com `jobs`, criando barras para jobs novos.
    pub fn refresh(&mut self, jobs: &[Job]) {
        for job in jobs {
            let bar = self.bars.entry(job.id()).or_insert_with(|| {
                let bar = self.multi.add(ProgressBar::new(100));
                bar.set_style(self.style.clone());
                bar.set_prefix(format!("#{}", job.id()));
                bar
            });

            bar.set_position(u64::from(job.progress()));
            let label = format!("{} · {}", job.main_keyword(), step_label(job.current_step()));
            match job.status() {
                JobStatus::Done { .. } => {
                    bar.set_message(format!("{} {label}", self.green.apply_to("✓")));
                }
                JobStatus::Failed(record) => {
                    bar.set_message(format!("{} {label}: {}", self.red.apply_to("✗"), failure_line(record)));
                }
                _ => bar.set_message(label),
            }
        }
    }

    /// Finaliza todas as barras, mantendo o último estado visível.
    pub fn finish(&self) {
        for bar in self.bars.values() {
            bar.finish();
        }
    }
}

pub fn print_file_details(details: &FileDetails) {
    let dim = Style::new().dim();
    println!(
        "{} {}  {} {}  {} {}",
        dim.apply_to("Name:"),
        details.name,
        dim.apply_to("Size:"),
        details.size,
        dim.apply_to("Type:"),
        details.mime_type
    );
}

// Cor do status na tabela de resumo.
fn status_style(status: &JobStatus) -> Style {
    match status {
        JobStatus::Done { .. } => Style::new().green(),
        JobStatus::Failed(_) => Style::new().red(),
        JobStatus::Running => Style::new().cyan(),
        JobStatus::Pending => Style::new().yellow(),
    }
}

/// Imprime a tabela de todos os jobs com status, progresso e edições.
pub fn print_summary(jobs: &[Job]) {
    let header = Style::new().bold();
    println!();
    println!(
        "{}",
        header.apply_to(format!(
            "{:>4}  {:<24} {:<8} {:>4}  {:<18} {:<6} {:>4} {:>5}",
            "ID", "Keyword", "Status", "%", "Step", "Edited", "Ver", "Regen"
        ))
    );
    for job in jobs {
        let status = format!("{:<8}", job.status().label());
        println!(
            "{:>4}  {:<24} {} {:>4}  {:<18} {:<6} {:>4} {:>5}",
            job.id(),
            truncate(job.main_keyword(), 24),
            status_style(job.status()).apply_to(status),
            job.progress(),
            step_label(job.current_step()),
            if job.is_edited() { "yes" } else { "—" },
            job.versions().len(),
            job.regeneration_count(),
        );
        if let Some(url) = job.url() {
            println!("      {}", Style::new().dim().apply_to(url));
        }
        if let Some(failure) = job.failure() {
            println!("      {}", Style::new().red().apply_to(failure_line(failure)));
        }
    }
}

/// Imprime o rascunho atual, as métricas de SEO e todas as versões de `job`.
pub fn print_history(job: &Job) {
    let header = Style::new().bold();
    println!();
    println!(
        "{}",
        header.apply_to(format!("─── Job #{} · {} ───", job.id(), job.main_keyword()))
    );
    println!("Secondary keywords: {}", job.secondary_keywords().join(", "));
    println!("Generated: {}", job.original_ai_draft().unwrap_or("—"));
    println!("Draft:     {}", job.draft().unwrap_or("—"));
    println!("Edited: {}", if job.is_edited() { "yes" } else { "no" });
    if let Some(stamp) = job.last_edit() {
        println!("Last edited: {} by {}", stamp.at.format("%Y-%m-%d %H:%M:%S"), stamp.by);
    }
    if let Some(at) = job.ai_generated_at() {
        println!("AI generated: {}", at.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(seo) = job.seo() {
        println!(
            "SEO: density {}% · readability {} · meta {} chars · backlinks {} · score {}/100",
            seo.keyword_density, seo.readability, seo.meta_length, seo.backlinks, seo.score
        );
    }

    let dim = Style::new().dim();
    if job.versions().is_empty() {
        println!("  {}", dim.apply_to("no versions yet"));
    }
    for version in job.versions().entries() {
        println!(
            "  v{} {} {} — {}",
            version.id,
            dim.apply_to(version.timestamp.format("%H:%M:%S")),
            dim.apply_to(format!("[{}, {}]", version.note, version.author)),
            version.content
        );
    }
}

// Etapa atual; jobs ainda não iniciados aparecem esmaecidos.
fn step_label(step: CurrentStep) -> String {
    match step {
        CurrentStep::Waiting => Style::new().dim().apply_to(step).to_string(),
        CurrentStep::At(stage) => stage.to_string(),
    }
}

// Motivo da falha com a etapa e o horário em que ocorreu.
fn failure_line(record: &FailureRecord) -> String {
    format!(
        "{} at step {} ({})",
        record.reason,
        record.step_index,
        record.failed_at.format("%H:%M:%S")
    )
}

// Corta `text` em `max` caracteres, terminando com reticências.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Pergunta no terminal; qualquer resposta diferente de `y`/`yes` recusa.
pub struct TerminalConfirm {
    term: Term,
}

impl Default for TerminalConfirm {
    fn default() -> Self {
        Self { term: Term::stderr() }
    }
}

impl ConfirmPrompt for TerminalConfirm {
    fn confirm(&self, message: &str) -> bool {
        let prompt = Style::new().yellow().apply_to(format!("{message} [y/N] "));
        if self.term.write_str(&prompt.to_string()).is_err() {
            return false;
        }
        match self.term.read_line() {
            Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
