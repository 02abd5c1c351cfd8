//! Interface de linha de comando do keywriter baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (parse, run, demo)
//! e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// keywriter: simula a geração de conteúdo em lote a partir de palavras-chave.
#[derive(Debug, Parser)]
#[command(name = "keywriter", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho para um arquivo TOML de configuração (padrão: ./keywriter.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita logs de depuração (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lê um arquivo de palavras-chave e imprime os registros como JSON.
    Parse {
        /// CSV de palavras-chave: `principal,secundária|secundária`.
        file: PathBuf,
    },

    /// Carrega um arquivo de palavras-chave e executa o pipeline em cada linha.
    Run {
        /// CSV de palavras-chave: `principal,secundária|secundária`.
        file: PathBuf,

        /// Reexecuta jobs falhos até completar este número de lotes.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        rounds: u32,

        /// Substitui a probabilidade de falha configurada (0.0 a 1.0).
        #[arg(long)]
        failure_rate: Option<f64>,

        /// Usa atrasos quase nulos entre etapas.
        #[arg(long, default_value_t = false)]
        fast: bool,

        /// Imprime os jobs finais como JSON em vez de tabela.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Executa a demonstração embutida: um lote e depois edição de um rascunho.
    Demo {
        /// Responde sim a todas as confirmações.
        #[arg(long, short, default_value_t = false)]
        yes: bool,
    },
}
