use std::fmt;

use serde::{Deserialize, Serialize};

pub const STAGE_COUNT: usize = 9;

/// The fixed stages every job walks through, in order.
///
/// Research → SERP Analysis → Extract Headings → Intent → FAQs → Outline →
/// Draft Generation → SEO Optimization → Done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Research,
    SerpAnalysis,
    ExtractHeadings,
    Intent,
    Faqs,
    Outline,
    DraftGeneration,
    SeoOptimization,
    Done,
}

impl Stage {
    pub const ALL: [Stage; STAGE_COUNT] = [
        Stage::Research,
        Stage::SerpAnalysis,
        Stage::ExtractHeadings,
        Stage::Intent,
        Stage::Faqs,
        Stage::Outline,
        Stage::DraftGeneration,
        Stage::SeoOptimization,
        Stage::Done,
    ];

    /// Index of the terminal `Done` stage.
    pub const TERMINAL_INDEX: usize = STAGE_COUNT - 1;

    /// Stage producing the editable draft.
    pub const DRAFT: Stage = Stage::DraftGeneration;

    /// Stage attaching SEO metrics.
    pub const SEO: Stage = Stage::SeoOptimization;

    pub fn at(index: usize) -> Option<Stage> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_terminal(self) -> bool {
        self == Stage::Done
    }

    /// `round(index / (STAGE_COUNT - 1) * 100)`, clamped to 100.
    pub fn progress_at(index: usize) -> u8 {
        let ratio = index as f64 / Self::TERMINAL_INDEX as f64;
        (ratio * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Research => "Research",
            Stage::SerpAnalysis => "SERP Analysis",
            Stage::ExtractHeadings => "Extract Headings",
            Stage::Intent => "Intent",
            Stage::Faqs => "FAQs",
            Stage::Outline => "Outline",
            Stage::DraftGeneration => "Draft Generation",
            Stage::SeoOptimization => "SEO Optimization",
            Stage::Done => "Done",
        };
        f.write_str(name)
    }
}

/// Where a job currently sits in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrentStep {
    /// Not started in this run yet.
    Waiting,
    At(Stage),
}

impl fmt::Display for CurrentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrentStep::Waiting => f.write_str("waiting"),
            CurrentStep::At(stage) => write!(f, "{stage}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_match_table_order() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
            assert_eq!(Stage::at(i), Some(*stage));
        }
        assert_eq!(Stage::at(STAGE_COUNT), None);
        assert_eq!(Stage::DRAFT.index(), 6);
        assert_eq!(Stage::SEO.index(), 7);
        assert!(Stage::at(Stage::TERMINAL_INDEX).unwrap().is_terminal());
    }

    #[test]
    fn progress_is_monotonic_and_only_terminal_hits_100() {
        let values: Vec<u8> = (0..STAGE_COUNT).map(Stage::progress_at).collect();
        assert_eq!(values, vec![0, 13, 25, 38, 50, 63, 75, 88, 100]);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(Stage::progress_at(99), 100);
    }

    #[test]
    fn display_names() {
        assert_eq!(Stage::SerpAnalysis.to_string(), "SERP Analysis");
        assert_eq!(Stage::Faqs.to_string(), "FAQs");
        assert_eq!(CurrentStep::Waiting.to_string(), "waiting");
        assert_eq!(CurrentStep::At(Stage::Outline).to_string(), "Outline");
    }
}
