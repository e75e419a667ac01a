//! Report assembly and text rendering.

use crate::config::ReportKind;
use pickleball_engine::bracket::{Bracket, BracketSizing, BracketSlot, sizing_for};
use pickleball_engine::standings::{RoundRobinReport, TeamStanding, check_round_robin, standings_for};
use pickleball_engine::{DivisionSnapshot, EngineConfig, EngineResult, Stage, bracket_for};
use serde::Serialize;
use std::fmt::Write;

/// Everything the tool knows about one division snapshot
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub division: String,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<RoundRobinReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standings: Option<Vec<TeamStanding>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizing: Option<BracketSizing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bracket: Option<Bracket>,
}

impl DiagnosticReport {
    pub fn build(
        snapshot: &DivisionSnapshot,
        config: &EngineConfig,
        kind: ReportKind,
    ) -> EngineResult<Self> {
        let wants = |k: ReportKind| kind == k || kind == ReportKind::All;

        let integrity = wants(ReportKind::Integrity).then(|| {
            check_round_robin(&snapshot.division, &snapshot.teams, &snapshot.matches)
        });
        let standings = wants(ReportKind::Standings).then(|| standings_for(snapshot));
        let (sizing, bracket) = if wants(ReportKind::Bracket) {
            (
                Some(sizing_for(snapshot, config)),
                Some(bracket_for(snapshot, config)?),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            division: snapshot.division.name.clone(),
            stage: snapshot.division.stage,
            integrity,
            standings,
            sizing,
            bracket,
        })
    }

    /// Integrity problems found, zero when the integrity report was not requested
    pub fn problem_count(&self) -> usize {
        self.integrity
            .as_ref()
            .map_or(0, RoundRobinReport::problem_count)
    }

    /// False when the integrity report was requested and found problems
    pub fn is_clean(&self) -> bool {
        self.integrity
            .as_ref()
            .is_none_or(RoundRobinReport::is_clean)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);
        let _ = writeln!(out, "{rule}\nDivision: {}\nStage: {}\n{rule}", self.division, self.stage);

        if let Some(report) = &self.integrity {
            let _ = writeln!(out, "\nROUND ROBIN INTEGRITY");
            let _ = write!(out, "{report}");
        }

        if let Some(standings) = &self.standings {
            let _ = writeln!(out, "\nSTANDINGS");
            for s in standings {
                let _ = writeln!(
                    out,
                    "  {:>2}. {:<24} W:{:<3} L:{:<3} PF:{:<4} PA:{:<4} PD:{:+}",
                    s.rank, s.team_name, s.wins, s.losses, s.points_for, s.points_against, s.point_diff
                );
            }
        }

        if let Some(sizing) = &self.sizing {
            let _ = writeln!(out, "\nBRACKET SIZING");
            let _ = writeln!(
                out,
                "  {} teams, bracket of {}",
                sizing.team_count, sizing.bracket_size
            );
            if sizing.needs_play_in {
                let seeds = sizing.play_in_seeds();
                let _ = writeln!(
                    out,
                    "  Play-in required: seeds 1-{} qualify directly, seeds {}-{} play {} play-in matches",
                    sizing.auto_qualified_count,
                    seeds.start(),
                    seeds.end(),
                    sizing.play_in_match_count()
                );
            } else {
                let _ = writeln!(
                    out,
                    "  No play-in: {} teams qualify directly",
                    sizing.auto_qualified_count
                );
            }
        }

        if let Some(bracket) = &self.bracket {
            let _ = writeln!(out, "\nBRACKET");
            for bye in &bracket.byes {
                let _ = writeln!(
                    out,
                    "  bye        {} -> {}",
                    slot_label(&bye.slot),
                    bye.into_match_id.as_deref().unwrap_or("champion")
                );
            }
            for m in &bracket.matches {
                let winner = match m.winner_side() {
                    Some(side) => format!("  winner {}", slot_label(m.slot(side))),
                    None => String::new(),
                };
                let _ = writeln!(
                    out,
                    "  {:<10} {} vs {}  [{:?}]{}",
                    m.id,
                    slot_label(&m.left),
                    slot_label(&m.right),
                    m.status,
                    winner
                );
            }
            match &bracket.champion {
                Some(champion) => {
                    let _ = writeln!(out, "\n  Champion: {}", slot_label(champion));
                }
                None => {
                    let _ = writeln!(out, "\n  Champion: undecided");
                }
            }
        }

        out
    }
}

fn slot_label(slot: &BracketSlot) -> String {
    match &slot.team_name {
        Some(name) => format!("#{} {}", slot.seed, name),
        None if slot.seed == 0 => "(empty)".to_string(),
        None => format!("#{} (TBD)", slot.seed),
    }
}
