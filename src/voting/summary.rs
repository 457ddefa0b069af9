use crate::voting::ResultSet;
use std::fmt::Write;

impl ResultSet {
    /// Plain-text rendering of the standings, one line per candidate, with
    /// the winner in bold and shares rounded to one decimal.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No votes have been cast yet.".to_string();
        }

        let mut summary = String::new();

        for standing in &self.standings {
            let candidate = &standing.candidate;
            let is_winner = self
                .winner
                .as_ref()
                .is_some_and(|winner| winner.id == candidate.id);

            let name = if is_winner {
                format!("**{}**", candidate.name)
            } else {
                candidate.name.clone()
            };

            let _ = writeln!(
                summary,
                "{}. {} ({}): {} votes ({:.1}%)",
                standing.rank,
                name,
                candidate.party,
                standing.votes,
                standing.rounded_percentage()
            );
        }

        summary.push('\n');
        if self.is_tie {
            let names: Vec<&str> = self.top_candidates.iter().map(|c| c.name.as_str()).collect();
            let _ = write!(
                summary,
                "Tie between {} with {} votes each.",
                names.join(", "),
                self.highest_votes
            );
        } else if let Some(winner) = &self.winner {
            let _ = write!(summary, "{} leads with {} votes.", winner.name, self.highest_votes);
        }
        let _ = write!(summary, "\n{} votes counted.", self.total_votes);

        summary
    }
}

#[cfg(test)]
mod tests {
    use crate::models::Candidate;
    use crate::voting::compute_result_set;

    #[test]
    fn summary_marks_winner() {
        let result = compute_result_set(&[
            Candidate::new("1", "Ada", 100).with_party("Reform"),
            Candidate::new("2", "Grace", 50),
        ])
        .unwrap();

        let summary = result.summary();
        assert!(summary.contains("1. **Ada** (Reform): 100 votes (66.7%)"));
        assert!(summary.contains("2. Grace (Independent): 50 votes (33.3%)"));
        assert!(summary.contains("Ada leads with 100 votes."));
        assert!(summary.ends_with("150 votes counted."));
    }

    #[test]
    fn summary_reports_tie() {
        let result = compute_result_set(&[
            Candidate::new("1", "Ada", 80),
            Candidate::new("2", "Grace", 80),
        ])
        .unwrap();

        let summary = result.summary();
        assert!(summary.contains("Tie between Ada, Grace with 80 votes each."));
        assert!(!summary.contains("**"));
    }

    #[test]
    fn summary_without_votes() {
        let result = compute_result_set(&[Candidate::new("1", "Ada", 0)]).unwrap();
        assert_eq!(result.summary(), "No votes have been cast yet.");
    }
}
