use planbot_search::{StrategyScore, Verdict};
use std::path::Path;

/// Markdown ranking of strategy scores, best first, with each strategy's
/// wrong matches listed underneath.
pub fn render_eval_report(dataset: &Path, scores: &[StrategyScore]) -> String {
    let posts = scores.first().map_or(0, |score| score.posts.len());

    let mut md = String::new();
    md.push_str("# Strategy evaluation\n\n");
    md.push_str(&format!("- Dataset: `{}`\n", dataset.display()));
    md.push_str(&format!("- Posts: `{posts}`\n\n"));

    md.push_str("## Ranking\n\n");
    md.push_str("| strategy | score | correct | alternate | no_match | wrong |\n");
    md.push_str("|---|---:|---:|---:|---:|---:|\n");
    for score in scores {
        md.push_str(&format!(
            "| `{}` | `{:.1}` | `{}` | `{}` | `{}` | `{}` |\n",
            score.name,
            score.total_score,
            score.with_verdict(Verdict::Correct).count(),
            score.with_verdict(Verdict::Alternate).count(),
            score.with_verdict(Verdict::NoMatch).count(),
            score.with_verdict(Verdict::Wrong).count(),
        ));
    }
    md.push('\n');

    for score in scores {
        md.push_str(&format!("## Wrong matches (`{}`)\n\n", score.name));
        md.push_str("| match | confidence | source | post |\n");
        md.push_str("|---|---:|---|---|\n");
        for post in score.with_verdict(Verdict::Wrong).take(10) {
            md.push_str(&format!(
                "| `{}` | `{}` | `{}` | `{}` |\n",
                post.match_id.as_deref().unwrap_or("n/a"),
                post.match_confidence
                    .map_or("n/a".to_string(), |c| format!("{c:.1}")),
                post.post_source.as_deref().unwrap_or("n/a"),
                escape_cell(&truncate_one_line(&post.post_text, 120)),
            ));
        }
        md.push('\n');
    }

    md
}

/// Sort best score first; equal scores keep their input order.
pub fn rank(scores: &mut [StrategyScore]) {
    scores.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let s = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.chars().count() <= max_chars {
        return s;
    }
    let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use planbot_search::ScoredPost;

    fn scored(text: &str, verdict: Verdict, match_id: Option<&str>) -> ScoredPost {
        ScoredPost {
            post_text: text.to_string(),
            post_source: None,
            verdict,
            score: verdict.score(),
            match_id: match_id.map(str::to_string),
            match_confidence: match_id.map(|_| 80.0),
        }
    }

    fn score(name: &str, total_score: f64, posts: Vec<ScoredPost>) -> StrategyScore {
        StrategyScore {
            name: name.to_string(),
            total_score,
            posts,
        }
    }

    #[test]
    fn report_ranks_and_lists_wrong_matches() {
        let mut scores = vec![
            score(
                "token_sort_ratio",
                -50.0,
                vec![
                    scored("!warrenplanbot housing | rent", Verdict::Wrong, Some("7")),
                    scored("!warrenplanbot child care", Verdict::Correct, Some("2")),
                ],
            ),
            score(
                "lsa",
                100.0,
                vec![
                    scored("!warrenplanbot housing | rent", Verdict::Correct, Some("3")),
                    scored("!warrenplanbot child care", Verdict::Correct, Some("2")),
                ],
            ),
        ];
        rank(&mut scores);
        assert_eq!(scores[0].name, "lsa");

        let md = render_eval_report(Path::new("labelled.json"), &scores);
        assert!(md.contains("# Strategy evaluation"));
        assert!(md.contains("- Posts: `2`"));
        assert!(md.contains("| `lsa` | `100.0` | `2` | `0` | `0` | `0` |"));
        assert!(md.contains("housing \\| rent"));
        let lsa_row = md.find("| `lsa`").unwrap();
        let tsr_row = md.find("| `token_sort_ratio`").unwrap();
        assert!(lsa_row < tsr_row);
    }

    #[test]
    fn long_posts_are_truncated_to_one_line() {
        let text = format!("line one\nline two {}", "x".repeat(200));
        let out = truncate_one_line(&text, 20);
        assert_eq!(out.chars().count(), 20);
        assert!(out.starts_with("line one line two"));
        assert!(out.ends_with('…'));
    }
}
