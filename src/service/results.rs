// src/service/results.rs

//! The teacher's results report: filtering, sorting and summary statistics
//! over stored submissions.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    config::PASSING_PERCENTAGE,
    models::{quiz::TestSummary, submission::Submission},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultsSort {
    #[default]
    Newest,
    Oldest,
    Name,
    ScoreHigh,
    ScoreLow,
}

impl ResultsSort {
    pub const ALL: [ResultsSort; 5] = [
        ResultsSort::Newest,
        ResultsSort::Oldest,
        ResultsSort::Name,
        ResultsSort::ScoreHigh,
        ResultsSort::ScoreLow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultsSort::Newest => "newest",
            ResultsSort::Oldest => "oldest",
            ResultsSort::Name => "name",
            ResultsSort::ScoreHigh => "score_high",
            ResultsSort::ScoreLow => "score_low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResultsSort::Newest => "Date (newest first)",
            ResultsSort::Oldest => "Date (oldest first)",
            ResultsSort::Name => "Student name",
            ResultsSort::ScoreHigh => "Score (high to low)",
            ResultsSort::ScoreLow => "Score (low to high)",
        }
    }
}

/// Query string of the results page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultsQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub test_id: Option<i64>,
    #[serde(default)]
    pub student: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub sort: ResultsSort,
}

fn empty_as_none<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = Option::deserialize(d)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl ResultsQuery {
    fn student_term(&self) -> Option<String> {
        self.student
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn matches(&self, submission: &Submission) -> bool {
        if let Some(term) = self.student_term() {
            if !submission.student_name.to_lowercase().contains(&term) {
                return false;
            }
        }
        let day = submission.submitted_at.date_naive();
        if self.from.is_some_and(|from| day < from) {
            return false;
        }
        if self.to.is_some_and(|to| day > to) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    pub attempts: usize,
    pub average_percentage: f64,
    pub pass_rate: f64,
    pub unique_students: usize,
}

/// How one question of the selected test was answered across submissions.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionStat {
    pub order_number: i32,
    pub question_text: String,
    pub answered: usize,
    pub correct: usize,
}

impl QuestionStat {
    pub fn correct_percentage(&self) -> f64 {
        if self.answered == 0 {
            return 0.0;
        }
        round2(self.correct as f64 * 100.0 / self.answered as f64)
    }
}

#[derive(Debug, Clone)]
pub struct ResultsReport {
    /// Every test of the teacher, for the test selector.
    pub tests: Vec<TestSummary>,
    pub submissions: Vec<Submission>,
    pub stats: SummaryStats,
    /// Only filled when a single test is selected.
    pub question_stats: Vec<QuestionStat>,
}

impl ResultsReport {
    pub fn build(
        tests: Vec<TestSummary>,
        submissions: Vec<Submission>,
        query: &ResultsQuery,
    ) -> Self {
        let mut submissions: Vec<Submission> =
            submissions.into_iter().filter(|s| query.matches(s)).collect();
        sort_submissions(&mut submissions, query.sort);

        let stats = summarize(&submissions);
        let question_stats = if query.test_id.is_some() {
            question_stats(&submissions)
        } else {
            Vec::new()
        };

        Self {
            tests,
            submissions,
            stats,
            question_stats,
        }
    }

    pub fn test_title(&self, test_id: i64) -> &str {
        self.tests
            .iter()
            .find(|t| t.id == test_id)
            .map(|t| t.title.as_str())
            .unwrap_or("Unknown test")
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn sort_submissions(submissions: &mut [Submission], sort: ResultsSort) {
    match sort {
        ResultsSort::Newest => submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at)),
        ResultsSort::Oldest => submissions.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at)),
        ResultsSort::Name => submissions.sort_by(|a, b| {
            a.student_name
                .to_lowercase()
                .cmp(&b.student_name.to_lowercase())
        }),
        ResultsSort::ScoreHigh => {
            submissions.sort_by(|a, b| b.percentage.total_cmp(&a.percentage))
        }
        ResultsSort::ScoreLow => submissions.sort_by(|a, b| a.percentage.total_cmp(&b.percentage)),
    }
}

pub fn summarize(submissions: &[Submission]) -> SummaryStats {
    if submissions.is_empty() {
        return SummaryStats::default();
    }
    let attempts = submissions.len();
    let total: f64 = submissions.iter().map(|s| s.percentage).sum();
    let passed = submissions
        .iter()
        .filter(|s| s.percentage >= PASSING_PERCENTAGE)
        .count();
    let unique_students = submissions
        .iter()
        .map(|s| s.student_name.trim().to_lowercase())
        .collect::<HashSet<_>>()
        .len();

    SummaryStats {
        attempts,
        average_percentage: round2(total / attempts as f64),
        pass_rate: round2(passed as f64 * 100.0 / attempts as f64),
        unique_students,
    }
}

/// Aggregates `detailed_answers` by ordinal. Submissions without details are skipped.
pub fn question_stats(submissions: &[Submission]) -> Vec<QuestionStat> {
    let mut by_ordinal: BTreeMap<i32, QuestionStat> = BTreeMap::new();
    for detail in submissions
        .iter()
        .filter_map(|s| s.detailed_answers.as_ref())
        .flat_map(|details| details.values())
    {
        let stat = by_ordinal
            .entry(detail.order_number)
            .or_insert_with(|| QuestionStat {
                order_number: detail.order_number,
                question_text: detail.question_text.clone(),
                answered: 0,
                correct: 0,
            });
        stat.answered += 1;
        if detail.is_correct {
            stat.correct += 1;
        }
    }
    by_ordinal.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submission::{AnswerMap, DetailedAnswer, DetailedAnswers};
    use chrono::{TimeZone, Utc};
    use sqlx::types::Json;

    fn submission(id: i64, name: &str, percentage: f64, day: u32) -> Submission {
        let mut details = DetailedAnswers::new();
        details.insert(
            10,
            DetailedAnswer {
                question_text: "Q1".to_string(),
                student_answer: "a".to_string(),
                correct_answer: "a".to_string(),
                is_correct: percentage >= 50.0,
                order_number: 1,
            },
        );
        Submission {
            id,
            test_id: 1,
            student_name: name.to_string(),
            answers: Json(AnswerMap::new()),
            detailed_answers: Some(Json(details)),
            score: 0,
            total_questions: 1,
            percentage,
            submitted_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        }
    }

    fn sample() -> Vec<Submission> {
        vec![
            submission(1, "Anna", 80.0, 1),
            submission(2, "bob", 40.0, 2),
            submission(3, "anna", 60.0, 3),
        ]
    }

    #[test]
    fn summary_counts_passes_and_unique_names() {
        let stats = summarize(&sample());
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.average_percentage, 60.0);
        assert_eq!(stats.pass_rate, 66.67);
        assert_eq!(stats.unique_students, 2);
    }

    #[test]
    fn empty_summary_is_zero() {
        assert_eq!(summarize(&[]), SummaryStats::default());
    }

    #[test]
    fn filters_by_student_and_date() {
        let query = ResultsQuery {
            student: Some(" ANN ".to_string()),
            from: NaiveDate::from_ymd_opt(2024, 3, 2),
            ..Default::default()
        };
        let report = ResultsReport::build(Vec::new(), sample(), &query);
        let ids: Vec<i64> = report.submissions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn sorts_by_score() {
        let mut subs = sample();
        sort_submissions(&mut subs, ResultsSort::ScoreHigh);
        let ids: Vec<i64> = subs.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);

        sort_submissions(&mut subs, ResultsSort::Oldest);
        let ids: Vec<i64> = subs.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn question_stats_only_for_a_selected_test() {
        let all = ResultsReport::build(Vec::new(), sample(), &ResultsQuery::default());
        assert!(all.question_stats.is_empty());

        let one = ResultsQuery {
            test_id: Some(1),
            ..Default::default()
        };
        let report = ResultsReport::build(Vec::new(), sample(), &one);
        assert_eq!(report.question_stats.len(), 1);
        let stat = &report.question_stats[0];
        assert_eq!((stat.answered, stat.correct), (3, 2));
        assert_eq!(stat.correct_percentage(), 66.67);
    }

    #[test]
    fn query_treats_blank_fields_as_unset() {
        let query: ResultsQuery =
            serde_json::from_value(serde_json::json!({"test_id": "", "from": "", "sort": "name"}))
                .unwrap();
        assert_eq!(query.test_id, None);
        assert_eq!(query.from, None);
        assert_eq!(query.sort, ResultsSort::Name);
    }
}
