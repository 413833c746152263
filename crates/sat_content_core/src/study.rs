//! crates/sat_content_core/src/study.rs
//!
//! The recommendation aggregator: turns a user's recent practice history
//! into a per-topic accuracy summary and asks the AI collaborator for a
//! structured study plan. Nothing here is cached or persisted; every call
//! recomputes the plan from the current history.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{PracticeAttempt, StudyPlan};
use crate::error::WorkflowError;
use crate::ports::{DataStoreService, StudyPlanService};

/// How many of the newest attempts are considered.
pub const HISTORY_WINDOW: u32 = 50;

/// The minimum number of recorded attempts required for a meaningful plan.
pub const MIN_HISTORY: usize = 5;

/// Computes personalized study plans from practice history.
pub struct StudyPlanner {
    store: Arc<dyn DataStoreService>,
    generator: Arc<dyn StudyPlanService>,
}

impl StudyPlanner {
    pub fn new(store: Arc<dyn DataStoreService>, generator: Arc<dyn StudyPlanService>) -> Self {
        Self { store, generator }
    }

    /// Generates a study plan for the user, or fails with
    /// `InsufficientHistory` when fewer than [`MIN_HISTORY`] attempts exist.
    pub async fn generate_study_plan(&self, user_id: &str) -> Result<StudyPlan, WorkflowError> {
        let history = self.store.recent_attempts(user_id, HISTORY_WINDOW).await?;
        info!(user = user_id, attempts = history.len(), "fetched practice history");

        if history.len() < MIN_HISTORY {
            return Err(WorkflowError::InsufficientHistory {
                found: history.len(),
            });
        }

        let summary = summarize_history(&history);
        let plan = self
            .generator
            .draft_study_plan(&summary)
            .await
            .map_err(WorkflowError::from_generation)?;

        info!(
            user = user_id,
            strengths = plan.strengths.len(),
            weaknesses = plan.weaknesses.len(),
            "study plan generated"
        );
        Ok(plan)
    }
}

/// Per-topic tally of correct and total attempts.
#[derive(Debug, Default, Clone, Copy)]
struct TopicTally {
    correct: u32,
    total: u32,
}

/// Groups attempts by `"{subject} - {type}"` and renders one summary line per
/// group for the AI prompt. Attempts whose question snapshot is missing the
/// subject or type are skipped and logged, never counted and never fatal.
pub fn summarize_history(history: &[PracticeAttempt]) -> String {
    let mut groups: BTreeMap<String, TopicTally> = BTreeMap::new();

    for attempt in history {
        let subject = attempt.question_data.subject;
        let kind = attempt.question_data.kind.as_deref();
        let (Some(subject), Some(kind)) = (subject, kind) else {
            warn!(
                user = attempt.user_id.as_str(),
                "skipping practice attempt with incomplete question snapshot"
            );
            continue;
        };

        let tally = groups.entry(format!("{} - {}", subject, kind)).or_default();
        tally.total += 1;
        if attempt.is_correct {
            tally.correct += 1;
        }
    }

    groups
        .iter()
        .map(|(key, tally)| {
            format!(
                "{}: {}% accuracy ({}/{} correct)",
                key,
                accuracy_percent(tally.correct, tally.total),
                tally.correct,
                tally.total
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Accuracy as a whole percentage, rounded to the nearest percent.
pub fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Subject;
    use crate::testing::{sample_attempt, FakeGenerator, FakeStore};

    fn planner(store: &Arc<FakeStore>, generator: &Arc<FakeGenerator>) -> StudyPlanner {
        StudyPlanner::new(store.clone(), generator.clone())
    }

    #[tokio::test]
    async fn four_attempts_are_not_enough() {
        let store = Arc::new(FakeStore::default());
        for _ in 0..4 {
            store.seed_attempt(sample_attempt("student@example.com", Subject::Math, "algebra", true));
        }
        let generator = Arc::new(FakeGenerator::default());
        let planner = planner(&store, &generator);

        let result = planner.generate_study_plan("student@example.com").await;
        assert!(matches!(
            result,
            Err(WorkflowError::InsufficientHistory { found: 4 })
        ));
        assert_eq!(generator.total_calls(), 0);
    }

    #[tokio::test]
    async fn exactly_five_attempts_proceed() {
        let store = Arc::new(FakeStore::default());
        for _ in 0..5 {
            store.seed_attempt(sample_attempt("student@example.com", Subject::Math, "algebra", true));
        }
        let generator = Arc::new(FakeGenerator::default());
        let planner = planner(&store, &generator);

        let plan = planner
            .generate_study_plan("student@example.com")
            .await
            .unwrap();
        assert!(!plan.daily_plan.is_empty());
        assert_eq!(generator.total_calls(), 1);
    }

    #[tokio::test]
    async fn summary_reaches_the_generator() {
        let store = Arc::new(FakeStore::default());
        store.seed_attempt(sample_attempt("s@example.com", Subject::Math, "algebra", true));
        store.seed_attempt(sample_attempt("s@example.com", Subject::Math, "algebra", false));
        store.seed_attempt(sample_attempt("s@example.com", Subject::Math, "algebra", true));
        store.seed_attempt(sample_attempt("s@example.com", Subject::Reading, "main_idea", false));
        store.seed_attempt(sample_attempt("s@example.com", Subject::Writing, "grammar", true));
        let generator = Arc::new(FakeGenerator::default());
        let planner = planner(&store, &generator);

        planner.generate_study_plan("s@example.com").await.unwrap();

        let summary = generator.last_summary().unwrap();
        assert!(summary.contains("math - algebra: 67% accuracy (2/3 correct)"));
        assert!(summary.contains("reading - main_idea: 0% accuracy (0/1 correct)"));
        assert!(summary.contains("writing - grammar: 100% accuracy (1/1 correct)"));
    }

    #[test]
    fn accuracy_rounds_to_nearest_percent() {
        assert_eq!(accuracy_percent(2, 3), 67);
        assert_eq!(accuracy_percent(1, 3), 33);
        assert_eq!(accuracy_percent(1, 2), 50);
        assert_eq!(accuracy_percent(0, 0), 0);
        assert_eq!(accuracy_percent(5, 5), 100);
    }

    #[test]
    fn incomplete_snapshots_are_skipped_not_counted() {
        let mut complete = sample_attempt("s@example.com", Subject::Math, "algebra", true);
        let mut incomplete = sample_attempt("s@example.com", Subject::Math, "algebra", false);
        incomplete.question_data.kind = None;
        complete.question_data.id = None; // a missing id alone does not disqualify

        let summary = summarize_history(&[complete, incomplete]);
        assert_eq!(summary, "math - algebra: 100% accuracy (1/1 correct)");
    }
}
