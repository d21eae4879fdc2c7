use std::collections::HashMap;
use std::fmt;

/// Non-scored placeholder, always the last activity.
pub const OTHER_ACTIVITY: &str = "Other";
/// Cap on the activity list, placeholder included.
pub const MAX_ACTIVITIES: usize = 6;
pub const DEFAULT_ACTIVITIES: [&str; 3] = ["Gym", "Running", "Home workout"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Yes,
    No,
}

impl Response {
    pub fn label(&self) -> &'static str {
        match self {
            Response::Yes => "Yes",
            Response::No => "No",
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Error 404: Activities not found")]
    NoActivities,
}

/// Outcome of [`ActivityTracker::evaluate`], best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Incomplete { remaining: usize },
    PerfectDay,
    GreatEffort,
    DoingWell,
    KeepMoving,
    WarmingUp,
    GoodStart,
    GetMoving,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Incomplete { remaining } => write!(
                f,
                "You still have {} responses to fill in. The final evaluation may not be accurate.",
                remaining
            ),
            Verdict::PerfectDay => f.write_str("Perfect day! You did it all!"),
            Verdict::GreatEffort => f.write_str("Very good effort!"),
            Verdict::DoingWell => f.write_str("You're doing really well!"),
            Verdict::KeepMoving => f.write_str("Well done! Move a little more!"),
            Verdict::WarmingUp => f.write_str("Get moving a bit, start warming up!"),
            Verdict::GoodStart => f.write_str("Good start, but you can do better!"),
            Verdict::GetMoving => f.write_str("Start moving, time for action!"),
        }
    }
}

/// Today's activities and the yes/no answer recorded for each.
///
/// The list holds at most [`MAX_ACTIVITIES`] unique labels and always ends
/// with [`OTHER_ACTIVITY`]. Neither the list nor the answers are persisted.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    activities: Vec<String>,
    responses: HashMap<String, Response>,
}

impl Default for ActivityTracker {
    fn default() -> Self {
        ActivityTracker::new(DEFAULT_ACTIVITIES)
    }
}

impl ActivityTracker {
    /// Labels are added in order through [`add_activity`](Self::add_activity),
    /// so blanks, duplicates and overflow are dropped.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tracker = ActivityTracker {
            activities: vec![OTHER_ACTIVITY.to_string()],
            responses: HashMap::new(),
        };
        for label in labels {
            tracker.add_activity(label.as_ref());
        }
        tracker
    }

    pub fn activities(&self) -> &[String] {
        &self.activities
    }

    pub fn scored_activities(&self) -> impl Iterator<Item = &str> {
        self.activities
            .iter()
            .map(String::as_str)
            .filter(|label| !is_placeholder(label))
    }

    pub fn can_add(&self) -> bool {
        self.activities.len() < MAX_ACTIVITIES
    }

    pub fn add_activity(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.contains(label) || !self.can_add() {
            return false;
        }
        let at = self.activities.len() - 1;
        self.activities.insert(at, label.to_string());
        true
    }

    pub fn remove_activity(&mut self, label: &str) -> bool {
        if is_placeholder(label) || !self.contains(label) {
            return false;
        }
        self.activities.retain(|a| a != label);
        self.responses.remove(label);
        true
    }

    pub fn set_response(&mut self, label: &str, value: Response) -> bool {
        if is_placeholder(label) || !self.contains(label) {
            return false;
        }
        self.responses.insert(label.to_string(), value);
        true
    }

    pub fn clear_response(&mut self, label: &str) -> bool {
        self.responses.remove(label).is_some()
    }

    pub fn response(&self, label: &str) -> Option<Response> {
        self.responses.get(label).copied()
    }

    /// Recomputed from scratch on every call.
    pub fn evaluate(&self) -> Result<Verdict, EvaluationError> {
        let total = self.scored_activities().count();
        if total == 0 {
            return Err(EvaluationError::NoActivities);
        }
        let answers = self
            .scored_activities()
            .filter_map(|label| self.response(label))
            .collect::<Vec<_>>();
        if answers.len() < total {
            return Ok(Verdict::Incomplete {
                remaining: total - answers.len(),
            });
        }
        let score = answers.iter().filter(|r| **r == Response::Yes).count();
        Ok(verdict_for(score, total))
    }

    fn contains(&self, label: &str) -> bool {
        self.activities.iter().any(|a| a == label)
    }
}

fn verdict_for(score: usize, total: usize) -> Verdict {
    let cut = |k: usize| total.saturating_sub(k).max(1);
    if score == total {
        Verdict::PerfectDay
    } else if score >= cut(1) {
        Verdict::GreatEffort
    } else if score >= cut(2) {
        Verdict::DoingWell
    } else if score >= cut(3) {
        Verdict::KeepMoving
    } else if score >= 2 {
        Verdict::WarmingUp
    } else if score >= 1 {
        Verdict::GoodStart
    } else {
        Verdict::GetMoving
    }
}

fn is_placeholder(label: &str) -> bool {
    label == OTHER_ACTIVITY
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answered(labels: &[&str], yes: usize) -> ActivityTracker {
        let mut tracker = ActivityTracker::new(labels);
        for (idx, label) in labels.iter().enumerate() {
            let value = if idx < yes { Response::Yes } else { Response::No };
            assert!(tracker.set_response(label, value));
        }
        tracker
    }

    #[test]
    fn default_list_ends_with_placeholder() {
        let tracker = ActivityTracker::default();
        assert_eq!(
            tracker.activities(),
            ["Gym", "Running", "Home workout", OTHER_ACTIVITY]
        );
        assert_eq!(tracker.scored_activities().count(), 3);
    }

    #[test]
    fn add_activity_inserts_before_placeholder_until_cap() {
        let mut tracker = ActivityTracker::default();
        assert!(tracker.add_activity("  Yoga "));
        assert!(tracker.add_activity("Swim"));
        assert_eq!(tracker.activities().len(), MAX_ACTIVITIES);
        assert!(!tracker.can_add());
        assert!(!tracker.add_activity("Climb"));
        assert_eq!(tracker.activities().len(), MAX_ACTIVITIES);
        assert_eq!(tracker.activities()[3], "Yoga");
        assert_eq!(tracker.activities().last().unwrap(), OTHER_ACTIVITY);
    }

    #[test]
    fn add_activity_rejects_blank_and_duplicate_labels() {
        let mut tracker = ActivityTracker::default();
        assert!(!tracker.add_activity("   "));
        assert!(!tracker.add_activity("Gym"));
        assert!(!tracker.add_activity(OTHER_ACTIVITY));
        assert_eq!(tracker.activities().len(), 4);
    }

    #[test]
    fn remove_activity_drops_its_response() {
        let mut tracker = ActivityTracker::default();
        tracker.set_response("Gym", Response::Yes);
        assert!(tracker.remove_activity("Gym"));
        assert_eq!(tracker.response("Gym"), None);
        assert!(!tracker.remove_activity("Gym"));
        assert!(!tracker.remove_activity(OTHER_ACTIVITY));
        assert_eq!(tracker.activities().last().unwrap(), OTHER_ACTIVITY);
        // Re-adding starts unanswered.
        assert!(tracker.add_activity("Gym"));
        assert_eq!(tracker.response("Gym"), None);
    }

    #[test]
    fn responses_overwrite_and_ignore_placeholder() {
        let mut tracker = ActivityTracker::default();
        assert!(tracker.set_response("Running", Response::No));
        assert!(tracker.set_response("Running", Response::Yes));
        assert_eq!(tracker.response("Running"), Some(Response::Yes));
        assert!(!tracker.set_response(OTHER_ACTIVITY, Response::Yes));
        assert!(!tracker.set_response("Chess", Response::Yes));
        assert!(tracker.clear_response("Running"));
        assert_eq!(tracker.response("Running"), None);
    }

    #[test]
    fn evaluate_without_activities_is_an_error() {
        let mut tracker = ActivityTracker::new(Vec::<String>::new());
        assert_eq!(tracker.evaluate(), Err(EvaluationError::NoActivities));
        assert_eq!(
            EvaluationError::NoActivities.to_string(),
            "Error 404: Activities not found"
        );
        tracker.add_activity("Gym");
        tracker.remove_activity("Gym");
        assert_eq!(tracker.evaluate(), Err(EvaluationError::NoActivities));
    }

    #[test]
    fn evaluate_reports_outstanding_responses() {
        let labels = ["Gym", "Running", "Walk", "Stretch"];
        let mut tracker = ActivityTracker::new(labels);
        tracker.set_response("Gym", Response::Yes);
        tracker.set_response("Walk", Response::No);
        let verdict = tracker.evaluate().unwrap();
        assert_eq!(verdict, Verdict::Incomplete { remaining: 2 });
        assert!(verdict.to_string().contains("2 responses"));
    }

    #[test]
    fn evaluate_tiers_for_four_activities() {
        let labels = ["Gym", "Running", "Walk", "Stretch"];
        let expected = [
            (4, Verdict::PerfectDay),
            (3, Verdict::GreatEffort),
            (2, Verdict::DoingWell),
            (1, Verdict::KeepMoving),
            (0, Verdict::GetMoving),
        ];
        for (yes, verdict) in expected {
            assert_eq!(answered(&labels, yes).evaluate(), Ok(verdict), "score {}", yes);
        }
    }

    #[test]
    fn evaluate_lower_tiers_for_five_activities() {
        let labels = ["A", "B", "C", "D", "E"];
        assert_eq!(answered(&labels, 2).evaluate(), Ok(Verdict::KeepMoving));
        assert_eq!(answered(&labels, 1).evaluate(), Ok(Verdict::GoodStart));
        assert_eq!(answered(&labels, 0).evaluate(), Ok(Verdict::GetMoving));
    }

    #[test]
    fn cut_points_never_drop_below_one() {
        assert_eq!(verdict_for(1, 1), Verdict::PerfectDay);
        assert_eq!(verdict_for(0, 1), Verdict::GetMoving);
        assert_eq!(verdict_for(1, 2), Verdict::GreatEffort);
        assert_eq!(verdict_for(0, 2), Verdict::GetMoving);
        assert_eq!(verdict_for(2, 5), Verdict::KeepMoving);
        assert_eq!(verdict_for(5, 8), Verdict::KeepMoving);
        assert_eq!(verdict_for(3, 8), Verdict::WarmingUp);
        assert_eq!(verdict_for(1, 8), Verdict::GoodStart);
    }
}
