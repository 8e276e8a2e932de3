//! Weekly study plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DrillError;
use crate::store::{Slot, SlotStore};

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Two activities per weekday: (title, content, duration).
const WEEKLY_TEMPLATE: [[(&str, &str, &str); 2]; 7] = [
    [
        ("Vocabulary", "Learn 20 core words", "10 min"),
        ("Grammar drill", "Review basic grammar", "15 min"),
    ],
    [
        ("Listening", "Listen to two short passages", "15 min"),
        ("Speaking", "Shadow a native recording", "10 min"),
    ],
    [
        ("Reading", "Read one article", "20 min"),
        ("Writing", "Write a short paragraph", "15 min"),
    ],
    [
        ("Vocabulary review", "Review this week's words", "10 min"),
        ("Grammar consolidation", "Work through grammar exercises", "15 min"),
    ],
    [
        ("Advanced listening", "Listen to one longer passage", "20 min"),
        ("Conversation", "Role-play a scenario dialogue", "15 min"),
    ],
    [
        ("Mock test", "Complete one practice test", "40 min"),
        ("Mistake review", "Go through this week's error book", "20 min"),
    ],
    [
        ("Weekly summary", "Summarize what you learned", "30 min"),
        ("Next week", "Plan next week's study", "15 min"),
    ],
];

const NEW_ACTIVITY_TITLE: &str = "New activity";
const NEW_ACTIVITY_CONTENT: &str = "Activity details";
const NEW_ACTIVITY_DURATION: &str = "10 min";

/// What the learner tells us about themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub language: String,
    pub level: String,
    pub scenarios: Vec<String>,
    /// Daily study time, e.g. "30 min/day".
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u32,
    pub title: String,
    pub content: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: String,
    pub activities: Vec<Activity>,
}

/// Editable activity fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityField {
    Title,
    Content,
    Duration,
}

/// A seven-day plan generated from a [`LearnerProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub id: String,
    pub language: String,
    pub level: String,
    pub scenarios: Vec<String>,
    pub duration: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub weekly_plan: Vec<DayPlan>,
}

impl StudyPlan {
    pub fn generate(profile: &LearnerProfile, now: DateTime<Utc>) -> Self {
        let weekly_plan = WEEKDAYS
            .iter()
            .zip(WEEKLY_TEMPLATE.iter())
            .map(|(day, activities)| DayPlan {
                day: day.to_string(),
                activities: activities
                    .iter()
                    .zip(1..)
                    .map(|((title, content, duration), id)| Activity {
                        id,
                        title: title.to_string(),
                        content: content.to_string(),
                        duration: duration.to_string(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            language: profile.language.clone(),
            level: profile.level.clone(),
            scenarios: profile.scenarios.clone(),
            duration: profile.duration.clone(),
            created_at: now,
            updated_at: now,
            weekly_plan,
        }
    }

    /// Append a default activity to a day. Returns its id, or `None` for an
    /// unknown day.
    pub fn add_activity(&mut self, day_index: usize) -> Option<u32> {
        let day = self.weekly_plan.get_mut(day_index)?;
        let id = day.activities.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        day.activities.push(Activity {
            id,
            title: NEW_ACTIVITY_TITLE.into(),
            content: NEW_ACTIVITY_CONTENT.into(),
            duration: NEW_ACTIVITY_DURATION.into(),
        });
        Some(id)
    }

    pub fn remove_activity(&mut self, day_index: usize, activity_index: usize) -> Option<Activity> {
        let day = self.weekly_plan.get_mut(day_index)?;
        (activity_index < day.activities.len()).then(|| day.activities.remove(activity_index))
    }

    /// Change one field of an activity. Returns whether the activity exists.
    pub fn update_activity(
        &mut self,
        day_index: usize,
        activity_index: usize,
        field: ActivityField,
        value: impl Into<String>,
    ) -> bool {
        let Some(activity) = self
            .weekly_plan
            .get_mut(day_index)
            .and_then(|d| d.activities.get_mut(activity_index))
        else {
            return false;
        };
        let value = value.into();
        match field {
            ActivityField::Title => activity.title = value,
            ActivityField::Content => activity.content = value,
            ActivityField::Duration => activity.duration = value,
        }
        true
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Read the stored plan, if there is one.
    pub fn load(store: &SlotStore) -> Option<Self> {
        store.load::<Option<StudyPlan>>(Slot::StudyPlan)
    }

    /// Stamp `updated_at` and persist the plan.
    pub fn save(&mut self, store: &SlotStore, now: DateTime<Utc>) -> Result<(), DrillError> {
        self.touch(now);
        store.save(Slot::StudyPlan, &*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn profile() -> LearnerProfile {
        LearnerProfile {
            language: "Spanish".into(),
            level: "beginner".into(),
            scenarios: vec!["travel".into(), "daily conversation".into()],
            duration: "30 min/day".into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn generates_seven_days_of_two_activities() {
        let plan = StudyPlan::generate(&profile(), now());
        assert_eq!(plan.weekly_plan.len(), 7);
        assert_eq!(plan.weekly_plan[0].day, "Monday");
        assert_eq!(plan.weekly_plan[6].day, "Sunday");
        assert!(plan.weekly_plan.iter().all(|d| d.activities.len() == 2));
        assert_eq!(plan.weekly_plan[2].activities[1].id, 2);
        assert_eq!(plan.language, "Spanish");
        assert_eq!(plan.created_at, plan.updated_at);
    }

    #[test]
    fn add_remove_update_activities() {
        let mut plan = StudyPlan::generate(&profile(), now());
        assert_eq!(plan.add_activity(0), Some(3));
        assert_eq!(plan.weekly_plan[0].activities[2].title, NEW_ACTIVITY_TITLE);
        assert_eq!(plan.add_activity(9), None);

        let removed = plan.remove_activity(0, 0).unwrap();
        assert_eq!(removed.title, "Vocabulary");
        assert!(plan.remove_activity(0, 5).is_none());
        assert_eq!(plan.add_activity(0), Some(4));

        assert!(plan.update_activity(1, 0, ActivityField::Duration, "25 min"));
        assert_eq!(plan.weekly_plan[1].activities[0].duration, "25 min");
        assert!(!plan.update_activity(1, 7, ActivityField::Title, "x"));
    }

    #[test]
    fn save_touches_and_persists() {
        let store = SlotStore::in_memory();
        assert!(StudyPlan::load(&store).is_none());

        let mut plan = StudyPlan::generate(&profile(), now());
        let later = now() + Duration::hours(2);
        plan.save(&store, later).unwrap();

        let loaded = StudyPlan::load(&store).unwrap();
        assert_eq!(loaded.updated_at, later);
        assert_eq!(loaded.created_at, now());
        assert_eq!(loaded, plan);
    }

    #[test]
    fn plan_json_uses_camel_case() {
        let plan = StudyPlan::generate(&profile(), now());
        let json = serde_json::to_value(&plan).unwrap();
        assert!(json.get("weeklyPlan").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
