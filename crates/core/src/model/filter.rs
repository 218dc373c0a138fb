use std::cmp::Ordering;

use crate::model::{CourseId, Difficulty, Question, TagName};

/// Criteria for listing questions. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub course: Option<CourseId>,
    pub difficulty: Option<Difficulty>,
    /// Matches when the question carries any of these tags.
    pub tags: Vec<TagName>,
    pub search_text: Option<String>,
}

impl QuestionFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn course(mut self, course: CourseId) -> Self {
        self.course = Some(course);
        self
    }

    #[must_use]
    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<TagName>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search_text = if text.trim().is_empty() { None } else { Some(text) };
        self
    }

    #[must_use]
    pub fn matches(&self, question: &Question) -> bool {
        if let Some(course) = &self.course {
            if &question.course_id != course {
                return false;
            }
        }

        if let Some(difficulty) = self.difficulty {
            if question.difficulty != difficulty {
                return false;
            }
        }

        if !self.tags.is_empty() && !self.tags.iter().any(|t| question.has_tag(t)) {
            return false;
        }

        if let Some(text) = &self.search_text {
            let needle = text.trim().to_lowercase();
            let hit = question.title.to_lowercase().contains(&needle)
                || question.content.to_lowercase().contains(&needle)
                || question
                    .tags
                    .iter()
                    .any(|t| t.as_str().to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Title,
    Difficulty,
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Ordering for question lists. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuestionSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl QuestionSort {
    /// Selecting the active field flips direction; a new field starts ascending.
    #[must_use]
    pub fn select(self, field: SortField) -> Self {
        if field == self.field {
            Self {
                field,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                field,
                direction: SortDirection::Asc,
            }
        }
    }

    pub fn apply(self, questions: &mut [Question]) {
        questions.sort_by(|a, b| {
            let ord = match self.field {
                SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
                SortField::Difficulty => a.difficulty.cmp(&b.difficulty),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            let ord = if ord == Ordering::Equal {
                a.id.cmp(&b.id)
            } else {
                ord
            };
            match self.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionDraft, QuestionId};
    use crate::time::fixed_now;

    fn question(id: &str, course: &str, difficulty: Difficulty, tags: &[&str], minutes_ago: i64) -> Question {
        QuestionDraft::new(
            CourseId::new(course).unwrap(),
            format!("Question {id}"),
            format!("Body of {id}"),
            difficulty,
        )
        .with_tags(tags.iter().map(|t| TagName::new(*t).unwrap()).collect())
        .validate(fixed_now() - chrono::Duration::minutes(minutes_ago))
        .unwrap()
        .assign_id(QuestionId::new(id).unwrap())
    }

    #[test]
    fn filter_requires_every_set_criterion() {
        let q = question("1", "algo", Difficulty::Hard, &["graphs"], 0);

        assert!(QuestionFilter::all().matches(&q));
        assert!(QuestionFilter::all()
            .course(CourseId::new("algo").unwrap())
            .difficulty(Difficulty::Hard)
            .matches(&q));
        assert!(!QuestionFilter::all()
            .course(CourseId::new("algo").unwrap())
            .difficulty(Difficulty::Easy)
            .matches(&q));
    }

    #[test]
    fn tag_filter_matches_any_tag() {
        let q = question("1", "algo", Difficulty::Hard, &["graphs", "bfs"], 0);
        let filter = QuestionFilter::all().tags(vec![
            TagName::new("dp").unwrap(),
            TagName::new("bfs").unwrap(),
        ]);
        assert!(filter.matches(&q));

        let miss = QuestionFilter::all().tags(vec![TagName::new("dp").unwrap()]);
        assert!(!miss.matches(&q));
    }

    #[test]
    fn search_is_case_insensitive_over_title_content_and_tags() {
        let q = question("7", "algo", Difficulty::Easy, &["Recursion"], 0);
        assert!(QuestionFilter::all().search("QUESTION 7").matches(&q));
        assert!(QuestionFilter::all().search("body").matches(&q));
        assert!(QuestionFilter::all().search("recur").matches(&q));
        assert!(!QuestionFilter::all().search("heap").matches(&q));
        assert_eq!(QuestionFilter::all().search("   ").search_text, None);
    }

    #[test]
    fn sort_defaults_to_newest_first() {
        let mut qs = vec![
            question("old", "a", Difficulty::Easy, &[], 30),
            question("new", "a", Difficulty::Easy, &[], 1),
        ];
        QuestionSort::default().apply(&mut qs);
        assert_eq!(qs[0].id.as_str(), "new");
    }

    #[test]
    fn selecting_sort_field_toggles_direction() {
        let sort = QuestionSort::default().select(SortField::Difficulty);
        assert_eq!(sort.direction, SortDirection::Asc);

        let mut qs = vec![
            question("1", "a", Difficulty::Expert, &[], 0),
            question("2", "a", Difficulty::Easy, &[], 0),
        ];
        sort.apply(&mut qs);
        assert_eq!(qs[0].difficulty, Difficulty::Easy);

        let flipped = sort.select(SortField::Difficulty);
        assert_eq!(flipped.direction, SortDirection::Desc);
        flipped.apply(&mut qs);
        assert_eq!(qs[0].difficulty, Difficulty::Expert);
    }
}
