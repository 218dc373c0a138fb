//! Exam setup parameters as carried in a query string.
//!
//! Recognized keys are `course`, `difficulty`, `duration` (minutes),
//! `topics` (comma separated) and `random`. Parsing never fails; turning the
//! parsed query into an `ExamConfig` is where required fields are enforced.

use mindlock_core::model::{CourseId, Difficulty, TagName};
use url::form_urlencoded;

use crate::error::ConfigError;

/// Duration used when the query has none, or an unusable one.
pub const DEFAULT_DURATION_MINUTES: u32 = 20;

/// Durations offered by the setup surface.
pub const DURATION_CHOICES: [u32; 3] = [20, 45, 90];

/// Longest exam accepted from a hand-written query.
pub const MAX_DURATION_MINUTES: u32 = 240;

/// Raw exam setup exactly as parsed from the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamQuery {
    pub course: Option<String>,
    pub difficulty: Option<String>,
    pub duration_minutes: u32,
    pub topics: Vec<String>,
    pub random: bool,
}

impl Default for ExamQuery {
    fn default() -> Self {
        Self {
            course: None,
            difficulty: None,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            topics: Vec::new(),
            random: false,
        }
    }
}

impl ExamQuery {
    /// Parse a query string such as `?course=algo&difficulty=hard&duration=45`.
    ///
    /// Unknown keys are ignored. When a key repeats, the last value wins.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let raw = raw.strip_prefix('?').unwrap_or(raw);

        let mut query = Self::default();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match &*key {
                "course" => query.course = non_blank(&value),
                "difficulty" => query.difficulty = non_blank(&value),
                "duration" => query.duration_minutes = parse_duration(&value),
                "topics" => query.topics = split_topics(&value),
                "random" => query.random = value == "true",
                _ => {}
            }
        }
        query
    }

    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    /// Encode back into a query string (without the leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if let Some(course) = &self.course {
            out.append_pair("course", course);
        }
        if let Some(difficulty) = &self.difficulty {
            out.append_pair("difficulty", difficulty);
        }
        out.append_pair("duration", &self.duration_minutes.to_string());
        if !self.topics.is_empty() {
            out.append_pair("topics", &self.topics.join(","));
        }
        out.append_pair("random", if self.random { "true" } else { "false" });
        out.finish()
    }

    /// Validate the query into a configuration a session can be built from.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the course or difficulty is missing or invalid,
    /// or when the duration is zero or longer than `MAX_DURATION_MINUTES`.
    pub fn into_config(self) -> Result<ExamConfig, ConfigError> {
        let course = CourseId::new(self.course.ok_or(ConfigError::MissingCourse)?)?;
        let difficulty = self
            .difficulty
            .ok_or(ConfigError::MissingDifficulty)?
            .parse::<Difficulty>()?;
        if self.duration_minutes == 0 || self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(ConfigError::DurationOutOfRange {
                minutes: self.duration_minutes,
                max: MAX_DURATION_MINUTES,
            });
        }
        let topics = self
            .topics
            .into_iter()
            .filter_map(|t| TagName::new(t).ok())
            .collect();

        Ok(ExamConfig {
            course,
            difficulty,
            duration_minutes: self.duration_minutes,
            topics,
            randomize: self.random,
        })
    }
}

/// Validated exam setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamConfig {
    pub course: CourseId,
    pub difficulty: Difficulty,
    pub duration_minutes: u32,
    /// Only narrows the question set when `randomize` is off.
    pub topics: Vec<TagName>,
    pub randomize: bool,
}

impl ExamConfig {
    #[must_use]
    pub fn new(course: CourseId, difficulty: Difficulty) -> Self {
        Self {
            course,
            difficulty,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            topics: Vec::new(),
            randomize: false,
        }
    }

    #[must_use]
    pub fn with_duration_minutes(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_topics(mut self, topics: Vec<TagName>) -> Self {
        self.topics = topics;
        self
    }

    #[must_use]
    pub fn randomized(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    /// The query string that reproduces this configuration.
    #[must_use]
    pub fn to_query(&self) -> ExamQuery {
        ExamQuery {
            course: Some(self.course.to_string()),
            difficulty: Some(self.difficulty.as_str().to_string()),
            duration_minutes: self.duration_minutes,
            topics: self.topics.iter().map(|t| t.as_str().to_string()).collect(),
            random: self.randomize,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Zero means "not chosen" and falls back to `DEFAULT_DURATION_MINUTES`.
#[must_use]
pub fn normalize_duration(minutes: u32) -> u32 {
    if minutes == 0 {
        DEFAULT_DURATION_MINUTES
    } else {
        minutes
    }
}

fn parse_duration(value: &str) -> u32 {
    value
        .trim()
        .parse::<u32>()
        .map_or(DEFAULT_DURATION_MINUTES, normalize_duration)
}

fn split_topics(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
