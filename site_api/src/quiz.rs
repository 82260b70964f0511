//! JSON file backed quiz score store with all-time and daily leaderboards.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tokio::sync::Mutex;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::QuizError;

const MAX_NAME_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Kept as submitted, so whole numbers stay integers on the wire.
    pub score: Number,
    pub total: Number,
    pub percentage: u32,
    /// RFC 3339, UTC.
    pub timestamp: String,
    /// `YYYY-MM-DD` of `timestamp`.
    pub date: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScoresFile {
    #[serde(default)]
    scores: Vec<QuizScore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardStats {
    pub total_attempts: usize,
    pub today_attempts: usize,
    pub average_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaderboard {
    AllTime,
    Daily,
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub score: Number,
    pub total: Number,
    pub name: Option<String>,
}

impl NewScore {
    /// Any JSON number is accepted for `score` and `total`. A `name` key
    /// that is present must hold a string, `null` included.
    pub fn from_json(body: &Value) -> Result<Self, QuizError> {
        let (Some(Value::Number(score)), Some(Value::Number(total))) = (body.get("score"), body.get("total"))
        else {
            return Err(QuizError::NotNumbers);
        };
        let (Some(points), Some(out_of)) = (score.as_f64(), total.as_f64()) else {
            return Err(QuizError::NotNumbers);
        };
        if points < 0.0 || points > out_of || out_of <= 0.0 {
            return Err(QuizError::OutOfRange);
        }
        let name = match body.get("name") {
            None => None,
            Some(Value::String(name)) => sanitize_name(name),
            Some(_) => return Err(QuizError::InvalidName),
        };
        Ok(Self {
            score: score.clone(),
            total: total.clone(),
            name,
        })
    }
}

fn regex_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

/// Trims, keeps the first 50 characters, then strips anything tag shaped.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let cut: String = raw.trim().chars().take(MAX_NAME_CHARS).collect();
    let cleaned = regex_tag().replace_all(&cut, "").trim().to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

fn leaderboard_order(a: &QuizScore, b: &QuizScore) -> Ordering {
    b.percentage
        .cmp(&a.percentage)
        .then_with(|| b.timestamp.cmp(&a.timestamp))
}

fn percentage(score: &Number, total: &Number) -> u32 {
    match (score.as_f64(), total.as_f64()) {
        (Some(score), Some(total)) if total > 0.0 => (score / total * 100.0).round() as u32,
        _ => 0,
    }
}

pub struct QuizStore {
    path: PathBuf,
    max_scores: usize,
    /// Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl QuizStore {
    pub fn new(path: impl Into<PathBuf>, max_scores: usize) -> Self {
        Self {
            path: path.into(),
            max_scores,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<QuizScore>, QuizError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice::<ScoresFile>(&bytes)?.scores),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => {
                error!(path = %self.path.display(), error = %err, "failed to read quiz scores");
                Err(QuizError::Read(err))
            }
        }
    }

    async fn write(&self, scores: Vec<QuizScore>) -> Result<(), QuizError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(QuizError::Write)?;
        }
        let json = serde_json::to_vec_pretty(&ScoresFile { scores })?;
        tokio::fs::write(&self.path, json).await.map_err(QuizError::Write)
    }

    /// Prepends the score and trims the file to the newest `max_scores`.
    pub async fn save(&self, entry: NewScore, now: DateTime<Utc>) -> Result<QuizScore, QuizError> {
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let suffix = Uuid::new_v4().simple().to_string();
        let saved = QuizScore {
            id: format!("{}-{}", now.timestamp_millis(), &suffix[..7]),
            percentage: percentage(&entry.score, &entry.total),
            name: entry.name,
            score: entry.score,
            total: entry.total,
            timestamp,
            date: now.format("%Y-%m-%d").to_string(),
        };

        let _guard = self.lock.lock().await;
        let mut scores = self.read().await?;
        scores.insert(0, saved.clone());
        scores.truncate(self.max_scores);
        self.write(scores).await?;
        debug!(id = %saved.id, percentage = saved.percentage, "quiz score saved");
        Ok(saved)
    }

    pub async fn leaderboard(
        &self,
        board: Leaderboard,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<QuizScore>, QuizError> {
        let today = now.format("%Y-%m-%d").to_string();
        let mut scores = self.read().await?;
        if board == Leaderboard::Daily {
            scores.retain(|entry| entry.date == today);
        }
        scores.sort_by(leaderboard_order);
        scores.truncate(limit);
        Ok(scores)
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<LeaderboardStats, QuizError> {
        let today = now.format("%Y-%m-%d").to_string();
        let scores = self.read().await?;
        let average_score = if scores.is_empty() {
            0
        } else {
            let sum: u64 = scores.iter().map(|entry| u64::from(entry.percentage)).sum();
            (sum as f64 / scores.len() as f64).round() as u32
        };
        Ok(LeaderboardStats {
            total_attempts: scores.len(),
            today_attempts: scores.iter().filter(|entry| entry.date == today).count(),
            average_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).single().expect("valid date")
    }

    fn entry(score: u32, total: u32, name: &str) -> NewScore {
        NewScore {
            score: score.into(),
            total: total.into(),
            name: Some(name.into()),
        }
    }

    fn store(dir: &tempfile::TempDir, max: usize) -> QuizStore {
        QuizStore::new(dir.path().join("nested").join("quiz-scores.json"), max)
    }

    #[test]
    fn validates_submissions() {
        let ok = NewScore::from_json(&json!({"score": 8, "total": 10, "name": "  <b>Ada</b> "}))
            .expect("valid");
        assert_eq!(ok, entry(8, 10, "Ada"));

        let cases = [
            (json!({"score": "8", "total": 10}), "Invalid score or total"),
            (json!({"total": 10}), "Invalid score or total"),
            (json!({"score": null, "total": 10}), "Invalid score or total"),
            (json!({"score": 11, "total": 10}), "Score must be between 0 and total"),
            (json!({"score": -1, "total": 10}), "Score must be between 0 and total"),
            (json!({"score": 0, "total": 0}), "Score must be between 0 and total"),
            (json!({"score": 1, "total": 2, "name": 7}), "Name must be a string"),
            (json!({"score": 1, "total": 2, "name": null}), "Name must be a string"),
            (json!({"score": 11, "total": 10, "name": null}), "Score must be between 0 and total"),
        ];
        for (body, message) in cases {
            let err = NewScore::from_json(&body).unwrap_err();
            assert_eq!(err.to_string(), message, "{body}");
        }
    }

    #[test]
    fn fractional_scores_are_accepted() {
        let half = NewScore::from_json(&json!({"score": 7.5, "total": 10})).expect("fractional");
        assert_eq!(half.score.as_f64(), Some(7.5));
        assert_eq!(half.name, None);
        assert_eq!(percentage(&half.score, &half.total), 75);
        assert!(NewScore::from_json(&json!({"score": 10.5, "total": 10})).is_err());
    }

    #[test]
    fn names_are_cut_then_stripped() {
        assert_eq!(sanitize_name("   "), None);
        assert_eq!(sanitize_name("<script></script>"), None);
        let long = "x".repeat(80);
        assert_eq!(sanitize_name(&long).map(|n| n.chars().count()), Some(50));
        assert_eq!(sanitize_name("Zoë <i>O'Connor</i>").as_deref(), Some("Zoë O'Connor"));
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir, 10);
        let board = store.leaderboard(Leaderboard::AllTime, 10, at(1, 12)).await.expect("board");
        assert!(board.is_empty());
        let stats = store.stats(at(1, 12)).await.expect("stats");
        assert_eq!(
            stats,
            LeaderboardStats {
                total_attempts: 0,
                today_attempts: 0,
                average_score: 0
            }
        );
    }

    #[tokio::test]
    async fn saves_newest_first_and_caps_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir, 3);
        for minute in 0..5 {
            let now = at(2, 9) + Duration::minutes(minute);
            store.save(entry(minute as u32, 4, "p"), now).await.expect("save");
        }
        let raw: Value = serde_json::from_slice(&std::fs::read(store.path()).expect("file")).expect("json");
        let scores = raw["scores"].as_array().expect("scores");
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0]["score"], 4);
        assert_eq!(scores[2]["score"], 2);
    }

    #[tokio::test]
    async fn saved_score_carries_derived_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir, 10);
        let saved = store
            .save(NewScore { score: 2.into(), total: 3.into(), name: None }, at(5, 23))
            .await
            .expect("save");
        assert_eq!(saved.percentage, 67);
        assert_eq!(saved.date, "2026-03-05");
        assert_eq!(saved.timestamp, "2026-03-05T23:00:00.000Z");
        assert!(saved.id.starts_with(&at(5, 23).timestamp_millis().to_string()));
        let json = serde_json::to_value(&saved).expect("json");
        assert!(json.get("name").is_none());
        assert_eq!(json["score"], json!(2));
    }

    #[tokio::test]
    async fn leaderboards_rank_by_percentage_then_recency() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir, 100);
        store.save(entry(9, 10, "yesterday"), at(9, 8)).await.expect("save");
        store.save(entry(7, 10, "early"), at(10, 8)).await.expect("save");
        store.save(entry(7, 10, "late"), at(10, 9)).await.expect("save");
        store.save(entry(10, 10, "best"), at(10, 10)).await.expect("save");

        let names = |board: Vec<QuizScore>| -> Vec<String> {
            board.into_iter().filter_map(|s| s.name).collect()
        };
        let all_time = store.leaderboard(Leaderboard::AllTime, 10, at(10, 12)).await.expect("all");
        assert_eq!(names(all_time), ["best", "yesterday", "late", "early"]);

        let daily = store.leaderboard(Leaderboard::Daily, 2, at(10, 12)).await.expect("daily");
        assert_eq!(names(daily), ["best", "late"]);

        let stats = store.stats(at(10, 12)).await.expect("stats");
        assert_eq!(stats.total_attempts, 4);
        assert_eq!(stats.today_attempts, 3);
        assert_eq!(stats.average_score, 83);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("quiz-scores.json");
        std::fs::write(&path, "{not json").expect("write");
        let store = QuizStore::new(path, 10);
        let err = store.stats(at(1, 1)).await.unwrap_err();
        assert!(matches!(err, QuizError::Corrupt(_)));
    }
}
