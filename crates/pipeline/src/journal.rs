//! Journal entry lifecycle, public sharing, and mood trends.
//!
//! Writes classify and encrypt before opening a transaction, so a failed
//! classification or a dropped future leaves no rows behind.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ouramind_core::cipher::EntryCipher;
use ouramind_core::classifier::{classify_with_timeout, EmotionClassifier};
use ouramind_core::emotion::{
    select_dominant, DominantEmotion, Emotion, EmotionScores, DEFAULT_LIMIT, DEFAULT_THRESHOLD,
};
use ouramind_core::error::CoreError;
use ouramind_core::journal::validate_entry_content;
use ouramind_core::share::{generate_public_token, is_well_formed_token};
use ouramind_core::suggestion::suggest;
use ouramind_core::trend::{bucket_by_day, DateRange, ScoreSample, TrendPoint};
use ouramind_core::types::{DbId, EntryDate};
use ouramind_db::models::journal_entry::{JournalEntry, StoredScore};
use ouramind_db::models::reflection_tool::ReflectionTool;
use ouramind_db::repositories::{EmotionScoreRepo, JournalEntryRepo, ReflectionToolRepo};
use serde::Serialize;
use sqlx::PgPool;

use crate::config::DEFAULT_CLASSIFY_TIMEOUT_SECS;
use crate::error::{not_found, PipelineResult};

const ENTRY: &str = "JournalEntry";
const PUBLIC_ENTRY: &str = "PublicEntry";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Classification bounds and the dominant-emotion selection policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JournalSettings {
    pub classify_timeout: Duration,
    pub emotion_threshold: f64,
    pub emotion_limit: usize,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            classify_timeout: Duration::from_secs(DEFAULT_CLASSIFY_TIMEOUT_SECS),
            emotion_threshold: DEFAULT_THRESHOLD,
            emotion_limit: DEFAULT_LIMIT,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CreatedEntry {
    pub entry_id: DbId,
    pub entry_date: EntryDate,
    pub dominant: Vec<DominantEmotion>,
    pub suggested_tools: Vec<ReflectionTool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatedEntry {
    pub entry_id: DbId,
    pub dominant: Vec<DominantEmotion>,
}

/// Everything an owner sees when opening one entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub id: DbId,
    pub text: String,
    pub entry_date: EntryDate,
    pub is_public: bool,
    pub public_token: Option<String>,
    pub dominant: Vec<DominantEmotion>,
    pub suggested_tools: Vec<ReflectionTool>,
    pub completed_tools: Vec<ReflectionTool>,
}

/// One row of the owner's entry list.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub id: DbId,
    pub text: String,
    pub entry_date: EntryDate,
}

/// What an anonymous viewer sees through a share token.
#[derive(Debug, Clone, Serialize)]
pub struct PublicEntry {
    pub text: String,
    pub entry_date: EntryDate,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Owner-scoped journal operations.
///
/// Every method taking `(entry_id, user_id)` treats an entry owned by
/// someone else exactly like a missing one.
#[derive(Clone)]
pub struct JournalService {
    pool: PgPool,
    cipher: Arc<EntryCipher>,
    classifier: Arc<dyn EmotionClassifier>,
    settings: JournalSettings,
}

impl JournalService {
    pub fn new(
        pool: PgPool,
        cipher: Arc<EntryCipher>,
        classifier: Arc<dyn EmotionClassifier>,
        settings: JournalSettings,
    ) -> Self {
        Self {
            pool,
            cipher,
            classifier,
            settings,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---- entries ----

    /// Classify, encrypt, and store a new entry with its full score set.
    ///
    /// Suggestions are looked up before the insert, so an `Err` always means
    /// nothing was stored.
    pub async fn create(&self, user_id: DbId, plaintext: &str) -> PipelineResult<CreatedEntry> {
        let (scores, ciphertext) = self.analyze(plaintext).await?;
        let dominant = self.select(&scores);
        let suggested_tools = self.suggest_tools(&dominant).await?;

        let entry =
            JournalEntryRepo::create_with_scores(&self.pool, user_id, &ciphertext, &scores).await?;

        tracing::info!(
            entry_id = entry.id,
            user_id,
            emotion_count = scores.len(),
            dominant_count = dominant.len(),
            "Journal entry created",
        );

        Ok(CreatedEntry {
            entry_id: entry.id,
            entry_date: entry.entry_date,
            dominant,
            suggested_tools,
        })
    }

    /// Load and decrypt one owned entry with its dominant emotions, suggested
    /// tools, and completed reflections.
    pub async fn get(&self, entry_id: DbId, user_id: DbId) -> PipelineResult<EntryView> {
        let entry = find_owned_entry(&self.pool, entry_id, user_id).await?;
        let text = self.cipher.decrypt(&entry.text).map_err(CoreError::from)?;

        let stored = EmotionScoreRepo::list_for_entry(&self.pool, entry.id).await?;
        let dominant = self.select(&scores_from_rows(&stored));
        let suggested_tools = self.suggest_tools(&dominant).await?;
        let completed_tools =
            ReflectionToolRepo::list_completed_for_entry(&self.pool, entry.id, user_id).await?;

        Ok(EntryView {
            id: entry.id,
            text,
            entry_date: entry.entry_date,
            is_public: entry.is_public,
            public_token: entry.public_token,
            dominant,
            suggested_tools,
            completed_tools,
        })
    }

    /// Replace an owned entry's text and re-derive its score set.
    pub async fn update(
        &self,
        entry_id: DbId,
        user_id: DbId,
        plaintext: &str,
    ) -> PipelineResult<UpdatedEntry> {
        let (scores, ciphertext) = self.analyze(plaintext).await?;

        let entry = JournalEntryRepo::update_with_scores(
            &self.pool,
            entry_id,
            user_id,
            &ciphertext,
            &scores,
        )
        .await?
        .ok_or_else(|| not_found(ENTRY, entry_id))?;

        tracing::info!(
            entry_id = entry.id,
            user_id,
            emotion_count = scores.len(),
            "Journal entry updated",
        );

        Ok(UpdatedEntry {
            entry_id: entry.id,
            dominant: self.select(&scores),
        })
    }

    pub async fn delete(&self, entry_id: DbId, user_id: DbId) -> PipelineResult<()> {
        if !JournalEntryRepo::delete(&self.pool, entry_id, user_id).await? {
            return Err(not_found(ENTRY, entry_id));
        }
        tracing::info!(entry_id, user_id, "Journal entry deleted");
        Ok(())
    }

    /// All of a user's entries, decrypted, newest first.
    pub async fn list(&self, user_id: DbId) -> PipelineResult<Vec<EntrySummary>> {
        let entries = JournalEntryRepo::list_for_user(&self.pool, user_id).await?;
        entries
            .into_iter()
            .map(|entry| -> PipelineResult<EntrySummary> {
                let text = self.cipher.decrypt(&entry.text).map_err(CoreError::from)?;
                Ok(EntrySummary {
                    id: entry.id,
                    text,
                    entry_date: entry.entry_date,
                })
            })
            .collect()
    }

    // ---- public sharing ----

    /// Share an owned entry and return its token. An entry that is already
    /// public keeps the token it has.
    pub async fn make_public(&self, entry_id: DbId, user_id: DbId) -> PipelineResult<String> {
        let candidate = generate_public_token();
        let token = JournalEntryRepo::make_public(&self.pool, entry_id, user_id, &candidate)
            .await?
            .ok_or_else(|| not_found(ENTRY, entry_id))?;
        tracing::info!(entry_id, user_id, "Journal entry shared");
        Ok(token)
    }

    /// Revoke sharing. The old token stops resolving immediately.
    pub async fn make_private(&self, entry_id: DbId, user_id: DbId) -> PipelineResult<()> {
        if !JournalEntryRepo::make_private(&self.pool, entry_id, user_id).await? {
            return Err(not_found(ENTRY, entry_id));
        }
        tracing::info!(entry_id, user_id, "Journal entry unshared");
        Ok(())
    }

    /// Look up a shared entry by token and decrypt it.
    pub async fn resolve(&self, token: &str) -> PipelineResult<PublicEntry> {
        if !is_well_formed_token(token) {
            return Err(not_found(PUBLIC_ENTRY, "<token>"));
        }
        let entry = JournalEntryRepo::find_public_by_token(&self.pool, token)
            .await?
            .ok_or_else(|| not_found(PUBLIC_ENTRY, "<token>"))?;
        let text = self.cipher.decrypt(&entry.text).map_err(CoreError::from)?;
        tracing::debug!(entry_id = entry.id, "Public entry resolved");
        Ok(PublicEntry {
            text,
            entry_date: entry.entry_date,
        })
    }

    // ---- trends ----

    /// Daily averages over the `days` days ending today (UTC).
    ///
    /// An empty `emotions` slice means the whole catalog.
    pub async fn trends_last_days(
        &self,
        user_id: DbId,
        days: i64,
        emotions: &[Emotion],
    ) -> PipelineResult<Vec<TrendPoint>> {
        let range = DateRange::last_days(Utc::now().date_naive(), days)?;
        self.trends_in_range(user_id, range, emotions).await
    }

    /// Daily averages over the inclusive range `[start, end]`.
    pub async fn trends_between(
        &self,
        user_id: DbId,
        start: EntryDate,
        end: EntryDate,
        emotions: &[Emotion],
    ) -> PipelineResult<Vec<TrendPoint>> {
        let range = DateRange::new(start, end)?;
        self.trends_in_range(user_id, range, emotions).await
    }

    pub async fn trends_in_range(
        &self,
        user_id: DbId,
        range: DateRange,
        emotions: &[Emotion],
    ) -> PipelineResult<Vec<TrendPoint>> {
        let emotions: &[Emotion] = if emotions.is_empty() {
            &Emotion::ALL
        } else {
            emotions
        };

        let days =
            JournalEntryRepo::list_days_in_range(&self.pool, user_id, range.start, range.end)
                .await?;
        if days.is_empty() {
            return Ok(Vec::new());
        }

        let entry_ids: Vec<DbId> = days.iter().map(|d| d.id).collect();
        let entry_dates: Vec<EntryDate> = days.iter().map(|d| d.entry_date).collect();
        let names: Vec<String> = emotions.iter().map(|e| e.as_str().to_string()).collect();

        let samples: Vec<ScoreSample> =
            EmotionScoreRepo::list_dated_for_entries(&self.pool, &entry_ids, &names)
                .await?
                .into_iter()
                .filter_map(|row| {
                    let emotion = row.emotion.parse().ok()?;
                    Some(ScoreSample {
                        date: row.entry_date,
                        emotion,
                        intensity: row.intensity,
                    })
                })
                .collect();

        let points = bucket_by_day(&entry_dates, &samples, emotions);
        tracing::debug!(
            user_id,
            start = %range.start,
            end = %range.end,
            entry_count = entry_ids.len(),
            point_count = points.len(),
            "Trend query",
        );
        Ok(points)
    }

    // ---- private helpers ----

    /// Validate, classify, and encrypt. Nothing is written.
    async fn analyze(&self, plaintext: &str) -> PipelineResult<(EmotionScores, String)> {
        validate_entry_content(plaintext)?;
        let scores = classify_with_timeout(
            self.classifier.as_ref(),
            plaintext,
            self.settings.classify_timeout,
        )
        .await
        .map_err(CoreError::from)?;
        let ciphertext = self.cipher.encrypt(plaintext).map_err(CoreError::from)?;
        Ok((scores, ciphertext))
    }

    fn select(&self, scores: &EmotionScores) -> Vec<DominantEmotion> {
        select_dominant(
            scores,
            self.settings.emotion_threshold,
            self.settings.emotion_limit,
        )
    }

    async fn suggest_tools(
        &self,
        dominant: &[DominantEmotion],
    ) -> PipelineResult<Vec<ReflectionTool>> {
        if dominant.is_empty() {
            return Ok(Vec::new());
        }
        let emotions: Vec<Emotion> = dominant.iter().map(|d| d.emotion).collect();
        let candidates = ReflectionToolRepo::list_links_for_emotions(&self.pool, &emotions)
            .await?
            .into_iter()
            .filter_map(|link| Some((link.emotion.parse::<Emotion>().ok()?, link.tool)))
            .collect();
        Ok(suggest(dominant, candidates, |tool| tool.id))
    }
}

/// Fetch an entry owned by `user_id`, or `NotFound`.
pub(crate) async fn find_owned_entry(
    pool: &PgPool,
    entry_id: DbId,
    user_id: DbId,
) -> PipelineResult<JournalEntry> {
    JournalEntryRepo::find_owned(pool, entry_id, user_id)
        .await?
        .ok_or_else(|| not_found(ENTRY, entry_id))
}

/// Rebuild a score map from stored rows, skipping names outside the catalog.
fn scores_from_rows(rows: &[StoredScore]) -> EmotionScores {
    EmotionScores::from_stored(rows.iter().filter_map(|row| match row.emotion.parse() {
        Ok(emotion) => Some((emotion, row.intensity)),
        Err(_) => {
            tracing::warn!(name = %row.emotion, "Stored score has unknown emotion");
            None
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(emotion: &str, intensity: f64) -> StoredScore {
        StoredScore {
            emotion: emotion.to_string(),
            intensity,
        }
    }

    #[test]
    fn stored_rows_rebuild_scores() {
        let scores = scores_from_rows(&[row("joy", 0.6), row("fear", 0.4), row("awe", 0.9)]);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get(Emotion::Joy), Some(0.6));
    }

    #[test]
    fn stored_selection_matches_write_time_selection() {
        let written = EmotionScores::from_stored([
            (Emotion::Joy, 0.1),
            (Emotion::Sadness, 0.62),
            (Emotion::Anger, 0.3),
            (Emotion::Fear, 0.44),
            (Emotion::Disgust, 0.05),
        ]);
        let rows: Vec<StoredScore> = written
            .iter()
            .map(|(e, i)| row(e.as_str(), i))
            .collect();
        let settings = JournalSettings::default();
        assert_eq!(
            select_dominant(&written, settings.emotion_threshold, settings.emotion_limit),
            select_dominant(
                &scores_from_rows(&rows),
                settings.emotion_threshold,
                settings.emotion_limit
            ),
        );
    }

    #[test]
    fn default_settings_use_canonical_policy() {
        let settings = JournalSettings::default();
        assert_eq!(settings.emotion_threshold, 0.3);
        assert_eq!(settings.emotion_limit, 2);
        assert_eq!(settings.classify_timeout, Duration::from_secs(10));
    }
}
