#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ouramind_core::cipher::EntryCipher;
use ouramind_core::classifier::{ClassifierError, EmotionClassifier};
use ouramind_core::emotion::{Emotion, EmotionScores};
use ouramind_pipeline::{JournalService, JournalSettings};
use sqlx::PgPool;

pub const TEST_KEY: [u8; 32] = [7u8; 32];

/// Intensities in catalog order: joy, sadness, anger, fear, disgust.
pub fn scores(values: [f64; 5]) -> EmotionScores {
    EmotionScores::from_stored(Emotion::ALL.into_iter().zip(values))
}

/// Returns a configurable score map and counts calls.
pub struct FixedClassifier {
    scores: Mutex<EmotionScores>,
    calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn new(values: [f64; 5]) -> Arc<Self> {
        Arc::new(Self {
            scores: Mutex::new(scores(values)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, values: [f64; 5]) {
        *self.scores.lock().unwrap() = scores(values);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmotionClassifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<EmotionScores, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.lock().unwrap().clone())
    }
}

/// Always fails as an unreachable service would.
pub struct FailingClassifier;

#[async_trait]
impl EmotionClassifier for FailingClassifier {
    async fn classify(&self, _text: &str) -> Result<EmotionScores, ClassifierError> {
        Err(ClassifierError::ClassificationFailed("service unavailable".into()))
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledClassifier;

#[async_trait]
impl EmotionClassifier for StalledClassifier {
    async fn classify(&self, _text: &str) -> Result<EmotionScores, ClassifierError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(ClassifierError::ClassificationFailed("unreachable".into()))
    }
}

pub fn service(pool: PgPool, classifier: Arc<dyn EmotionClassifier>) -> JournalService {
    service_with(pool, classifier, JournalSettings::default())
}

pub fn service_with(
    pool: PgPool,
    classifier: Arc<dyn EmotionClassifier>,
    settings: JournalSettings,
) -> JournalService {
    let cipher = EntryCipher::new(&TEST_KEY).unwrap();
    JournalService::new(pool, Arc::new(cipher), classifier, settings)
}

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    n
}

pub async fn set_entry_date(pool: &PgPool, entry_id: i64, date: chrono::NaiveDate) {
    sqlx::query("UPDATE journal_entries SET entry_date = $2 WHERE id = $1")
        .bind(entry_id)
        .bind(date)
        .execute(pool)
        .await
        .unwrap();
}

pub fn day(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
