//! Integration tests for the reflection tool catalog and submissions.

use ouramind_core::emotion::{Emotion, EmotionScores};
use ouramind_db::models::reflection::{NewMoodRating, NewResponse, RatingType, SubmissionKey};
use ouramind_db::models::reflection_tool::CreateReflectionTool;
use ouramind_db::repositories::{JournalEntryRepo, ReflectionResponseRepo, ReflectionToolRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_tool(path: &str, emotions: &[Emotion]) -> CreateReflectionTool {
    CreateReflectionTool {
        name: format!("Tool {path}"),
        description: Some("Short exercise".to_string()),
        instructions: None,
        path: path.to_string(),
        prompts: vec!["What happened?".to_string(), "What would you tell a friend?".to_string()],
        emotions: emotions.to_vec(),
    }
}

fn submission_key(user_id: i64, journal_entry_id: i64, tool_id: i64) -> SubmissionKey {
    SubmissionKey {
        user_id,
        journal_entry_id,
        tool_id,
    }
}

fn answer(prompt_id: i64, response: &str) -> NewResponse {
    NewResponse {
        prompt_id,
        response: response.to_string(),
    }
}

fn mood_rating(mood_id: i16, rating_type: RatingType, value: i16) -> NewMoodRating {
    NewMoodRating {
        mood_id,
        rating_type,
        value,
    }
}

async fn new_entry(pool: &PgPool, user_id: i64) -> i64 {
    let scores = EmotionScores::from_stored(Emotion::ALL.map(|e| (e, 0.5)));
    JournalEntryRepo::create_with_scores(pool, user_id, "t", &scores)
        .await
        .unwrap()
        .id
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_stores_prompts_and_links(pool: PgPool) {
    let tool =
        ReflectionToolRepo::create(&pool, &new_tool("reframe", &[Emotion::Fear, Emotion::Sadness]))
            .await
            .unwrap();

    let prompts = ReflectionToolRepo::list_prompts(&pool, tool.id).await.unwrap();
    let questions: Vec<&str> = prompts.iter().map(|p| p.question.as_str()).collect();
    assert_eq!(questions, vec!["What happened?", "What would you tell a friend?"]);
    assert_eq!(prompts[0].sort_order, 0);
    assert_eq!(prompts[1].sort_order, 1);

    let emotions = ReflectionToolRepo::list_emotion_names(&pool, tool.id).await.unwrap();
    assert_eq!(emotions, vec!["sadness", "fear"]);

    let by_path = ReflectionToolRepo::find_by_path(&pool, "reframe").await.unwrap();
    assert_eq!(by_path, Some(tool));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_path_is_rejected(pool: PgPool) {
    ReflectionToolRepo::create(&pool, &new_tool("grounding", &[])).await.unwrap();
    let result = ReflectionToolRepo::create(&pool, &new_tool("grounding", &[])).await;
    assert!(result.is_err(), "path should be unique");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_replaces_prompts_and_links(pool: PgPool) {
    let tool = ReflectionToolRepo::create(&pool, &new_tool("savor", &[Emotion::Joy]))
        .await
        .unwrap();

    let mut input = new_tool("savor-moment", &[Emotion::Anger]);
    input.prompts = vec!["Name one detail.".to_string()];
    let updated = ReflectionToolRepo::update(&pool, tool.id, &input)
        .await
        .unwrap()
        .expect("tool should exist");

    assert_eq!(updated.path, "savor-moment");
    let prompts = ReflectionToolRepo::list_prompts(&pool, tool.id).await.unwrap();
    assert_eq!(prompts.len(), 1);
    let emotions = ReflectionToolRepo::list_emotion_names(&pool, tool.id).await.unwrap();
    assert_eq!(emotions, vec!["anger"]);

    assert!(ReflectionToolRepo::update(&pool, tool.id + 999, &input).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_links_for_emotions_are_ordered(pool: PgPool) {
    let a = ReflectionToolRepo::create(&pool, &new_tool("a", &[Emotion::Fear])).await.unwrap();
    let b = ReflectionToolRepo::create(&pool, &new_tool("b", &[Emotion::Joy, Emotion::Fear]))
        .await
        .unwrap();
    ReflectionToolRepo::create(&pool, &new_tool("c", &[Emotion::Disgust])).await.unwrap();

    let links = ReflectionToolRepo::list_links_for_emotions(&pool, &[Emotion::Fear, Emotion::Joy])
        .await
        .unwrap();
    let pairs: Vec<(&str, i64)> = links.iter().map(|l| (l.emotion.as_str(), l.tool.id)).collect();
    assert_eq!(pairs, vec![("joy", b.id), ("fear", a.id), ("fear", b.id)]);

    assert!(ReflectionToolRepo::list_links_for_emotions(&pool, &[]).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_cascades_prompts(pool: PgPool) {
    let tool = ReflectionToolRepo::create(&pool, &new_tool("box", &[Emotion::Fear])).await.unwrap();
    assert!(ReflectionToolRepo::delete(&pool, tool.id).await.unwrap());
    assert!(ReflectionToolRepo::list_prompts(&pool, tool.id).await.unwrap().is_empty());
    assert!(ReflectionToolRepo::find_by_id(&pool, tool.id).await.unwrap().is_none());
    assert!(!ReflectionToolRepo::delete(&pool, tool.id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submission_replace_and_usage(pool: PgPool) {
    let tool = ReflectionToolRepo::create(&pool, &new_tool("journal-more", &[])).await.unwrap();
    let prompts = ReflectionToolRepo::list_prompts(&pool, tool.id).await.unwrap();
    let entry_id = new_entry(&pool, 7).await;
    let key = submission_key(7, entry_id, tool.id);

    let first = vec![
        answer(prompts[0].id, "A long day"),
        answer(prompts[1].id, "Be kind"),
    ];
    let ratings = vec![
        mood_rating(1, RatingType::Before, 3),
        mood_rating(1, RatingType::After, 7),
    ];
    ReflectionResponseRepo::replace_submission(&pool, key, &first, &ratings).await.unwrap();

    let second = vec![answer(prompts[0].id, "Better now")];
    ReflectionResponseRepo::replace_submission(&pool, key, &second, &[]).await.unwrap();

    let responses = ReflectionResponseRepo::list_responses(&pool, key).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].response, "Better now");
    assert!(ReflectionResponseRepo::list_mood_ratings(&pool, key).await.unwrap().is_empty());

    let usage = ReflectionToolRepo::list_with_usage(&pool).await.unwrap();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].usage_count, 1);

    let completed = ReflectionToolRepo::list_completed_for_entry(&pool, entry_id, 7).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert!(ReflectionToolRepo::list_completed_for_entry(&pool, entry_id, 8)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_description_edit_keeps_submissions(pool: PgPool) {
    let tool = ReflectionToolRepo::create(&pool, &new_tool("reframe", &[Emotion::Fear]))
        .await
        .unwrap();
    let prompts = ReflectionToolRepo::list_prompts(&pool, tool.id).await.unwrap();
    let entry_id = new_entry(&pool, 7).await;
    let key = submission_key(7, entry_id, tool.id);

    let responses = [answer(prompts[0].id, "A long day")];
    let ratings = [
        mood_rating(1, RatingType::Before, 3),
        mood_rating(1, RatingType::After, 6),
    ];
    ReflectionResponseRepo::replace_submission(&pool, key, &responses, &ratings).await.unwrap();

    let mut input = new_tool("reframe", &[Emotion::Fear]);
    input.description = Some("A longer exercise".to_string());
    ReflectionToolRepo::update(&pool, tool.id, &input).await.unwrap().unwrap();

    let after: Vec<i64> = ReflectionToolRepo::list_prompts(&pool, tool.id)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(after, prompts.iter().map(|p| p.id).collect::<Vec<_>>());
    assert_eq!(ReflectionResponseRepo::list_responses(&pool, key).await.unwrap().len(), 1);
    assert_eq!(ReflectionResponseRepo::list_mood_ratings(&pool, key).await.unwrap().len(), 2);
    let completed = ReflectionToolRepo::list_completed_for_entry(&pool, entry_id, 7).await.unwrap();
    assert_eq!(completed.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dropped_prompt_takes_its_submission(pool: PgPool) {
    let tool = ReflectionToolRepo::create(&pool, &new_tool("reframe", &[])).await.unwrap();
    let prompts = ReflectionToolRepo::list_prompts(&pool, tool.id).await.unwrap();
    let kept_entry = new_entry(&pool, 7).await;
    let dropped_entry = new_entry(&pool, 7).await;
    let kept = submission_key(7, kept_entry, tool.id);
    let dropped = submission_key(7, dropped_entry, tool.id);
    let rating = [mood_rating(1, RatingType::Before, 4)];

    let first = [answer(prompts[0].id, "Kept")];
    ReflectionResponseRepo::replace_submission(&pool, kept, &first, &rating).await.unwrap();
    let second = [answer(prompts[1].id, "Dropped")];
    ReflectionResponseRepo::replace_submission(&pool, dropped, &second, &rating).await.unwrap();

    let mut input = new_tool("reframe", &[]);
    input.prompts = vec!["A brand new question".to_string(), prompts[0].question.clone()];
    ReflectionToolRepo::update(&pool, tool.id, &input).await.unwrap().unwrap();

    let after = ReflectionToolRepo::list_prompts(&pool, tool.id).await.unwrap();
    assert_eq!(after.len(), 2);
    assert_eq!(after[0].question, "A brand new question");
    assert_eq!(after[1].id, prompts[0].id);
    assert_eq!(after[1].sort_order, 1);

    assert_eq!(ReflectionResponseRepo::list_responses(&pool, kept).await.unwrap().len(), 1);
    assert_eq!(ReflectionResponseRepo::list_mood_ratings(&pool, kept).await.unwrap().len(), 1);
    assert!(ReflectionResponseRepo::list_responses(&pool, dropped).await.unwrap().is_empty());
    assert!(ReflectionResponseRepo::list_mood_ratings(&pool, dropped).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mood_ratings_list_before_first(pool: PgPool) {
    let tool = ReflectionToolRepo::create(&pool, &new_tool("check-in", &[])).await.unwrap();
    let entry_id = new_entry(&pool, 7).await;
    let key = submission_key(7, entry_id, tool.id);
    let ratings = vec![
        mood_rating(2, RatingType::After, 8),
        mood_rating(2, RatingType::Before, 4),
    ];
    ReflectionResponseRepo::replace_submission(&pool, key, &[], &ratings).await.unwrap();

    let listed = ReflectionResponseRepo::list_mood_ratings(&pool, key).await.unwrap();
    let kinds: Vec<&str> = listed.iter().map(|r| r.rating_type.as_str()).collect();
    assert_eq!(kinds, vec!["before", "after"]);
    assert_eq!(listed[0].mood, "energy");

    assert!(ReflectionResponseRepo::delete_submission(&pool, key).await.unwrap());
    assert!(!ReflectionResponseRepo::delete_submission(&pool, key).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rating_value_check_constraint(pool: PgPool) {
    let tool = ReflectionToolRepo::create(&pool, &new_tool("scale", &[])).await.unwrap();
    let entry_id = new_entry(&pool, 7).await;
    let key = submission_key(7, entry_id, tool.id);
    let bad = [mood_rating(1, RatingType::Before, 11)];
    assert!(ReflectionResponseRepo::replace_submission(&pool, key, &[], &bad).await.is_err());
}
