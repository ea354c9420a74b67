mod common;

use common::{entered, FakeCompanionApi};
use futures::poll;
use lecture_companion::error::ValidationError;
use lecture_companion::models::QuestionId;
use lecture_companion::{AppError, Settlement};
use tokio_test::assert_pending;

#[tokio::test]
async fn test_search_sends_canonical_query() {
    let api = FakeCompanionApi::new();
    let q = api.seed_question("What is the Fourier transform of a rectangular pulse?");
    let orch = entered(&api).await;
    let id = QuestionId::Persisted(q.id);

    let hits = orch.search_for_question(&id).await.unwrap().applied().unwrap();

    assert_eq!(hits[0].text, "fourier transform rectangular pulse");
    assert_eq!(
        api.call_count("search_chunks:fourier transform rectangular pulse:6"),
        1
    );
    assert_eq!(orch.hits(&id).await, hits);
}

#[tokio::test]
async fn test_blank_query_is_skipped_without_request() {
    let api = FakeCompanionApi::new();
    let q = api.seed_question("q");
    let orch = entered(&api).await;

    let settled = orch
        .search(&QuestionId::Persisted(q.id), "  the of ")
        .await
        .unwrap();

    // 全是停用词时回退为原文，仍会发出检索
    assert!(settled.is_applied());

    let settled = orch
        .search(&QuestionId::parse("anything"), "   ")
        .await
        .unwrap();
    assert_eq!(settled, Settlement::Skipped);
    assert_eq!(api.call_count("search_chunks"), 1);
}

#[tokio::test]
async fn test_later_search_wins_and_earlier_result_is_discarded() {
    let api = FakeCompanionApi::new();
    let q = api.seed_question("q");
    let orch = entered(&api).await;
    let id = QuestionId::Persisted(q.id);

    api.hold("search:slow topic");
    let slow = orch.search(&id, "slow topic");
    tokio::pin!(slow);
    assert_pending!(poll!(&mut slow));
    assert!(orch.is_searching(&id).await);

    let fast = orch.search(&id, "fast topic").await.unwrap();
    assert!(fast.is_applied());

    api.release("search:slow topic");
    let slow = slow.await.unwrap();

    assert!(slow.is_superseded());
    let hits = orch.hits(&id).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "fast topic");
    assert!(!orch.is_searching(&id).await);
}

#[tokio::test]
async fn test_search_failure_clears_hits() {
    let api = FakeCompanionApi::new();
    let q = api.seed_question("q");
    let orch = entered(&api).await;
    let id = QuestionId::Persisted(q.id);

    orch.search(&id, "sampling theorem").await.unwrap();
    assert_eq!(orch.hits(&id).await.len(), 1);

    api.fail("search_chunks");
    let err = orch.search(&id, "sampling theorem").await.unwrap_err();

    assert!(err.is_transport());
    assert!(orch.hits(&id).await.is_empty());
    assert!(!orch.is_searching(&id).await);
}

#[tokio::test]
async fn test_stale_search_failure_does_not_clear_newer_hits() {
    let api = FakeCompanionApi::new();
    let q = api.seed_question("q");
    let orch = entered(&api).await;
    let id = QuestionId::Persisted(q.id);

    api.hold("search:slow topic");
    api.fail("search:slow topic");
    let slow = orch.search(&id, "slow topic");
    tokio::pin!(slow);
    assert_pending!(poll!(&mut slow));

    orch.search(&id, "fast topic").await.unwrap();

    api.release("search:slow topic");
    let slow = slow.await.unwrap();

    assert!(slow.is_superseded());
    let hits = orch.hits(&id).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "fast topic");
    assert!(!orch.is_searching(&id).await);
}

#[tokio::test]
async fn test_search_on_pending_question_is_rejected_locally() {
    let api = FakeCompanionApi::new();
    let orch = entered(&api).await;

    api.hold("create_question");
    let submit = orch.submit_question("What is a z-transform?");
    tokio::pin!(submit);
    assert_pending!(poll!(&mut submit));

    let pending_id = orch.questions().await[0].id();
    let err = orch.search(&pending_id, "z-transform").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::PendingQuestion { .. })
    ));
    let err = orch.search_for_question(&pending_id).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(api.call_count("search_chunks"), 0);
    assert!(orch.hits(&pending_id).await.is_empty());

    api.release("create_question");
    submit.await.unwrap();
}
