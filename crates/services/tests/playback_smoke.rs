use std::sync::Arc;

use quiz_core::model::QuestionDraft;
use quiz_core::time::fixed_now;
use services::{QuestionRepository, QuizSession};
use storage::store::InMemoryStore;

fn draft(text: &str, options: &[&str], correct: usize) -> QuestionDraft {
    QuestionDraft::with_parts(
        text,
        options.iter().map(|o| (*o).to_owned()).collect(),
        correct,
    )
}

#[tokio::test]
async fn full_playback_over_a_committed_list() {
    let mut repo = QuestionRepository::new(Arc::new(InMemoryStore::new()));
    for i in 0..5 {
        repo.commit(draft(&format!("question {i}"), &["a", "b", "c"], i % 3))
            .unwrap();
    }

    let mut session = QuizSession::new(repo.questions().to_vec());
    let total = session.total();
    assert_eq!(total, 5);

    // Answer option 0 everywhere: correct only where the right answer is 0.
    let mut advances = 0;
    while !session.is_complete() {
        session.select_option(0);
        session.submit();
        assert!(session.is_revealed());
        session.advance(fixed_now());
        advances += 1;
        assert!(advances <= total, "session failed to terminate");
    }

    // One advance per question reaches completion in exactly N steps.
    assert_eq!(advances, total);
    assert_eq!(session.answers().len(), total);

    let report = session.report().unwrap();
    let correct = session
        .answers()
        .iter()
        .filter(|answer| answer.was_correct)
        .count();
    assert_eq!(report.score() as usize, correct);
    assert_eq!(report.score(), 2);
    assert_eq!(report.percentage(), 40);
    assert_eq!(report.completed_at(), fixed_now());
}

#[tokio::test]
async fn snapshot_is_insulated_from_repository_edits() {
    let mut repo = QuestionRepository::new(Arc::new(InMemoryStore::new()));
    repo.commit(draft("stable", &["a", "b"], 0)).unwrap();

    let mut session = QuizSession::new(repo.questions().to_vec());

    // Concurrent edits to the repository must not affect the attempt.
    repo.remove(0);
    repo.commit(draft("replacement", &["x", "y"], 1)).unwrap();

    assert_eq!(session.total(), 1);
    assert_eq!(session.current_question().unwrap().text(), "stable");

    session.select_option(0);
    session.submit();
    session.advance(fixed_now());
    assert_eq!(session.report().unwrap().score(), 1);
}

#[tokio::test]
async fn restart_replays_the_original_snapshot() {
    let mut repo = QuestionRepository::new(Arc::new(InMemoryStore::new()));
    repo.commit(draft("one", &["a", "b"], 1)).unwrap();
    repo.commit(draft("two", &["c", "d"], 0)).unwrap();

    let mut session = QuizSession::new(repo.questions().to_vec());
    for _ in 0..2 {
        session.select_option(1);
        session.submit();
        session.advance(fixed_now());
    }
    assert!(session.is_complete());

    session.restart();
    assert!(!session.is_complete());
    assert_eq!(session.score(), 0);
    assert!(session.answers().is_empty());
    assert_eq!(session.total(), 2);
    assert_eq!(session.current_question().unwrap().text(), "one");

    // A restarted attempt scores independently of the first run.
    session.select_option(1);
    session.submit();
    assert_eq!(session.score(), 1);
}
