//! End-to-end interaction scenarios against the scripted gateway.

use std::io::Cursor;
use std::sync::Arc;

use guide_core::{GuideConfig, Speaker, UploadedArtifact};
use guide_gateway::{GatewayError, ScriptedGateway};
use guide_session::{
    DisplayItem, GuideSession, InteractionController, InteractionError, InteractionOutcome,
    TourView, FACT_BANNER, INSIGHT_BANNER,
};
use guide_speech::MockRecognizer;

const QUOTA_MESSAGE: &str = "Quota exceeded. Please wait a moment and try again.";

struct Harness {
    gateway: Arc<ScriptedGateway>,
    controller: InteractionController,
    session: GuideSession,
    _dir: tempfile::TempDir,
}

fn harness_with(gateway: ScriptedGateway, recognizer: MockRecognizer) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut config = GuideConfig::default();
    config.voice.audio_path = dir.path().join("audio.wav").display().to_string();

    let gateway = Arc::new(gateway);
    let controller = InteractionController::new(gateway.clone(), Arc::new(recognizer), &config);
    let session = controller.start_session();
    Harness {
        gateway,
        controller,
        session,
        _dir: dir,
    }
}

fn harness(gateway: ScriptedGateway) -> Harness {
    harness_with(gateway, MockRecognizer::new("Who built the pyramids?"))
}

fn png() -> UploadedArtifact {
    UploadedArtifact::new(b"\x89PNG\r\n\x1a\nimage-data".to_vec(), None).unwrap()
}

fn wav() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..1600 {
            writer.write_sample(((i % 50) * 400) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn log_pairs(session: &GuideSession) -> Vec<(Speaker, String)> {
    session
        .log()
        .entries()
        .iter()
        .map(|e| (e.speaker(), e.text().to_string()))
        .collect()
}

fn chunks(items: &[DisplayItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|i| match i {
            DisplayItem::Chunk(c) => Some(c.clone()),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_scenario_a_artifact_insight_logged() {
    let mut h = harness(ScriptedGateway::new().with_insight(Ok("A Ming vase.".into())));
    let mut shown: Vec<DisplayItem> = Vec::new();

    let outcome = h
        .controller
        .analyze_artifact(&mut h.session, Some(png()), &mut shown)
        .await;

    assert_eq!(outcome, InteractionOutcome::Logged(1));
    assert_eq!(
        log_pairs(&h.session),
        vec![(Speaker::ArtifactInsight, "A Ming vase.".to_string())]
    );
    assert!(shown.contains(&DisplayItem::Success(INSIGHT_BANNER.into())));
    assert!(shown.contains(&DisplayItem::Text("A Ming vase.".into())));
    assert_eq!(h.gateway.last_question(), None);
}

#[tokio::test]
async fn test_scenario_b_chat_reply_joined_with_spaces() {
    let mut h = harness(ScriptedGateway::new().with_chat_reply(["The ", "pharaohs ", "did."]));
    let mut shown: Vec<DisplayItem> = Vec::new();

    let outcome = h
        .controller
        .ask_guide(&mut h.session, "Who built the pyramids?", &mut shown)
        .await;

    assert_eq!(outcome, InteractionOutcome::Logged(2));
    assert_eq!(
        log_pairs(&h.session),
        vec![
            (Speaker::User, "Who built the pyramids?".to_string()),
            (Speaker::Guide, "The  pharaohs  did. ".to_string()),
        ]
    );
    assert_eq!(chunks(&shown), vec!["The ", "pharaohs ", "did."]);
}

#[tokio::test]
async fn test_scenario_c_fact_deduplicated() {
    let mut h = harness(ScriptedGateway::new().with_facts(["Fact1", "Fact1", "Fact2"]));
    h.session.remember_fact("Fact1");
    let mut shown: Vec<DisplayItem> = Vec::new();

    let outcome = h
        .controller
        .generate_fun_fact(&mut h.session, &mut shown)
        .await;

    assert_eq!(outcome, InteractionOutcome::Logged(1));
    assert_eq!(
        h.session.fact_history().facts(),
        ["Fact1".to_string(), "Fact2".to_string()]
    );
    assert_eq!(
        shown,
        vec![
            DisplayItem::Progress("Generating fact...".into()),
            DisplayItem::Success(FACT_BANNER.into()),
            DisplayItem::Text("Fact2".into()),
        ]
    );
    assert_eq!(
        log_pairs(&h.session),
        vec![(Speaker::FunFact, "Fact2".to_string())]
    );
}

#[tokio::test]
async fn test_scenario_d_quota_leaves_log_unchanged() {
    let mut h = harness(ScriptedGateway::failing(GatewayError::QuotaExceeded(
        "Resource has been exhausted".into(),
    )));
    let mut shown: Vec<DisplayItem> = Vec::new();

    let insight = h
        .controller
        .analyze_artifact(&mut h.session, Some(png()), &mut shown)
        .await;
    let chat = h
        .controller
        .ask_guide(&mut h.session, "Hello?", &mut shown)
        .await;
    let fact = h
        .controller
        .generate_fun_fact(&mut h.session, &mut shown)
        .await;

    for outcome in [insight, chat, fact] {
        assert!(matches!(
            outcome,
            InteractionOutcome::Failed(InteractionError::QuotaExceeded(_))
        ));
    }
    assert!(h.session.log().is_empty());
    let errors: Vec<_> = shown
        .iter()
        .filter(|i| matches!(i, DisplayItem::Error(_)))
        .collect();
    assert_eq!(errors.len(), 3);
    assert!(errors
        .iter()
        .all(|e| **e == DisplayItem::Error(QUOTA_MESSAGE.into())));

    // The session stays usable.
    let mut shown: Vec<DisplayItem> = Vec::new();
    h.controller.show_tour_log(&h.session, &mut shown);
    assert_eq!(
        shown,
        vec![DisplayItem::Info("No conversation history yet.".into())]
    );
}

#[tokio::test]
async fn test_session_usable_after_failure() {
    let mut h = harness(
        ScriptedGateway::new()
            .with_insight(Err(GatewayError::QuotaExceeded("429".into())))
            .with_insight(Ok("A bronze bell.".into())),
    );
    let mut shown: Vec<DisplayItem> = Vec::new();

    let first = h
        .controller
        .analyze_artifact(&mut h.session, Some(png()), &mut shown)
        .await;
    let second = h
        .controller
        .analyze_artifact(&mut h.session, Some(png()), &mut shown)
        .await;

    assert!(!first.is_success());
    assert_eq!(second, InteractionOutcome::Logged(1));
    assert_eq!(h.session.log().len(), 1);
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn test_log_length_sums_contributions_in_call_order() {
    let mut h = harness(
        ScriptedGateway::new()
            .with_insight(Ok("Insight".into()))
            .with_chat_reply(["Reply"])
            .with_facts(["Fact"]),
    );
    let mut shown: Vec<DisplayItem> = Vec::new();

    h.controller
        .analyze_artifact(&mut h.session, Some(png()), &mut shown)
        .await;
    h.controller
        .ask_guide(&mut h.session, "Question", &mut shown)
        .await;
    h.controller
        .generate_fun_fact(&mut h.session, &mut shown)
        .await;

    let speakers: Vec<Speaker> = log_pairs(&h.session).into_iter().map(|(s, _)| s).collect();
    assert_eq!(
        speakers,
        vec![
            Speaker::ArtifactInsight,
            Speaker::User,
            Speaker::Guide,
            Speaker::FunFact
        ]
    );
}

#[tokio::test]
async fn test_service_error_mid_stream_commits_nothing() {
    let mut h = harness(ScriptedGateway::new().with_chat_reply_then_error(
        ["Partial "],
        GatewayError::Service("connection reset".into()),
    ));
    let mut shown: Vec<DisplayItem> = Vec::new();

    let outcome = h
        .controller
        .ask_guide(&mut h.session, "Tell me more", &mut shown)
        .await;

    assert_eq!(
        outcome,
        InteractionOutcome::Failed(InteractionError::Service("connection reset".into()))
    );
    assert!(h.session.log().is_empty());
    assert_eq!(
        shown.last(),
        Some(&DisplayItem::Error(
            "An error occurred: connection reset".into()
        ))
    );
}

#[tokio::test]
async fn test_fact_exhaustion_is_silent() {
    let mut h = harness(ScriptedGateway::new().with_facts(vec!["Same"; 5]));
    h.session.remember_fact("Same");
    let mut shown: Vec<DisplayItem> = Vec::new();

    let outcome = h
        .controller
        .generate_fun_fact(&mut h.session, &mut shown)
        .await;

    assert_eq!(outcome, InteractionOutcome::NothingNew);
    assert_eq!(h.gateway.fact_calls(), 5);
    assert!(h.session.log().is_empty());
    assert_eq!(shown, vec![DisplayItem::Progress("Generating fact...".into())]);
}

#[tokio::test]
async fn test_empty_message_not_sent() {
    let mut h = harness(ScriptedGateway::new().with_chat_reply(["unused"]));
    let mut shown: Vec<DisplayItem> = Vec::new();

    let outcome = h.controller.ask_guide(&mut h.session, "   ", &mut shown).await;

    assert_eq!(outcome, InteractionOutcome::Failed(InteractionError::EmptyMessage));
    assert!(h.gateway.sent_messages().is_empty());
    assert!(h.session.log().is_empty());
}

#[tokio::test]
async fn test_missing_image_rejected() {
    let mut h = harness(ScriptedGateway::new());
    let mut shown: Vec<DisplayItem> = Vec::new();

    let outcome = h
        .controller
        .analyze_artifact(&mut h.session, None, &mut shown)
        .await;

    assert_eq!(outcome, InteractionOutcome::Failed(InteractionError::MissingImage));
    assert_eq!(h.gateway.insight_calls(), 0);
}

// =============================================================================
// Voice
// =============================================================================

#[tokio::test]
async fn test_voice_turn_logged_as_voice() {
    let mut h = harness(ScriptedGateway::new().with_chat_reply(["Khufu's ", "workers."]));
    let mut shown: Vec<DisplayItem> = Vec::new();

    let outcome = h
        .controller
        .ask_guide_by_voice(&mut h.session, &wav(), &mut shown)
        .await;

    assert_eq!(outcome, InteractionOutcome::Logged(2));
    assert!(shown.contains(&DisplayItem::Text("You said: Who built the pyramids?".into())));
    assert_eq!(
        log_pairs(&h.session),
        vec![
            (Speaker::UserVoice, "Who built the pyramids?".to_string()),
            (Speaker::Guide, "Khufu's  workers. ".to_string()),
        ]
    );
    assert_eq!(h.gateway.sent_messages(), vec!["Who built the pyramids?".to_string()]);
}

#[tokio::test]
async fn test_voice_unrecognized_speech() {
    let mut h = harness_with(
        ScriptedGateway::new().with_chat_reply(["unused"]),
        MockRecognizer::unintelligible(),
    );
    let mut shown: Vec<DisplayItem> = Vec::new();

    let outcome = h
        .controller
        .ask_guide_by_voice(&mut h.session, &wav(), &mut shown)
        .await;

    assert_eq!(
        outcome,
        InteractionOutcome::Failed(InteractionError::UnrecognizedSpeech)
    );
    assert_eq!(
        shown.last(),
        Some(&DisplayItem::Error(
            "Could not understand audio. Please try speaking more clearly.".into()
        ))
    );
    assert!(h.session.log().is_empty());
    assert!(h.gateway.sent_messages().is_empty());
}

#[tokio::test]
async fn test_voice_rejects_undecodable_audio() {
    let mut h = harness(ScriptedGateway::new());
    let mut shown: Vec<DisplayItem> = Vec::new();

    let outcome = h
        .controller
        .ask_guide_by_voice(&mut h.session, b"not a wav", &mut shown)
        .await;

    assert!(matches!(
        outcome,
        InteractionOutcome::Failed(InteractionError::Service(_))
    ));
    assert!(h.session.log().is_empty());
}

// =============================================================================
// Tour log and reset
// =============================================================================

#[tokio::test]
async fn test_tour_log_renders_entries() {
    let mut h = harness(ScriptedGateway::new().with_chat_reply(["Yes."]));
    let mut shown: Vec<DisplayItem> = Vec::new();
    h.controller
        .ask_guide(&mut h.session, "Is it old?", &mut shown)
        .await;

    let mut rendered: Vec<DisplayItem> = Vec::new();
    let view = h.controller.show_tour_log(&h.session, &mut rendered);

    assert_eq!(
        view,
        TourView::Lines {
            lines: vec!["You: Is it old?".into(), "Guide: Yes. ".into()]
        }
    );
    assert_eq!(
        rendered,
        vec![
            DisplayItem::Text("You: Is it old?".into()),
            DisplayItem::Text("Guide: Yes. ".into())
        ]
    );
    assert_eq!(h.session.log().len(), 2);
}

#[tokio::test]
async fn test_reset_starts_fresh_session() {
    let mut h = harness(ScriptedGateway::new().with_chat_reply(["Hi."]).with_facts(["F"]));
    let mut shown: Vec<DisplayItem> = Vec::new();
    h.controller.ask_guide(&mut h.session, "Hello", &mut shown).await;
    h.controller
        .generate_fun_fact(&mut h.session, &mut shown)
        .await;
    assert_eq!(h.session.chat_history_len(), 2);

    h.controller.reset_session(&mut h.session);

    assert!(h.session.log().is_empty());
    assert!(h.session.fact_history().is_empty());
    assert_eq!(h.session.chat_history_len(), 0);
}
