// Moderation engine tests — full decision flow against fake collaborators.
//
// Every test drives Moderator::handle / process with in-memory fakes: no
// gateway, no model, no files.

mod common;

use std::sync::atomic::Ordering;

use common::*;
use groupguard::db::models::{AuditKind, ViolationKind};
use groupguard::knowledge::NOT_FOUND_REPLY;
use groupguard::moderation::commands::{COOLDOWN_REPLY, THINKING_REPLY};
use groupguard::moderation::Verdict;
use groupguard::transport::MessageKind;

// ============================================================
// Message violations
// ============================================================

#[tokio::test]
async fn first_profanity_warns_without_removal() {
    let h = harness(FakeGenerator::always("ok"));

    let verdict = h
        .moderator
        .process(&group_text("m1", "you are a CHUTIYA"))
        .await
        .unwrap();

    assert_eq!(
        verdict,
        Verdict::Warned {
            kind: ViolationKind::Message,
            strikes: 1
        }
    );
    assert_eq!(h.transport.removals(), 0);
    assert!(h.transport.calls().contains(&Call::Delete {
        message_id: "m1".to_string(),
        for_everyone: true,
    }));
    assert!(h.transport.calls().contains(&Call::Send {
        chat: GROUP_ID.to_string(),
        text: format!("Warning @{USER_NUMBER}: message removed. Strike: 1"),
        mentions: vec![USER_ID.to_string()],
    }));
    // The list matched, so the remote screen was never consulted.
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn second_profanity_removes_sender() {
    let h = harness(FakeGenerator::always("ok"));

    h.moderator
        .process(&group_text("m1", "shit"))
        .await
        .unwrap();
    let verdict = h
        .moderator
        .process(&group_text("m2", "lanat ho"))
        .await
        .unwrap();

    assert_eq!(
        verdict,
        Verdict::Removed {
            kind: ViolationKind::Message,
            strikes: 2
        }
    );
    assert_eq!(h.transport.removals(), 1);
    assert!(h
        .transport
        .sent_texts()
        .contains(&format!("Removed @{USER_NUMBER} for repeated violations.")));

    let actions = h.db.actions().await.unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[1].kind, AuditKind::Violation);
    assert_eq!(actions[1].message.as_deref(), Some("lanat ho"));
    assert_eq!(actions[1].strikes, Some(2));
    assert_eq!(actions[1].chat.as_deref(), Some("Study Group"));
    assert_eq!(actions[1].user, "Ali");
}

#[tokio::test]
async fn safety_block_counts_as_violation() {
    let h = harness(FakeGenerator::new(vec![Err(
        "Response blocked: finish reason SAFETY",
    )]));

    let verdict = h
        .moderator
        .process(&group_text("m1", "a long but nasty message"))
        .await
        .unwrap();

    assert_eq!(
        verdict,
        Verdict::Warned {
            kind: ViolationKind::Message,
            strikes: 1
        }
    );
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn short_messages_skip_safety_screen() {
    let h = harness(FakeGenerator::new(vec![Err("blocked")]));

    let verdict = h
        .moderator
        .process(&group_text("m1", "hello"))
        .await
        .unwrap();

    assert_eq!(verdict, Verdict::Allowed);
    assert_eq!(h.generator.calls(), 0);
    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn removal_failure_sends_admin_notice_and_keeps_strikes() {
    let h = harness(FakeGenerator::always("ok"));
    h.transport.fail_remove.store(true, Ordering::SeqCst);

    h.moderator.process(&group_text("m1", "fuck")).await.unwrap();
    let verdict = h
        .moderator
        .process(&group_text("m2", "fuck"))
        .await
        .unwrap();

    assert_eq!(
        verdict,
        Verdict::RemovalFailed {
            kind: ViolationKind::Message,
            strikes: 2
        }
    );
    assert!(h
        .transport
        .sent_texts()
        .contains(&format!("Cannot remove @{USER_NUMBER}. Bot must be admin.")));
    assert_eq!(
        h.db
            .strike_count(GROUP_ID, USER_ID, ViolationKind::Message)
            .await
            .unwrap(),
        2
    );
    assert_eq!(h.db.actions().await.unwrap().len(), 2);
}

#[tokio::test]
async fn delete_failure_does_not_undo_strike() {
    let h = harness(FakeGenerator::always("ok"));
    h.transport.fail_delete.store(true, Ordering::SeqCst);

    let verdict = h
        .moderator
        .process(&group_text("m1", "haram cheez"))
        .await
        .unwrap();

    assert_eq!(
        verdict,
        Verdict::Warned {
            kind: ViolationKind::Message,
            strikes: 1
        }
    );
    assert_eq!(h.db.actions().await.unwrap().len(), 1);
}

// ============================================================
// Stickers
// ============================================================

#[tokio::test]
async fn three_stickers_warn_fourth_removes() {
    let h = harness(FakeGenerator::always("ok"));

    for (i, expected) in (1..=3).enumerate() {
        let verdict = h
            .moderator
            .process(&group_sticker(&format!("s{i}")))
            .await
            .unwrap();
        assert_eq!(
            verdict,
            Verdict::Warned {
                kind: ViolationKind::Sticker,
                strikes: expected
            }
        );
    }
    assert_eq!(h.transport.removals(), 0);

    let verdict = h.moderator.process(&group_sticker("s4")).await.unwrap();
    assert_eq!(
        verdict,
        Verdict::Removed {
            kind: ViolationKind::Sticker,
            strikes: 4
        }
    );
    assert_eq!(h.transport.removals(), 1);
    assert!(h
        .transport
        .sent_texts()
        .contains(&format!("Warning @{USER_NUMBER}, stickers are not allowed. Strike: 4")));

    let actions = h.db.actions().await.unwrap();
    assert!(actions.iter().all(|a| a.kind == AuditKind::StickerViolation));
    assert!(actions.iter().all(|a| a.message.is_none()));
}

#[tokio::test]
async fn sticker_and_message_strikes_are_separate() {
    let h = harness(FakeGenerator::always("ok"));

    h.moderator.process(&group_sticker("s1")).await.unwrap();
    h.moderator.process(&group_sticker("s2")).await.unwrap();
    let verdict = h
        .moderator
        .process(&group_text("m1", "kutte"))
        .await
        .unwrap();

    assert_eq!(
        verdict,
        Verdict::Warned {
            kind: ViolationKind::Message,
            strikes: 1
        }
    );
}

#[tokio::test]
async fn private_sticker_is_ignored() {
    let h = harness(FakeGenerator::always("ok"));

    let verdict = h
        .moderator
        .process(&message("s1", PRIVATE_ID, "", MessageKind::Sticker))
        .await
        .unwrap();

    assert_eq!(verdict, Verdict::Allowed);
    assert!(h.transport.calls().is_empty());
}

// ============================================================
// Private chats
// ============================================================

#[tokio::test]
async fn private_profanity_blocks_once_without_strikes() {
    let h = harness(FakeGenerator::always("ok"));

    let verdict = h
        .moderator
        .process(&private_text("p1", "madarchod"))
        .await
        .unwrap();

    assert_eq!(verdict, Verdict::Blocked);
    assert_eq!(h.transport.blocks(), 1);
    assert_eq!(
        h.transport.replies(),
        vec!["Blocked for abusive language.".to_string()]
    );

    let actions = h.db.actions().await.unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].kind, AuditKind::Blocked);
    assert_eq!(actions[0].strikes, None);
    assert_eq!(actions[0].chat, None);

    let stats = h.db.stats().await.unwrap();
    assert_eq!(stats.groups, 0);
    assert_eq!(stats.users_with_strikes, 0);
}

#[tokio::test]
async fn clean_private_message_does_nothing() {
    let h = harness(FakeGenerator::always("ok"));

    let verdict = h
        .moderator
        .process(&private_text("p1", "!help please"))
        .await
        .unwrap();

    assert_eq!(verdict, Verdict::Allowed);
    assert!(h.transport.calls().is_empty());
}

// ============================================================
// Commands
// ============================================================

#[tokio::test]
async fn info_without_match_replies_not_found_without_rephrase() {
    let h = harness(FakeGenerator::always("ok"));

    let verdict = h
        .moderator
        .process(&group_text("c1", "!info who won the cricket match"))
        .await
        .unwrap();

    assert_eq!(verdict, Verdict::Command);
    assert_eq!(
        h.transport.sent_texts(),
        vec![format!("*Answer*\n{NOT_FOUND_REPLY}")]
    );
    // Only the safety screen reached the model.
    assert!(h
        .generator
        .prompts()
        .iter()
        .all(|p| !p.contains("Relevant Q/A")));
}

#[tokio::test]
async fn info_with_match_rephrases_document_answer() {
    let h = harness(FakeGenerator::always("Applications close on 31 July."));

    h.moderator
        .process(&group_text("c1", "!info what are the admission deadlines"))
        .await
        .unwrap();

    let rephrase = h
        .generator
        .prompts()
        .into_iter()
        .find(|p| p.contains("Relevant Q/A"))
        .expect("rephrase prompt sent");
    assert!(rephrase.contains("Applications close on 31 July; late applications until 15 August."));
    assert_eq!(
        h.transport.sent_texts(),
        vec!["*Answer*\nApplications close on 31 July.".to_string()]
    );
}

#[tokio::test]
async fn bot_question_within_cooldown_is_skipped() {
    let h = harness(FakeGenerator::always("Rust is a language."));

    h.moderator
        .process(&group_text("c1", "!bot what is rust"))
        .await
        .unwrap();
    let calls_after_first = h.generator.calls();

    h.moderator
        .process(&group_text("c2", "!bot and what is cargo"))
        .await
        .unwrap();

    let texts = h.transport.sent_texts();
    assert_eq!(
        texts,
        vec![
            THINKING_REPLY.to_string(),
            "Rust is a language.".to_string(),
            THINKING_REPLY.to_string(),
            COOLDOWN_REPLY.to_string(),
        ]
    );
    // The second message only reached the model through the safety screen.
    assert_eq!(h.generator.calls(), calls_after_first + 1);
}

#[tokio::test]
async fn ping_reports_latency() {
    let h = harness(FakeGenerator::always("ok"));

    h.moderator.process(&group_text("c1", "!PING")).await.unwrap();

    let texts = h.transport.sent_texts();
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0], "Pong!");
    assert!(texts[1].starts_with("Alive! Response time: "));
    assert!(texts[1].ends_with(" ms"));
}

#[tokio::test]
async fn search_without_provider_says_unavailable() {
    let h = harness(FakeGenerator::always("ok"));

    h.moderator
        .process(&group_text("c1", "!google rust"))
        .await
        .unwrap();

    assert_eq!(
        h.transport.sent_texts(),
        vec!["Search is not configured on this bot.".to_string()]
    );
}

// ============================================================
// Failure isolation
// ============================================================

#[tokio::test]
async fn own_messages_are_ignored() {
    let h = harness(FakeGenerator::always("ok"));
    let mut msg = group_text("m1", "fuck");
    msg.from_me = true;

    assert_eq!(h.moderator.process(&msg).await.unwrap(), Verdict::Ignored);
    assert!(h.transport.calls().is_empty());
    assert!(h.db.actions().await.unwrap().is_empty());
}

#[tokio::test]
async fn handler_error_is_contained() {
    let h = harness(FakeGenerator::always("ok"));

    let failed = h
        .moderator
        .handle(message("m1", "unknown@g.us", "fuck", MessageKind::Text))
        .await;
    assert_eq!(failed, None);

    // The next message is handled normally.
    let next = h.moderator.handle(group_text("m2", "fuck")).await;
    assert_eq!(
        next,
        Some(Verdict::Warned {
            kind: ViolationKind::Message,
            strikes: 1
        })
    );
}
