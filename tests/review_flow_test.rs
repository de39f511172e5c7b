/// Integration tests for the moderator review flow driven through the
/// router: loading reports, dispositions, follow-up delivery and gating.
mod common;

use common::*;
use warden::classifier::Verdict;
use warden::records::{Credibility, DecisionAction, RecordStatus};

/// File report 1 the way a user would.
async fn file_report(f: &Fixture) {
    f.dm_sequence(
        REPORTER,
        REPORTER_DM,
        &["report", "/1/2/3", "yes", "myself", "h", "b", "threatening me"],
    )
    .await;
    f.host.drain_sent(REPORTER_DM);
    f.host.drain_sent(MOD_CHANNEL);
}

#[tokio::test]
async fn test_review_end_to_end_with_followup_delivery() {
    let f = fixture();
    file_report(&f).await;

    f.dm_sequence(MODERATOR, MODERATOR_DM, &["review", "1", "yes", "no"])
        .await;

    // Nothing reaches the reporter until the review completes.
    assert!(f.host.sent(REPORTER_DM).is_empty());
    assert_eq!(f.router.active_sessions(), 1);

    f.dm_sequence(MODERATOR, MODERATOR_DM, &["remove post"]).await;
    assert_eq!(f.router.active_sessions(), 0);

    // The review record persisted with its decision.
    let review = f
        .ctx
        .store
        .load_review(1, f.ctx.host.as_ref())
        .await
        .expect("review should be stored");
    assert_eq!(review.record.status, RecordStatus::Complete);
    assert_eq!(review.record.credibility, Credibility::Credible);
    assert_eq!(review.record.decision, vec![DecisionAction::RemovePost]);
    assert_eq!(review.record.moderator_id, MODERATOR);
    let embedded = review.report.expect("report embedded on load");
    assert_eq!(embedded.record.report_id, 1);

    // The reporter got the queued update plus the resources note, in order.
    let dm = f.host.sent(REPORTER_DM);
    assert_eq!(dm.len(), 2);
    assert!(dm[0].contains("Update regarding report number 1."));
    assert!(dm[0].contains("The post will be removed."));
    assert_eq!(dm[1], "*Resources for the victim*");

    // The moderation channel saw the removal order and the closing notice.
    let mod_channel = f.host.sent(MOD_CHANNEL);
    assert!(mod_channel.iter().any(|m| m.contains("--Remove message: /1/2/3--")));
    assert!(mod_channel.iter().any(|m| m.contains("---- Review closed ----")));
}

#[tokio::test]
async fn test_not_credible_short_circuits_to_no_action() {
    let f = fixture();
    file_report(&f).await;

    f.dm_sequence(MODERATOR, MODERATOR_DM, &["review", "1", "no"]).await;

    assert_eq!(f.router.active_sessions(), 0);
    let review = f
        .ctx
        .store
        .load_review(1, f.ctx.host.as_ref())
        .await
        .unwrap();
    assert_eq!(review.record.credibility, Credibility::NotCredible);
    assert_eq!(review.record.decision, vec![DecisionAction::NoAction]);

    let dm = f.host.sent(REPORTER_DM);
    assert_eq!(dm.len(), 1);
    assert!(dm[0].contains("No action will be taken."));
}

#[tokio::test]
async fn test_nonexistent_report_number_reprompts() {
    let f = fixture();

    f.dm_sequence(MODERATOR, MODERATOR_DM, &["review", "99"]).await;

    let dm = f.host.sent(MODERATOR_DM);
    let error = dm
        .iter()
        .find(|m| m.contains("Error loading report"))
        .expect("error reply");
    assert!(error.contains("Please try again"));
    assert!(dm.iter().any(|m| m.contains("report number you wish to review")));
    // The review session is still waiting on a number.
    assert_eq!(f.router.active_sessions(), 1);
}

#[tokio::test]
async fn test_non_moderator_cannot_start_review() {
    let f = fixture();

    f.dm_sequence(REPORTER, REPORTER_DM, &["review"]).await;

    let dm = f.host.sent(REPORTER_DM);
    assert!(dm[0].contains("Only recognized moderators"));
    assert_eq!(f.router.active_sessions(), 0);
}

#[tokio::test]
async fn test_modreview_alias_starts_review() {
    let f = fixture();
    file_report(&f).await;

    f.dm_sequence(MODERATOR, MODERATOR_DM, &["modreview"]).await;
    assert_eq!(f.router.active_sessions(), 1);
    let dm = f.host.sent(MODERATOR_DM);
    assert!(dm[0].contains("report number you wish to review"));
}

#[tokio::test]
async fn test_auto_flagged_report_asks_flag_confirm() {
    let f = fixture_with(vec![Ok(Verdict::Flagged)]);

    // A flagged message in the watched channel files report 1 automatically.
    let flagged = watched_snapshot(70, "send me $500 or I'll post them online");
    f.host.add_message(flagged.clone());
    f.router.handle_guild_message(&flagged).await.unwrap();
    f.host.drain_sent(MOD_CHANNEL);

    f.dm_sequence(MODERATOR, MODERATOR_DM, &["review", "1"]).await;
    let dm = f.host.drain_sent(MODERATOR_DM);
    assert!(dm
        .iter()
        .any(|m| m.contains("victim and offender")));

    // "no" annotates the next prompt but continues to credibility.
    f.dm_sequence(MODERATOR, MODERATOR_DM, &["no"]).await;
    let dm = f.host.drain_sent(MODERATOR_DM);
    assert!(dm[0].contains("specialized team"));
    assert!(dm[0].contains("credible report"));
    assert_eq!(f.router.active_sessions(), 1);
}

#[tokio::test]
async fn test_immediate_danger_alerts_before_completion() {
    let f = fixture();
    file_report(&f).await;

    f.dm_sequence(MODERATOR, MODERATOR_DM, &["review", "1", "yes", "yes"])
        .await;

    // The alert goes out immediately, while the review is still open.
    assert_eq!(f.router.active_sessions(), 1);
    let mod_channel = f.host.sent(MOD_CHANNEL);
    assert!(mod_channel
        .iter()
        .any(|m| m.contains("Detected Immediate Danger!")));
    assert!(f.host.sent(REPORTER_DM).is_empty());

    f.dm_sequence(MODERATOR, MODERATOR_DM, &["max penalty"]).await;
    let review = f
        .ctx
        .store
        .load_review(1, f.ctx.host.as_ref())
        .await
        .unwrap();
    assert_eq!(
        review.record.decision,
        vec![
            DecisionAction::BanOffender,
            DecisionAction::EngageLawEnforcement
        ]
    );
    // Two queued follow-ups, no resources note on the danger path.
    let dm = f.host.sent(REPORTER_DM);
    assert_eq!(dm.len(), 2);
    assert!(dm[1].contains("Law enforcement will be engaged."));
}

#[tokio::test]
async fn test_cancelled_review_delivers_nothing() {
    let f = fixture();
    file_report(&f).await;

    f.dm_sequence(
        MODERATOR,
        MODERATOR_DM,
        &["review", "1", "yes", "no", "cancel"],
    )
    .await;

    assert_eq!(f.router.active_sessions(), 0);
    let review = f
        .ctx
        .store
        .load_review(1, f.ctx.host.as_ref())
        .await
        .unwrap();
    assert_eq!(review.record.status, RecordStatus::Cancelled);
    // The victim-resources note was staged but must not be delivered.
    assert!(f.host.sent(REPORTER_DM).is_empty());
}
