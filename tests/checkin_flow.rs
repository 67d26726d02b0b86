use std::{fs, sync::Arc};

use chrono::{Days, Local};
use focus_checkin_lib::{
    checkin::CheckinService,
    log_store::LogStore,
    models::{CheckinState, NotificationWindow},
    scheduling::{ChannelEmitter, ContextChange, SchedulerState},
    settings::{SettingsRepository, SettingsStore},
};
use tempfile::tempdir;

#[tokio::test(start_paused = true)]
async fn service_round_trip_with_file_backed_stores() {
    let dir = tempdir().expect("tempdir");
    let settings =
        Arc::new(SettingsStore::new(dir.path().join("settings.json")).expect("settings"));
    let log_store = LogStore::new(dir.path().join("Logs"));
    let (emitter, mut signals) = ChannelEmitter::new();

    let service = CheckinService::new(settings.clone(), log_store.clone(), Arc::new(emitter));
    service
        .set_notification_window(NotificationWindow::unrestricted())
        .await
        .expect("window");
    service.start().await.expect("start");

    let signal = tokio::time::timeout(std::time::Duration::from_secs(3 * 3600), signals.recv())
        .await
        .expect("check-in fired")
        .expect("channel open");

    service
        .submit_answer_with_question(
            Some(signal.question.as_str()),
            "drafting the release",
            CheckinState::Focused,
        )
        .await
        .expect("answer");
    service
        .submit_answer("stretching", CheckinState::Resting)
        .await
        .expect("answer");

    let today = service.today_entries().await.expect("today");
    assert_eq!(today.len(), 2);
    assert_eq!(today[0].question.as_deref(), Some(signal.question.as_str()));

    assert!(service.context_sender().notify(ContextChange::SystemWake));
    service.shutdown().await;
    assert_eq!(service.scheduler_state().await, SchedulerState::Idle);

    let reopened = SettingsStore::new(dir.path().join("settings.json")).expect("reopen");
    assert!(reopened.notification_window().is_unrestricted());
}

#[tokio::test]
async fn history_mixes_legacy_and_structured_days() {
    let dir = tempdir().expect("tempdir");
    let log_store = LogStore::new(dir.path().join("Logs"));
    let today = Local::now().date_naive();
    let yesterday = today.checked_sub_days(Days::new(1)).expect("yesterday");
    let three_days_ago = today.checked_sub_days(Days::new(3)).expect("three days ago");

    fs::create_dir_all(log_store.dir()).expect("logs dir");
    fs::write(
        log_store.path_for(three_days_ago),
        "😴 14:00 - Are you zoning out?\n   → yes\n\n✨ 15:00 - Are you able to focus?\n   → writing\n\n",
    )
    .expect("legacy day");
    fs::write(
        log_store.path_for(yesterday),
        "{\"time\":\"10:00\",\"response\":\"tea\",\"type\":\"break\"}\nnot json\n",
    )
    .expect("json day");

    let service = CheckinService::new(
        Arc::new(focus_checkin_lib::settings::InMemorySettings::default()),
        log_store,
        Arc::new(focus_checkin_lib::scheduling::LoggingEmitter),
    );

    let breakdown = service
        .recent_breakdown_until(5, today)
        .await
        .expect("breakdown");
    assert_eq!(breakdown.len(), 5);
    assert_eq!(breakdown[4].date, today);

    let legacy = breakdown[1];
    assert_eq!(legacy.date, three_days_ago);
    assert_eq!((legacy.focused, legacy.wandering, legacy.resting), (1, 1, 0));

    let structured = breakdown[3];
    assert_eq!(structured.date, yesterday);
    assert_eq!(structured.resting, 1);
    assert_eq!(structured.total(), 1);

    assert_eq!(
        service.logged_days().await.expect("days"),
        vec![three_days_ago, yesterday]
    );
    assert_eq!(service.stats_snapshot().await.checkin_count, 0);
}
