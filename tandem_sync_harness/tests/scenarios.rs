// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end scenarios: a synchronizer over simulated elements.

use tandem_core::config::{RouterConfig, SyncConfig};
use tandem_core::format::{FormatId, StreamKey, Track};
use tandem_core::media::{MediaErrorKind, MediaEvent, MediaElement, ReadyState};
use tandem_core::proxy::{RewriteConfig, RewriteRule};
use tandem_core::router::{Command, Focus, InputRouter, KeyPress, Modifiers};
use tandem_core::session::SyncState;
use tandem_core::sync::Synchronizer;
use tandem_core::time::Duration;
use tandem_core::trace::Condition;
use tandem_sync_harness::drift::{DriftGrade, DriftTracker};
use tandem_sync_harness::recording::{RecordingHints, RecordingSink};
use tandem_sync_harness::rig::{
    AUDIO_EN, HD, MUXED, PAGE_ORIGIN, Rig, SD, fixture_catalog, upstream_url,
};
use tandem_sync_harness::sim::SimElement;

fn key(id: &str, track: Track) -> StreamKey {
    StreamKey {
        track,
        id: FormatId::new(id),
    }
}

// ---------------------------------------------------------------------------
// Join barrier and gesture gating
// ---------------------------------------------------------------------------

#[test]
fn video_readiness_alone_does_not_start_playback() {
    let mut rig = Rig::new(HD).unwrap();
    rig.dispatch(Command::RecordGesture);
    rig.dispatch(Command::Play);
    assert_eq!(rig.state(), SyncState::Loading);
    assert_eq!(
        rig.sync.session().active_audio(),
        Some(&FormatId::new(AUDIO_EN))
    );

    rig.video.load_ready(30.0);
    rig.event(Track::Video, MediaEvent::CanPlay);
    rig.run(500, 50);
    assert_eq!(rig.state(), SyncState::Loading);
    assert_eq!(rig.video.play_count(), 0);
    assert_eq!(rig.audio.play_count(), 0);

    rig.audio.load_ready(30.0);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Playing);
    assert_eq!(rig.video.play_count(), 1);
    assert_eq!(rig.audio.play_count(), 1);
}

#[test]
fn play_before_gesture_is_a_no_op() {
    let mut rig = Rig::new(HD).unwrap();
    rig.ready_both(30.0);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Paused);

    rig.dispatch(Command::Play);
    assert_eq!(rig.state(), SyncState::Paused);
    assert_eq!(rig.video.play_count(), 0);
    assert!(rig.sink.conditions().contains(&Condition::GestureRequired));

    rig.dispatch(Command::RecordGesture);
    rig.dispatch(Command::Play);
    assert_eq!(rig.state(), SyncState::Playing);
    assert_eq!(rig.video.play_count(), 1);
    assert_eq!(rig.audio.play_count(), 1);
}

#[test]
fn first_key_press_records_gesture_and_toggles_once() {
    let mut rig = Rig::new(HD).unwrap();
    let mut router = InputRouter::new(RouterConfig::web());
    let press = KeyPress {
        key: "k",
        modifiers: Modifiers::default(),
        focus: Focus::Other,
    };

    for _ in 0..3 {
        let routed = router.key(&press, rig.now);
        for command in routed.commands {
            rig.dispatch(command);
        }
        rig.now = rig.now + Duration::from_millis(20);
    }
    assert!(rig.sync.session().user_has_interacted());
    assert!(rig.sync.session().pending_resume());

    rig.ready_both(30.0);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Playing);
    assert_eq!(rig.video.play_count(), 1);
}

#[test]
fn page_supplied_source_is_not_reassigned() {
    let catalog = fixture_catalog();
    let url = catalog
        .video(&FormatId::new(HD))
        .and_then(|f| f.url())
        .unwrap()
        .to_owned();
    let (video_el, video) = SimElement::with_source(&url);
    let (audio_el, audio) = SimElement::new();
    let sink = RecordingSink::new();
    let sync = Synchronizer::new(
        SyncConfig::web(),
        RewriteRule::new(&RewriteConfig::default(), PAGE_ORIGIN).unwrap(),
        catalog,
        &FormatId::new(HD),
        video_el,
        audio_el,
        RecordingHints::new(),
        Box::new(sink.clone()),
        tandem_core::time::HostTime(0),
    )
    .unwrap();

    assert!(video.sources().is_empty());
    assert_eq!(audio.sources().len(), 1);
    assert_eq!(sync.video().source().as_deref(), Some(url.as_str()));
    assert_eq!(sink.load_attempts().len(), 2);
}

#[test]
fn unknown_initial_format_fails_construction() {
    assert!(Rig::new("999").is_err());
}

// ---------------------------------------------------------------------------
// Loader: proxy fallback, backoff, exhaustion, warming
// ---------------------------------------------------------------------------

#[test]
fn rejected_source_moves_to_proxy_host_only() {
    let mut rig = Rig::new(HD).unwrap();
    let first = rig.video.source().unwrap();

    rig.event(Track::Video, MediaEvent::Error(MediaErrorKind::SourceNotSupported));
    let second = rig.video.source().unwrap();

    assert_eq!(
        first,
        "https://rr1---sn-a.googlevideo.com/videoplayback?itag=137&host=rr1---sn-a.googlevideo.com"
    );
    assert_eq!(second, "https://tube.example/videoplayback?itag=137");
    assert!(rig.sync.proxies().is_proxied(&key(HD, Track::Video)));
    assert!(!rig.sync.proxies().is_proxied(&key(AUDIO_EN, Track::Audio)));

    let fallbacks = rig.sink.proxy_fallbacks();
    assert_eq!(fallbacks.len(), 1);
    assert_eq!(fallbacks[0].original, first);
    assert_eq!(fallbacks[0].proxied, second);
    // The retry counts as a fresh first attempt.
    assert_eq!(rig.sink.load_attempts().last().map(|a| a.attempt), Some(1));
}

#[test]
fn rejected_audio_keeps_raw_query_on_proxy() {
    let mut rig = Rig::new(HD).unwrap();
    let first = rig.audio.source().unwrap();
    assert_eq!(
        first,
        upstream_url("rr1---sn-a", AUDIO_EN, "&xtags=lang=en-US:acont=original")
    );

    rig.event(Track::Audio, MediaEvent::Error(MediaErrorKind::SourceNotSupported));
    assert_eq!(
        rig.audio.source().unwrap(),
        "https://tube.example/videoplayback?itag=140&xtags=lang=en-US:acont=original"
    );
    assert!(rig.sync.proxies().is_proxied(&key(AUDIO_EN, Track::Audio)));
    assert!(!rig.sync.proxies().is_proxied(&key(HD, Track::Video)));
}

#[test]
fn proxied_stream_reloads_directly_through_proxy() {
    let mut rig = Rig::new(HD).unwrap();
    rig.event(Track::Video, MediaEvent::Error(MediaErrorKind::SourceNotSupported));
    let proxied = rig.video.source().unwrap();

    rig.dispatch(Command::SelectQuality(FormatId::new(SD)));
    // Carried over to the replacement stream.
    assert!(rig.sync.proxies().is_proxied(&key(SD, Track::Video)));
    assert!(rig.video.source().unwrap().starts_with("https://tube.example/"));

    rig.dispatch(Command::SelectQuality(FormatId::new(HD)));
    assert_eq!(rig.video.source().unwrap(), proxied);
    assert_eq!(rig.sink.proxy_fallbacks().len(), 1);
}

#[test]
fn retries_exhaust_with_increasing_delays() {
    let config = SyncConfig {
        max_retries: 3,
        ..SyncConfig::web()
    };
    let mut rig = Rig::with(config, fixture_catalog(), HD).unwrap();

    rig.event(Track::Video, MediaEvent::Error(MediaErrorKind::Network));
    rig.step(1_999);
    assert_eq!(rig.video.sources().len(), 1);
    rig.step(1);
    assert_eq!(rig.video.sources().len(), 2);

    rig.event(Track::Video, MediaEvent::Error(MediaErrorKind::Network));
    rig.step(4_000);
    assert_eq!(rig.video.sources().len(), 3);

    rig.event(Track::Video, MediaEvent::Error(MediaErrorKind::Network));
    rig.run(60_000, 1_000);
    assert_eq!(rig.video.sources().len(), 3);

    let video_attempts: Vec<u32> = rig
        .sink
        .load_attempts()
        .iter()
        .filter(|a| a.track == Track::Video)
        .map(|a| a.attempt)
        .collect();
    assert_eq!(video_attempts, [1, 2, 3]);

    let delays: Vec<u64> = rig.sink.retries().iter().map(|r| r.delay.as_millis()).collect();
    assert_eq!(delays, [2_000, 4_000]);

    let unavailable = rig.sink.unavailable();
    assert_eq!(unavailable.len(), 1);
    assert_eq!(unavailable[0].attempts, 3);
    // Video exhaustion leaves the session loading.
    assert_eq!(rig.state(), SyncState::Loading);
}

#[test]
fn errors_after_lock_are_ignored() {
    let mut rig = Rig::new(HD).unwrap();
    rig.event(Track::Video, MediaEvent::CanPlay);
    rig.event(Track::Video, MediaEvent::Error(MediaErrorKind::SourceNotSupported));
    rig.run(10_000, 500);
    assert_eq!(rig.video.sources().len(), 1);
    assert!(rig.sink.proxy_fallbacks().is_empty());
    assert!(rig.sink.retries().is_empty());
}

#[test]
fn second_rejection_falls_back_to_backoff() {
    let mut rig = Rig::new(HD).unwrap();
    rig.event(Track::Video, MediaEvent::Error(MediaErrorKind::SourceNotSupported));
    rig.event(Track::Video, MediaEvent::Error(MediaErrorKind::SourceNotSupported));
    assert_eq!(rig.sink.proxy_fallbacks().len(), 1);
    assert_eq!(rig.sink.retries().len(), 1);
}

#[test]
fn audio_exhaustion_degrades_to_video_only() {
    let config = SyncConfig {
        max_retries: 1,
        ..SyncConfig::web()
    };
    let mut rig = Rig::with(config, fixture_catalog(), HD).unwrap();
    rig.dispatch(Command::RecordGesture);
    rig.dispatch(Command::Play);

    rig.event(Track::Audio, MediaEvent::Error(MediaErrorKind::Network));
    assert!(rig.sink.conditions().contains(&Condition::AudioDegraded));

    rig.video.load_ready(30.0);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Playing);
    assert_eq!(rig.video.play_count(), 1);
    assert_eq!(rig.audio.play_count(), 0);
}

#[test]
fn each_origin_is_warmed_once() {
    let mut rig = Rig::new(HD).unwrap();
    // Video and audio share an origin.
    assert_eq!(
        rig.hints.preconnected(),
        ["https://rr1---sn-a.googlevideo.com"]
    );

    rig.event(Track::Video, MediaEvent::Error(MediaErrorKind::SourceNotSupported));
    rig.dispatch(Command::SelectQuality(FormatId::new(SD)));
    assert_eq!(
        rig.hints.preconnected(),
        ["https://rr1---sn-a.googlevideo.com", "https://tube.example"]
    );
    assert_eq!(rig.hints.hints().len(), 4);
}

// ---------------------------------------------------------------------------
// Drift correction
// ---------------------------------------------------------------------------

#[test]
fn drift_within_threshold_is_left_alone() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.audio.slip_to(rig.video.current_time() + 0.15);
    rig.run(2_000, 250);

    assert!(!rig.sink.drift_samples().is_empty());
    assert!(rig.sink.corrections().is_empty());
    assert!(rig.audio.seeks().is_empty());
}

#[test]
fn excess_drift_is_corrected_exactly_once() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.step(250);
    assert_eq!(rig.sink.drift_samples().len(), 1);

    rig.audio.slip_to(rig.audio.current_time() + 0.5);
    rig.step(250);
    assert_eq!(rig.sink.corrections().len(), 1);
    assert_eq!(rig.audio.seeks(), [0.5]);

    rig.run(2_000, 250);
    assert_eq!(rig.sink.corrections().len(), 1);
    assert_eq!(rig.sync.snapshot().corrections, 1);
}

#[test]
fn corrections_are_throttled() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.step(250);
    rig.audio.slip_to(rig.audio.current_time() + 0.5);
    rig.step(250);
    assert_eq!(rig.sink.corrections().len(), 1);

    rig.audio.slip_to(rig.audio.current_time() + 1.0);
    rig.run(1_250, 250);
    assert_eq!(rig.sink.corrections().len(), 1);
    rig.step(250);
    assert_eq!(rig.sink.corrections().len(), 2);
}

#[test]
fn drift_is_not_corrected_without_audio_lookahead() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.audio.buffer_to(1.0);
    rig.audio.slip_to(0.6);
    rig.run(1_000, 250);
    assert!(rig.sink.corrections().is_empty());
}

#[test]
fn corrected_playback_grades_well() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(120.0);
    rig.run(1_000, 250);
    rig.audio.slip_to(rig.audio.current_time() - 0.4);
    rig.run(5_000, 250);

    let mut tracker = DriftTracker::<8>::new();
    let mut last = None;
    for sample in rig.sink.drift_samples() {
        last = Some(tracker.observe(&sample));
    }
    let report = last.unwrap();
    assert_eq!(report.grade, DriftGrade::A, "window: {:?}", tracker.window());
    assert!(report.samples > 8);
}

// ---------------------------------------------------------------------------
// Seek
// ---------------------------------------------------------------------------

#[test]
fn seek_freezes_until_both_have_lookahead() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(10.0);

    rig.dispatch(Command::SeekTo(30.0));
    assert_eq!(rig.state(), SyncState::Seeking);
    assert!(rig.sync.session().is_frozen_for_buffering());
    assert!(rig.video.is_paused() && rig.audio.is_paused());
    assert_eq!(rig.video.current_time(), 30.0);
    assert_eq!(rig.audio.current_time(), 30.0);

    rig.video.add_buffered(29.0, 40.0);
    rig.run(500, 50);
    assert_eq!(rig.state(), SyncState::Seeking);

    rig.audio.add_buffered(29.5, 40.0);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Playing);
    assert_eq!(rig.video.play_count(), 2);
    assert_eq!(rig.audio.play_count(), 2);
}

#[test]
fn newer_seek_supersedes_pending_one() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(10.0);

    rig.dispatch(Command::SeekTo(30.0));
    rig.dispatch(Command::SeekTo(50.0));
    rig.video.add_buffered(29.0, 40.0);
    rig.audio.add_buffered(29.0, 40.0);
    rig.run(500, 50);
    assert_eq!(rig.state(), SyncState::Seeking);

    rig.video.add_buffered(49.0, 60.0);
    rig.audio.add_buffered(49.0, 60.0);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Playing);
    assert_eq!(rig.video.current_time(), 50.0);
}

#[test]
fn seek_from_pause_stays_paused() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.dispatch(Command::Pause);
    rig.dispatch(Command::SeekBy(10.0));
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Paused);
    assert_eq!(rig.video.current_time(), 10.0);
    assert_eq!(rig.video.play_count(), 1);
}

#[test]
fn play_during_seek_only_requests_resume() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(10.0);
    rig.dispatch(Command::Pause);
    rig.dispatch(Command::SeekTo(30.0));
    rig.dispatch(Command::Play);
    assert_eq!(rig.state(), SyncState::Seeking);
    assert_eq!(rig.video.play_count(), 1);

    rig.video.add_buffered(30.0, 40.0);
    rig.audio.add_buffered(30.0, 40.0);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Playing);
}

#[test]
fn seek_watchdog_resumes_anyway() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(10.0);
    rig.dispatch(Command::SeekTo(30.0));
    rig.run(7_900, 100);
    assert_eq!(rig.state(), SyncState::Seeking);
    rig.run(200, 100);
    assert_eq!(rig.state(), SyncState::Playing);
    assert!(
        rig.sink
            .conditions()
            .contains(&Condition::WatchdogFired(SyncState::Seeking))
    );
}

#[test]
fn timestamp_link_seeks_and_rewrites_address() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    let mut router = InputRouter::new(RouterConfig::web());

    let routed = router
        .timestamp_link("90", None, "https://tube.example/watch?v=abc")
        .unwrap();
    for command in routed.commands {
        rig.dispatch(command);
    }
    assert_eq!(rig.state(), SyncState::Seeking);
    assert_eq!(rig.video.current_time(), 90.0);
    assert!(routed.address.unwrap().ends_with("t=1m30s"));
}

// ---------------------------------------------------------------------------
// Stalls
// ---------------------------------------------------------------------------

#[test]
fn video_stall_mutes_audio_then_realigns() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.run(1_000, 250);

    rig.video.set_ready(ReadyState::HaveCurrentData);
    rig.event(Track::Video, MediaEvent::Waiting);
    assert_eq!(rig.state(), SyncState::BufferStalled);
    assert!(rig.audio.is_muted());
    assert!(!rig.audio.is_paused());

    rig.run(1_000, 250);
    assert_eq!(rig.state(), SyncState::BufferStalled);
    assert!(rig.sink.corrections().is_empty());

    rig.video.set_ready(ReadyState::HaveEnoughData);
    rig.event(Track::Video, MediaEvent::Playing);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Playing);
    assert!(!rig.audio.is_muted());
    assert_eq!(rig.audio.seeks().last().copied(), Some(rig.video.current_time()));
}

#[test]
fn audio_stall_pauses_video() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);

    rig.audio.set_ready(ReadyState::HaveMetadata);
    rig.event(Track::Audio, MediaEvent::Waiting);
    assert_eq!(rig.state(), SyncState::BufferStalled);
    assert!(rig.video.is_paused());
    assert!(!rig.audio.is_muted());

    rig.audio.set_ready(ReadyState::HaveEnoughData);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Playing);
    assert!(!rig.video.is_paused());
}

#[test]
fn stall_watchdog_forces_resume() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.video.set_ready(ReadyState::HaveCurrentData);
    rig.event(Track::Video, MediaEvent::Waiting);
    rig.run(10_000, 500);
    assert_eq!(rig.state(), SyncState::Playing);
    assert!(!rig.audio.is_muted());
    assert!(
        rig.sink
            .conditions()
            .contains(&Condition::WatchdogFired(SyncState::BufferStalled))
    );
}

#[test]
fn pause_during_stall_unmutes_and_rests() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.video.set_ready(ReadyState::HaveCurrentData);
    rig.event(Track::Video, MediaEvent::Waiting);
    rig.dispatch(Command::Pause);
    assert_eq!(rig.state(), SyncState::Paused);
    assert!(!rig.audio.is_muted());
    rig.run(12_000, 1_000);
    assert_eq!(rig.state(), SyncState::Paused);
}

// ---------------------------------------------------------------------------
// Quality switch
// ---------------------------------------------------------------------------

#[test]
fn quality_switch_restores_position() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.run(2_000, 250);
    let position = rig.video.current_time();
    assert!(position > 1.9);

    rig.dispatch(Command::SelectQuality(FormatId::new(SD)));
    assert_eq!(rig.state(), SyncState::QualitySwitching);
    assert!(rig.sync.session().is_quality_switch_in_progress());
    assert_eq!(rig.sync.session().active_video(), &FormatId::new(SD));
    assert_eq!(rig.video.source().unwrap(), upstream_url("rr2---sn-b", SD, ""));

    // Play while switching is deferred.
    rig.dispatch(Command::Play);
    rig.run(500, 50);
    assert_eq!(rig.video.play_count(), 1);

    rig.ready_both(60.0);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Playing);
    assert!(!rig.sync.session().is_quality_switch_in_progress());
    assert_eq!(rig.video.current_time(), position);
    assert_eq!(rig.audio.current_time(), position);
}

#[test]
fn switch_to_muxed_drops_audio() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.dispatch(Command::SelectQuality(FormatId::new(MUXED)));
    assert_eq!(rig.sync.session().active_audio(), None);
    assert_eq!(rig.audio.source(), None);

    rig.video.load_ready(60.0);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Playing);
    assert_eq!(rig.audio.play_count(), 1);
    assert_eq!(rig.sync.snapshot().drift, None);
}

#[test]
fn unknown_quality_is_reported_and_ignored() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.dispatch(Command::SelectQuality(FormatId::new("999")));
    assert_eq!(rig.state(), SyncState::Playing);
    assert_eq!(rig.video.sources().len(), 1);
    assert!(
        rig.sink
            .conditions()
            .contains(&Condition::UnknownFormat(FormatId::new("999")))
    );
}

#[test]
fn seek_during_switch_replaces_restore_position() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.dispatch(Command::SelectQuality(FormatId::new(SD)));
    rig.dispatch(Command::SeekTo(42.0));
    assert_eq!(rig.state(), SyncState::QualitySwitching);

    rig.ready_both(60.0);
    rig.step(10);
    assert_eq!(rig.state(), SyncState::Playing);
    assert_eq!(rig.video.current_time(), 42.0);
}

// ---------------------------------------------------------------------------
// Visibility, rejections and native controls
// ---------------------------------------------------------------------------

#[test]
fn hidden_page_suspends_drift_checks_until_visible() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.sync.set_page_visible(false, rig.now);
    rig.audio.slip_to(rig.audio.current_time() + 1.0);
    rig.run(2_000, 250);
    assert!(rig.sink.drift_samples().is_empty());
    assert!(!rig.sync.snapshot().page_visible);

    rig.sync.set_page_visible(true, rig.now);
    assert_eq!(rig.sink.corrections().len(), 1);
    assert_eq!(rig.audio.current_time(), rig.video.current_time());
}

#[test]
fn rejected_play_settles_paused() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);
    rig.sync.on_play_rejected(Track::Video, "NotAllowedError", rig.now);
    assert_eq!(rig.state(), SyncState::Paused);
    assert!(rig.audio.is_paused());
    assert!(matches!(
        rig.sink.conditions().last(),
        Some(Condition::PlayRejected {
            track: Track::Video,
            ..
        })
    ));
}

#[test]
fn native_controls_are_mirrored_to_audio() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(60.0);

    rig.video.set_paused(true);
    rig.event(Track::Video, MediaEvent::Pause);
    assert_eq!(rig.state(), SyncState::Paused);
    assert!(rig.audio.is_paused());

    rig.video.set_paused(false);
    rig.event(Track::Video, MediaEvent::Play);
    assert_eq!(rig.state(), SyncState::Playing);
    assert!(!rig.audio.is_paused());

    rig.video.set_rate(1.5);
    rig.event(Track::Video, MediaEvent::RateChange);
    assert_eq!(rig.audio.rate(), 1.5);

    rig.video.finish();
    rig.event(Track::Video, MediaEvent::Ended);
    assert_eq!(rig.state(), SyncState::Paused);
    assert!(rig.audio.is_paused());
}

#[test]
fn native_play_while_loading_is_held_back() {
    let mut rig = Rig::new(HD).unwrap();
    rig.video.set_paused(false);
    rig.event(Track::Video, MediaEvent::Play);
    assert!(rig.video.is_paused());
    assert!(rig.sync.session().pending_resume());
}

#[test]
fn state_changes_are_traced_in_order() {
    let mut rig = Rig::new(HD).unwrap();
    rig.start_playing(10.0);
    rig.dispatch(Command::SeekTo(5.0));
    rig.step(10);
    assert_eq!(
        rig.sink.states(),
        [
            SyncState::Loading,
            SyncState::Playing,
            SyncState::Seeking,
            SyncState::Playing,
        ]
    );
}
