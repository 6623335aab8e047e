//! End-to-end engine tests: store -> snapshot -> trend -> RTSI -> sector ->
//! market, exercising the documented scenarios against the public API only.

use chrono::NaiveDate;

use ratinglab_core::classify::{default_rtsi_bands, default_tma_bands, Metric};
use ratinglab_core::config::EngineConfig;
use ratinglab_core::domain::{
    RatingLevel, RatingObservation, SectorId, SecurityAttributes, SecurityId,
};
use ratinglab_core::error::ScoreError;
use ratinglab_core::market::{msci_trend_5d, score_market, MarketInputs};
use ratinglab_core::rtsi::score_security;
use ratinglab_core::sector::{score_sector, SectorInputs, SectorMember};
use ratinglab_core::store::RatingStore;
use ratinglab_core::trend::{estimate_trend, volume_factor};

fn day(i: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

/// A 90-day store: "RISER" climbs from sell territory to strong buy with
/// growing volume, "FLAT" never moves, "SINKER" degrades, "SPARSE" has only
/// three observations. All but SPARSE sit in one of two sectors.
fn fixture_store() -> RatingStore {
    let mut store = RatingStore::new();

    for i in 0..90u32 {
        // Steady upgrade, one level every ~15 observations.
        let level = RatingLevel::from_score((3 + i / 15).min(8) as u8).unwrap();
        let volume = 1000.0 + i as f64 * 30.0;
        store.append(
            SecurityId::from("RISER"),
            RatingObservation::with_volume(day(i), level, volume),
        );

        store.append(
            SecurityId::from("FLAT"),
            RatingObservation::new(day(i), RatingLevel::SlightSell),
        );

        let level = RatingLevel::from_score((6 - i / 20).max(1) as u8).unwrap();
        store.append(SecurityId::from("SINKER"), RatingObservation::new(day(i), level));
    }
    for i in 0..3u32 {
        store.append(
            SecurityId::from("SPARSE"),
            RatingObservation::new(day(i * 30), RatingLevel::Buy),
        );
    }

    for (id, sector, weight) in [
        ("RISER", "tech", 2.0),
        ("FLAT", "tech", 1.0),
        ("SINKER", "banks", 1.5),
        ("SPARSE", "banks", 0.5),
    ] {
        store.set_attributes(
            SecurityId::from(id),
            SecurityAttributes { sector: SectorId::from(sector), market_cap_weight: weight },
        );
    }
    store
}

#[test]
fn rising_security_outscores_degrading_one() {
    let store = fixture_store();
    let config = EngineConfig::default();
    let snap = store.snapshot(day(89));

    let score_of = |name: &str| {
        let id = SecurityId::from(name);
        let series = snap.series(&id).unwrap();
        let est = estimate_trend(&id, series, day(89), &config.window).unwrap();
        let window = series.window(day(89), config.window.lookback);
        score_security(
            &id,
            &est,
            volume_factor(window, config.window.recent_volume_days),
            &config.rtsi_weights,
            config.bands.table(Metric::Rtsi),
            day(89),
            snap.id(),
        )
    };

    let riser = score_of("RISER");
    let sinker = score_of("SINKER");

    assert!(riser.components.trend_slope > 0.0);
    assert!(sinker.components.trend_slope < 0.0);
    assert!(riser.rtsi > sinker.rtsi, "{} vs {}", riser.rtsi, sinker.rtsi);
    // Staircase fits are statistically clean for both.
    assert!(riser.components.confidence > 0.8, "got {}", riser.components.confidence);
    assert_eq!(riser.recent_level, RatingLevel::StrongBuy);
    // Rising volume on the riser; no volume data on the sinker.
    assert!(riser.components.volume_factor.is_some_and(|vf| vf > 1.0));
    assert_eq!(sinker.components.volume_factor, None);
    assert_eq!(riser.snapshot, *snap.id());
}

#[test]
fn sparse_security_is_reported_not_scored() {
    let store = fixture_store();
    let config = EngineConfig::default();
    let snap = store.snapshot(day(89));

    let id = SecurityId::from("SPARSE");
    let err = estimate_trend(&id, snap.series(&id).unwrap(), day(89), &config.window).unwrap_err();
    assert_eq!(err.status(), "insufficient_history");
    assert!(matches!(err, ScoreError::InsufficientHistory { observed: 3, required: 5, .. }));
}

#[test]
fn sector_with_one_scored_member_is_insufficient() {
    // "banks" has SINKER plus the unscorable SPARSE: one valid member.
    let store = fixture_store();
    let config = EngineConfig::default();
    let snap = store.snapshot(day(89));

    let members = vec![SectorMember { rtsi: 20.0, cap_weight: 1.5, score_change_5: Some(-1.0) }];
    let sector = SectorId::from("banks");
    let dates = snap.dates();
    let all: Vec<SecurityId> = snap.securities().cloned().collect();
    let market_series = snap.mean_score_series(&all, &dates);
    let bank_ids = vec![SecurityId::from("SINKER"), SecurityId::from("SPARSE")];
    let sector_series = snap.mean_score_series(&bank_ids, &dates);

    let err = score_sector(
        &SectorInputs {
            sector: &sector,
            members: &members,
            sector_series: &sector_series,
            market_series: &market_series,
            macro_adjustment: None,
        },
        &config.sector_weights,
        &config.sector_params,
        config.bands.table(Metric::Tma),
        day(89),
        snap.id(),
    )
    .unwrap_err();
    assert_eq!(err.status(), "insufficient_members");
}

#[test]
fn tech_sector_aggregates_its_two_members() {
    let store = fixture_store();
    let config = EngineConfig::default();
    let snap = store.snapshot(day(89));
    let dates = snap.dates();

    let sector = SectorId::from("tech");
    let tech_ids = vec![SecurityId::from("RISER"), SecurityId::from("FLAT")];
    let all: Vec<SecurityId> = snap.securities().cloned().collect();
    let sector_series = snap.mean_score_series(&tech_ids, &dates);
    let market_series = snap.mean_score_series(&all, &dates);

    // RISER strongly bullish, FLAT dead neutral, cap weights 2:1.
    let members = vec![
        SectorMember { rtsi: 80.0, cap_weight: 2.0, score_change_5: Some(1.0) },
        SectorMember { rtsi: 40.0, cap_weight: 1.0, score_change_5: Some(0.0) },
    ];
    let score = score_sector(
        &SectorInputs {
            sector: &sector,
            members: &members,
            sector_series: &sector_series,
            market_series: &market_series,
            macro_adjustment: None,
        },
        &config.sector_weights,
        &config.sector_params,
        config.bands.table(Metric::Tma),
        day(89),
        snap.id(),
    )
    .unwrap();
    assert!(score.tma > 0.0, "got {}", score.tma);
    assert_eq!(score.member_count, 2);
    assert!(score.components.technical > 0.0);
    assert_eq!(score.snapshot, *snap.id());
}

#[test]
fn market_composite_and_risk_from_history() {
    let config = EngineConfig::default();
    let store = fixture_store();
    let snap = store.snapshot(day(89));

    let inputs = MarketInputs {
        sentiment: 0.72,
        flow: 0.60,
        volatility: 0.55,
        positioning: 0.50,
        news_sentiment: None,
    };
    let score = score_market(
        &inputs,
        &config.msci_weights,
        config.bands.table(Metric::Msci),
        day(89),
        snap.id(),
    );
    assert!(score.msci > 55.0 && score.msci < 75.0, "got {}", score.msci);

    let mut history = vec![score.msci - 8.0; 5];
    history.extend(vec![score.msci; 5]);
    assert!((msci_trend_5d(&history) - 8.0).abs() < 1e-9);
}

#[test]
fn recomputation_from_equal_snapshots_is_bit_identical() {
    let config = EngineConfig::default();
    let run = || {
        let store = fixture_store();
        let snap = store.snapshot(day(89));
        let id = SecurityId::from("RISER");
        let series = snap.series(&id).unwrap();
        let est = estimate_trend(&id, series, day(89), &config.window).unwrap();
        let window = series.window(day(89), config.window.lookback);
        let score = score_security(
            &id,
            &est,
            volume_factor(window, config.window.recent_volume_days),
            &config.rtsi_weights,
            config.bands.table(Metric::Rtsi),
            day(89),
            snap.id(),
        );
        serde_json::to_string(&score).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn classification_labels_come_from_configured_tables() {
    assert_eq!(default_rtsi_bands().classify(89.3), "strong_bull");
    assert_eq!(default_tma_bands().classify(30.0), "strong");
}
