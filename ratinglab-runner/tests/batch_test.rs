//! End-to-end runner tests: CSV in, artifacts out.

use std::fmt::Write as _;
use std::io::Write as _;

use chrono::NaiveDate;

use ratinglab_core::store::RatingStore;
use ratinglab_runner::{
    import_json, load_attributes, load_observations, rank, run_batch, save_artifacts, RunConfig,
};

fn day(i: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

/// Same shape as the core fixture, but fed through the CSV path: a riser and
/// a flat security in "tech", a sinker and an unscorable sparse series in
/// "banks".
fn fixture_csvs() -> (String, String) {
    let mut obs = String::from("security_id,date,rating,volume\n");
    for i in 0..90u32 {
        let riser = (3 + i / 15).min(8);
        writeln!(obs, "RISER,{},{},{}", day(i), riser, 1000.0 + i as f64 * 30.0).unwrap();
        writeln!(obs, "FLAT,{},slight_sell,", day(i)).unwrap();
        let sinker = (6i32 - (i / 20) as i32).max(1);
        writeln!(obs, "SINKER,{},{},", day(i), sinker).unwrap();
    }
    for i in 0..3u32 {
        writeln!(obs, "SPARSE,{},buy,", day(i * 30)).unwrap();
    }

    let attrs = "security_id,sector_id,market_cap_weight\n\
                 RISER,tech,2.0\n\
                 FLAT,tech,1.0\n\
                 SINKER,banks,1.5\n\
                 SPARSE,banks,0.5\n"
        .to_string();
    (obs, attrs)
}

fn fixture_store() -> RatingStore {
    let dir = tempfile::tempdir().unwrap();
    let (obs, attrs) = fixture_csvs();
    let obs_path = dir.path().join("observations.csv");
    let attrs_path = dir.path().join("attributes.csv");
    std::fs::File::create(&obs_path).unwrap().write_all(obs.as_bytes()).unwrap();
    std::fs::File::create(&attrs_path).unwrap().write_all(attrs.as_bytes()).unwrap();

    let mut store = RatingStore::new();
    assert_eq!(load_observations(&mut store, &obs_path).unwrap(), 273);
    assert_eq!(load_attributes(&mut store, &attrs_path).unwrap(), 4);
    store
}

fn fixture_config() -> RunConfig {
    RunConfig { as_of: day(89), ..RunConfig::default() }
}

#[test]
fn full_batch_scores_and_skips_per_entity() {
    let store = fixture_store();
    let snapshot = store.snapshot(day(89));
    let result = run_batch(&snapshot, &fixture_config()).unwrap();

    assert_eq!(result.securities.len(), 3);
    assert_eq!(result.skipped_securities.len(), 1);
    assert_eq!(result.skipped_securities[0].id, "SPARSE");
    assert_eq!(result.skipped_securities[0].status, "insufficient_history");

    // "tech" has two scored members; "banks" only one, so it is skipped.
    assert_eq!(result.sectors.len(), 1);
    assert_eq!(result.sectors[0].sector.0, "tech");
    assert_eq!(result.skipped_sectors.len(), 1);
    assert_eq!(result.skipped_sectors[0].id, "banks");
    assert_eq!(result.skipped_sectors[0].status, "insufficient_members");

    assert!((0.0..=100.0).contains(&result.market.msci));
    assert_eq!(result.snapshot, *snapshot.id());
    assert_eq!(result.as_of, day(89));
}

#[test]
fn batch_is_deterministic_across_runs() {
    let store = fixture_store();
    let snapshot = store.snapshot(day(89));
    let config = fixture_config();

    let a = serde_json::to_string(&run_batch(&snapshot, &config).unwrap()).unwrap();
    let b = serde_json::to_string(&run_batch(&snapshot, &config).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn observations_after_as_of_are_invisible() {
    // The same analysis date must yield the same scores no matter how much
    // newer data the snapshot happens to carry.
    let store = fixture_store();
    let config = RunConfig { as_of: day(60), ..RunConfig::default() };

    let exact = run_batch(&store.snapshot(day(60)), &config).unwrap();
    let late = run_batch(&store.snapshot(day(89)), &config).unwrap();

    assert_eq!(exact.as_of, day(60));
    assert_eq!(late.as_of, day(60));
    assert_eq!(exact.securities.len(), late.securities.len());
    for (a, b) in exact.securities.iter().zip(&late.securities) {
        assert_eq!(a.security, b.security);
        assert_eq!(a.rtsi, b.rtsi);
        assert_eq!(a.components, b.components);
    }
    assert_eq!(exact.sectors.len(), late.sectors.len());
    for (a, b) in exact.sectors.iter().zip(&late.sectors) {
        assert_eq!(a.sector, b.sector);
        assert_eq!(a.tma, b.tma, "sector {} moved with future data", a.sector);
        assert_eq!(a.components, b.components);
    }
    assert_eq!(exact.market.msci, late.market.msci);
    assert_eq!(exact.market.components, late.market.components);
}

#[test]
fn invalid_config_is_fatal_before_scoring() {
    let store = fixture_store();
    let snapshot = store.snapshot(day(89));
    let mut config = fixture_config();
    config.engine.rtsi_weights.slope = 0.9;
    assert!(run_batch(&snapshot, &config).is_err());

    let mut config = fixture_config();
    config.engine.sector_params.winsor_lower = 0.9;
    config.engine.sector_params.winsor_upper = 0.1;
    assert!(run_batch(&snapshot, &config).is_err());
}

#[test]
fn news_sentiment_flows_into_the_composite() {
    let store = fixture_store();
    let snapshot = store.snapshot(day(89));

    let without = run_batch(&snapshot, &fixture_config()).unwrap();
    assert_eq!(without.market.components.news_sentiment, None);

    let mut config = fixture_config();
    config.news_sentiment = Some(1.0);
    let with = run_batch(&snapshot, &config).unwrap();
    assert_eq!(with.market.components.news_sentiment, Some(1.0));
    // Maximal news sentiment can only pull the composite up.
    assert!(with.market.msci >= without.market.msci);
}

#[test]
fn msci_history_drives_trend_and_risk() {
    let store = fixture_store();
    let snapshot = store.snapshot(day(89));

    let cold = run_batch(&snapshot, &fixture_config()).unwrap();
    assert_eq!(cold.msci_trend_5d, 0.0);

    let mut config = fixture_config();
    // Nine prior days well below the current value: the ten-day window fills
    // and the recent mean sits above the prior mean.
    config.msci_history = vec![cold.market.msci - 20.0; 9];
    let warm = run_batch(&snapshot, &config).unwrap();
    assert!(warm.msci_trend_5d > 0.0, "got {}", warm.msci_trend_5d);
}

#[test]
fn artifacts_round_trip_through_disk() {
    let store = fixture_store();
    let snapshot = store.snapshot(day(89));
    let config = fixture_config();
    let result = run_batch(&snapshot, &config).unwrap();
    let ranking = rank(&result.securities, &result.sectors, config.top_n, config.trend_floor);

    let out = tempfile::tempdir().unwrap();
    let dir = save_artifacts(out.path(), &result, &ranking).unwrap();
    assert!(dir.join("manifest.json").exists());
    assert!(dir.join("securities.csv").exists());

    let json = std::fs::read_to_string(dir.join("manifest.json")).unwrap();
    let artifact = import_json(&json).unwrap();
    assert_eq!(artifact.result, result);
    assert_eq!(artifact.ranking, ranking);
}
