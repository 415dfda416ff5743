use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};

use vbdb::config::BuildConfig;
use vbdb::league::{EntityKind, League};
use vbdb::normalize::{KeyPolicy, LeagueRules};
use vbdb::pipeline::{SliceStatus, import_records, run_build, run_slices};
use vbdb::record::RawRecord;
use vbdb::registry::{LeagueSource, Registry};
use vbdb::store::Store;

fn lovb_teams() -> Result<Vec<RawRecord>> {
    Ok(vec![
        RawRecord::new()
            .with("name", "LOVB Atlanta")
            .with("slug", "atlanta-volleyball"),
        RawRecord::new()
            .with("name", "LOVB Austin")
            .with("slug", "austin-volleyball"),
    ])
}

fn lovb_players() -> Result<Vec<RawRecord>> {
    Ok(vec![
        RawRecord::new()
            .with("Name", "Kelsey Robinson Cook")
            .with("Player Number", "1")
            .with("team_id", "atlanta-volleyball"),
        RawRecord::new()
            .with("Name", "Ghost Player")
            .with("team_id", "unknown-team"),
    ])
}

fn lovb_results() -> Result<Vec<RawRecord>> {
    Ok(vec![
        RawRecord::new()
            .with("first_team", "LOVB Austin")
            .with("second_team", "LOVB Atlanta")
            .with("first_sets_won", "3")
            .with("second_sets_won", "1")
            .with("details_link", "https://www.lovb.com/matches/austin-at-atlanta-0110")
            .with(
                "iframe_src",
                "https://widgets.volleystation.com/play-by-play/9001?side=home",
            ),
    ])
}

fn pvf_teams() -> Result<Vec<RawRecord>> {
    Ok(vec![
        RawRecord::new()
            .with("name", "Omaha Supernovas")
            .with("slug", "omaha-supernovas")
            .with("permalink", "/teams/omaha-supernovas"),
    ])
}

fn pvf_players() -> Result<Vec<RawRecord>> {
    Ok(vec![
        RawRecord::new()
            .with("team_id", "omaha-supernovas")
            .with(
                "player",
                serde_json::json!({ "first_name": "Brooke", "last_name": "Nuneviller" }),
            ),
        RawRecord::new()
            .with("team_id", "omaha-supernovas")
            .with(
                "player",
                serde_json::json!({ "first_name": "Lindsey", "last_name": "Ruddins" }),
            ),
    ])
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vbdb-pipeline-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

#[test]
fn unknown_team_reference_is_dropped_not_fatal() {
    let mut store = Store::open_in_memory().unwrap();
    let rules = LeagueRules::for_league(League::Lovb);
    let teams = vec![
        RawRecord::new()
            .with("name", "LOVB Atlanta")
            .with("slug", "atlanta-volleyball"),
    ];
    import_records(&mut store, League::Lovb, &rules, EntityKind::Teams, &teams, KeyPolicy::Lenient)
        .unwrap();

    let players = lovb_players().unwrap();
    let counts = import_records(
        &mut store,
        League::Lovb,
        &rules,
        EntityKind::Players,
        &players,
        KeyPolicy::Lenient,
    )
    .unwrap();

    assert_eq!(counts.written, 1);
    assert_eq!(counts.dropped, 1);
    assert_eq!(store.count(League::Lovb, EntityKind::Players).unwrap(), 1);
    assert_eq!(
        store
            .player_ids_for_team(League::Lovb, "atlanta-volleyball")
            .unwrap(),
        vec!["kelsey-robinson-cook".to_string()]
    );
}

#[test]
fn players_without_any_known_team_write_nothing() {
    let mut store = Store::open_in_memory().unwrap();
    let rules = LeagueRules::for_league(League::Lovb);
    let players = lovb_players().unwrap();
    let counts = import_records(
        &mut store,
        League::Lovb,
        &rules,
        EntityKind::Players,
        &players,
        KeyPolicy::Lenient,
    )
    .unwrap();
    assert_eq!(counts.written, 0);
    assert_eq!(counts.dropped, 2);
    assert_eq!(store.count(League::Lovb, EntityKind::Players).unwrap(), 0);
}

#[test]
fn reimporting_teams_converges() {
    let mut store = Store::open_in_memory().unwrap();
    let rules = LeagueRules::for_league(League::Ncaaw);
    let teams = (1..=5)
        .map(|n| {
            RawRecord::new()
                .with("orgId", n)
                .with("nameOfficial", format!("School {n}"))
                .with("divisionRoman", "I")
        })
        .collect::<Vec<_>>();

    for _ in 0..2 {
        let counts = import_records(
            &mut store,
            League::Ncaaw,
            &rules,
            EntityKind::Teams,
            &teams,
            KeyPolicy::Lenient,
        )
        .unwrap();
        assert_eq!(counts.written, 5);
    }
    assert_eq!(store.count(League::Ncaaw, EntityKind::Teams).unwrap(), 5);
    assert_eq!(
        store
            .text_column(League::Ncaaw, EntityKind::Teams, "3", "name")
            .unwrap(),
        Some(Some("School 3".to_string()))
    );
}

#[test]
fn failing_slice_does_not_touch_other_leagues() {
    let mut registry = Registry::new();
    registry.register(
        LeagueSource::new(League::Lovb)
            .with(EntityKind::Teams, lovb_teams)
            .with(EntityKind::Players, lovb_players)
            .with(EntityKind::Results, || -> Result<Vec<RawRecord>> {
                Err(anyhow!("schedule page timed out"))
            }),
    );
    registry.register(
        LeagueSource::new(League::Pvf)
            .with(EntityKind::Teams, pvf_teams)
            .with(EntityKind::Players, pvf_players)
            .with(EntityKind::Results, || -> Result<Vec<RawRecord>> {
                Ok(Vec::new())
            }),
    );
    registry.register(LeagueSource::new(League::Ncaam));

    let mut store = Store::open_in_memory().unwrap();
    let reports = run_slices(
        &mut store,
        &registry,
        &[League::Lovb, League::Pvf, League::Ncaam],
        &EntityKind::ALL,
        KeyPolicy::Lenient,
    );
    assert_eq!(reports.len(), 9);

    let status = |league, kind| {
        reports
            .iter()
            .find(|r| r.league == league && r.kind == kind)
            .map(|r| (r.count(), r.status.clone()))
            .unwrap()
    };
    assert_eq!(status(League::Lovb, EntityKind::Teams), (2, SliceStatus::Imported));
    assert_eq!(status(League::Lovb, EntityKind::Players), (1, SliceStatus::Imported));
    let (count, failed) = status(League::Lovb, EntityKind::Results);
    assert_eq!(count, 0);
    match failed {
        SliceStatus::Failed(err) => assert!(err.contains("schedule page timed out"), "{err}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(status(League::Pvf, EntityKind::Teams), (1, SliceStatus::Imported));
    assert_eq!(status(League::Pvf, EntityKind::Players), (2, SliceStatus::Imported));
    assert_eq!(status(League::Pvf, EntityKind::Results), (0, SliceStatus::Imported));
    assert_eq!(
        store
            .player_ids_for_team(League::Pvf, "omaha-supernovas")
            .unwrap(),
        vec!["brooke-nuneviller".to_string(), "lindsey-ruddins".to_string()]
    );
    assert_eq!(status(League::Ncaam, EntityKind::Players), (0, SliceStatus::NoSource));
}

#[test]
fn teams_are_imported_before_players_whatever_the_order_asked() {
    let mut registry = Registry::new();
    registry.register(
        LeagueSource::new(League::Lovb)
            .with(EntityKind::Teams, lovb_teams)
            .with(EntityKind::Players, lovb_players),
    );
    let mut store = Store::open_in_memory().unwrap();
    let started = Instant::now();
    let reports = run_slices(
        &mut store,
        &registry,
        &[League::Lovb],
        &[EntityKind::Players, EntityKind::Teams],
        KeyPolicy::Lenient,
    );
    let wall = started.elapsed();
    assert!(reports.iter().map(|r| r.elapsed).sum::<Duration>() <= wall);
    assert_eq!(reports[0].kind, EntityKind::Teams);
    assert_eq!(reports[1].kind, EntityKind::Players);
    assert_eq!(reports[1].count(), 1);
}

#[test]
fn build_writes_file_summary_and_replicas() {
    let dir = scratch_dir("build");
    let mut cfg = BuildConfig::new(dir.join("vbdb.db"));
    cfg.leagues = vec![League::Lovb];
    cfg.replicas = vec![dir.join("mirror").join("vbdb.db")];

    let mut registry = Registry::new();
    registry.register(
        LeagueSource::new(League::Lovb)
            .with(EntityKind::Teams, lovb_teams)
            .with(EntityKind::Players, lovb_players)
            .with(EntityKind::Results, lovb_results),
    );

    let summary = run_build(&cfg, &registry).unwrap();
    assert_eq!(summary.count(League::Lovb, EntityKind::Teams), 2);
    assert_eq!(summary.count(League::Lovb, EntityKind::Players), 1);
    assert_eq!(summary.count(League::Lovb, EntityKind::Results), 1);
    assert_eq!(summary.grand_total(), 4);
    assert_eq!(summary.failures().count(), 0);
    assert_eq!(summary.replicas.len(), 1);
    assert!(summary.replicas[0].result.is_ok());

    let mirror = Store::open(&dir.join("mirror").join("vbdb.db")).unwrap();
    assert_eq!(mirror.count(League::Lovb, EntityKind::Teams).unwrap(), 2);
    assert_eq!(
        mirror
            .text_column(League::Lovb, EntityKind::Results, "9001", "home_team_id")
            .unwrap(),
        Some(Some("lovb-atlanta-volleyball".to_string()))
    );
    mirror.close().unwrap();
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unopenable_store_aborts_the_build() {
    let dir = scratch_dir("blocked");
    let blocker = dir.join("not-a-dir");
    fs::write(&blocker, b"file").unwrap();
    let cfg = BuildConfig::new(blocker.join("vbdb.db"));
    assert!(run_build(&cfg, &Registry::new()).is_err());
    let _ = fs::remove_dir_all(&dir);
}
