use isotrack::core::catalog::{Catalog, CatalogSource, Control};
use isotrack::core::status::ControlStatus;
use isotrack::core::store::{PersistedState, StatusStore, StoreOptions};
use isotrack::plugins::controls::Tracker;
use isotrack::plugins::report::{NEVER_UPDATED, generate_report};
use std::sync::Arc;
use tempfile::tempdir;

fn control(id: &str, title: &str, domain: &str) -> Control {
    Control {
        id: id.to_string(),
        title: title.to_string(),
        domain: domain.to_string(),
        description: "".to_string(),
        recommendation: "".to_string(),
        implementation: vec![],
        guidance: "".to_string(),
    }
}

fn xyz_catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::new(
            "test",
            vec![
                control("X.1", "Policies", "Org"),
                control("Y.1", "Roles", "Org"),
                control("Z.1", "Malware", "Tech"),
            ],
        )
        .unwrap(),
    )
}

fn tracker_in(dir: &std::path::Path, catalog: Arc<Catalog>) -> Tracker {
    Tracker::new(StatusStore::open(
        &dir.join("state.json"),
        catalog,
        StoreOptions::default(),
    ))
}

#[test]
fn test_three_control_scenario() {
    let tmp = tempdir().unwrap();
    let tracker = tracker_in(tmp.path(), xyz_catalog());
    tracker.set_status("X.1", ControlStatus::Implemented).unwrap();
    tracker.set_status("Y.1", ControlStatus::InProgress).unwrap();

    let report = tracker.generate_report().unwrap();
    assert_eq!(report.total_controls, 3);
    assert_eq!(report.count(ControlStatus::Implemented), 1);
    assert_eq!(report.count(ControlStatus::InProgress), 1);
    assert_eq!(report.count(ControlStatus::NotStarted), 1);
    assert_eq!(report.count(ControlStatus::NotApplicable), 0);
    assert_eq!(format!("{:.1}", report.percentage(ControlStatus::Implemented)), "33.3");
    assert_eq!(format!("{:.1}", report.percentage(ControlStatus::NotApplicable)), "0.0");

    let attention: Vec<_> = report
        .attention
        .iter()
        .map(|a| (a.id.as_str(), a.title.as_str(), a.status))
        .collect();
    assert_eq!(
        attention,
        vec![
            ("Y.1", "Roles", ControlStatus::InProgress),
            ("Z.1", "Malware", ControlStatus::NotStarted),
        ]
    );

    colored::control::set_override(false);
    let text = report.render_text();
    assert!(text.contains("Implemented: 1 (33.3%)"));
    assert!(text.contains("In Progress: 1 (33.3%)"));
    assert!(text.contains("Not Started: 1 (33.3%)"));
    assert!(text.contains("Not Applicable: 0 (0.0%)"));
    let y = text.find(" - Y.1: Roles (IN_PROGRESS)").unwrap();
    let z = text.find(" - Z.1: Malware (NOT_STARTED)").unwrap();
    assert!(y < z);
}

#[test]
fn test_counts_always_sum_to_total() {
    let tmp = tempdir().unwrap();
    let catalog = Arc::new(CatalogSource::Embedded.load().unwrap());
    let tracker = tracker_in(tmp.path(), catalog.clone());

    let ids: Vec<String> = catalog.controls().map(|c| c.id.clone()).collect();
    for (i, id) in ids.iter().enumerate().step_by(3) {
        let status = ControlStatus::ALL[i % ControlStatus::ALL.len()];
        tracker.set_status(id, status).unwrap();
        if i % 2 == 0 {
            tracker.set_note(id, "reviewed").unwrap();
        }
        let report = tracker.generate_report().unwrap();
        let sum: usize = report.tallies.iter().map(|t| t.count).sum();
        assert_eq!(sum, report.total_controls);
        assert_eq!(report.total_controls, 93);
    }
}

#[test]
fn test_report_is_idempotent() {
    let tmp = tempdir().unwrap();
    let tracker = tracker_in(tmp.path(), xyz_catalog());
    tracker.set_status("Z.1", ControlStatus::NotApplicable).unwrap();

    let first = tracker.generate_report().unwrap();
    let second = tracker.generate_report().unwrap();
    assert_eq!(first, second);

    tracker.set_status("X.1", ControlStatus::Implemented).unwrap();
    let third = tracker.generate_report().unwrap();
    assert_ne!(first.count(ControlStatus::Implemented), third.count(ControlStatus::Implemented));
}

#[test]
fn test_attention_follows_catalog_order_not_alphabetical() {
    let catalog = Catalog::new(
        "test",
        vec![
            control("B.2", "second", "Org"),
            control("A.10", "tenth", "Org"),
            control("A.2", "two", "Org"),
        ],
    )
    .unwrap();
    let report = generate_report(&catalog, &PersistedState::default());
    let ids: Vec<_> = report.attention.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["B.2", "A.10", "A.2"]);
}

#[test]
fn test_report_on_fresh_directory_has_no_side_effects() {
    let tmp = tempdir().unwrap();
    let tracker = tracker_in(tmp.path(), xyz_catalog());

    let report = tracker.generate_report().unwrap();
    assert_eq!(report.last_updated, NEVER_UPDATED);
    assert_eq!(report.count(ControlStatus::NotStarted), 3);
    assert!(!tmp.path().join("state.json").exists());
    assert_eq!(tracker.generate_report().unwrap(), report);
}

#[test]
fn test_last_updated_sentinel() {
    let report = generate_report(&xyz_catalog(), &PersistedState::default());
    assert_eq!(report.last_updated, NEVER_UPDATED);

    let state = PersistedState::fresh();
    let report = generate_report(&xyz_catalog(), &state);
    assert_eq!(Some(report.last_updated), state.last_updated);
}

#[test]
fn test_state_outside_catalog_is_ignored() {
    let mut state = PersistedState::default();
    state
        .controls_status
        .insert("GONE.1".to_string(), ControlStatus::Implemented);
    state
        .controls_status
        .insert("X.1".to_string(), ControlStatus::Implemented);

    let report = generate_report(&xyz_catalog(), &state);
    assert_eq!(report.count(ControlStatus::Implemented), 1);
    assert_eq!(report.count(ControlStatus::NotStarted), 2);
}

#[test]
fn test_domain_breakdown() {
    let mut state = PersistedState::default();
    state
        .controls_status
        .insert("X.1".to_string(), ControlStatus::Implemented);
    state
        .controls_status
        .insert("Z.1".to_string(), ControlStatus::NotApplicable);

    let report = generate_report(&xyz_catalog(), &state);
    assert_eq!(report.domains.len(), 2);
    assert_eq!(report.domains[0].domain, "Org");
    assert_eq!(report.domains[0].total, 2);
    assert_eq!(report.domains[0].implemented, 1);
    assert_eq!(report.domains[0].not_started, 1);
    assert_eq!(report.domains[1].domain, "Tech");
    assert_eq!(report.domains[1].not_applicable, 1);
}

#[test]
fn test_tracker_listing_and_details() {
    let tmp = tempdir().unwrap();
    let tracker = tracker_in(tmp.path(), xyz_catalog());
    tracker.set_status("y.1", ControlStatus::InProgress).unwrap();
    tracker.set_note(" y.1 ", "owner: HR").unwrap();

    let all = tracker.list_all().unwrap();
    let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["X.1", "Y.1", "Z.1"]);

    let org = tracker.list_by_domain("org").unwrap();
    assert_eq!(org.len(), 2);
    assert_eq!(org[1].status, ControlStatus::InProgress);
    assert_eq!(org[1].note.as_deref(), Some("owner: HR"));
    assert!(tracker.list_by_domain("Physical").unwrap().is_empty());

    let details = tracker.get_details("Y.1").unwrap();
    assert_eq!(details.control.title, "Roles");
    assert_eq!(details.status, ControlStatus::InProgress);
    assert!(tracker.get_details("W.1").is_err());
}
