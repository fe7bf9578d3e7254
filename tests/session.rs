use taxonomy_layout::config::{LayoutConfig, LayoutEngine, SolverConfig};
use taxonomy_layout::error::LayoutError;
use taxonomy_layout::layout::compute_layout;
use taxonomy_layout::model::{Level, TaxonomyNode};
use taxonomy_layout::session::{Completion, LayoutResult, LayoutSession, Refresh};

fn nodes() -> Vec<TaxonomyNode> {
    vec![
        TaxonomyNode::new("p", "Brand", Level::Pillar, None, 0),
        TaxonomyNode::new("t1", "Trust", Level::NarrativeTheme, Some("p"), 0),
        TaxonomyNode::new("t2", "Safety", Level::NarrativeTheme, Some("p"), 1),
    ]
}

/// Five full levels under each pillar, `fanout` children per node.
fn wide_taxonomy(pillars: usize, fanout: usize) -> Vec<TaxonomyNode> {
    let mut nodes = Vec::new();
    let mut frontier = Vec::new();
    for idx in 0..pillars {
        let id = format!("p{idx}");
        nodes.push(TaxonomyNode::new(&id, format!("Pillar {idx}"), Level::Pillar, None, idx as i64));
        frontier.push((id, Level::Pillar));
    }
    while let Some((parent, level)) = frontier.pop() {
        let Some(child_level) = level.child() else {
            continue;
        };
        for idx in 0..fanout {
            let id = format!("{parent}.{idx}");
            nodes.push(TaxonomyNode::new(
                &id,
                format!("{} {idx}", child_level.label()),
                child_level,
                Some(parent.as_str()),
                idx as i64,
            ));
            frontier.push((id, child_level));
        }
    }
    nodes
}

#[test]
fn selection_and_search_never_relayout() {
    let nodes = nodes();
    let mut session = LayoutSession::new(LayoutConfig::default());
    assert_eq!(session.sync(&nodes), Ok(Refresh::Relaid));
    assert_eq!(session.layout_runs(), 1);
    let before = session.shared_layout().expect("layout applied");

    session.select(Some("t1"));
    session.set_search_term("saf");
    assert_eq!(session.sync(&nodes), Ok(Refresh::Unchanged));
    assert_eq!(session.layout_runs(), 1);

    let after = session.shared_layout().expect("layout applied");
    assert!(std::sync::Arc::ptr_eq(&before, &after));

    let highlight = session.highlight(&nodes);
    assert_eq!(highlight.selected.as_deref(), Some("t1"));
    assert!(highlight.matches.contains("t2"));
    assert!(!highlight.matches.contains("p"));
}

#[test]
fn timestamp_only_changes_do_not_relayout() {
    let mut nodes = nodes();
    let mut session = LayoutSession::new(LayoutConfig::default());
    session.sync(&nodes).expect("layout");
    nodes[1].updated_at = chrono::Utc::now() + chrono::Duration::seconds(60);
    nodes[1].notes = Some("internal note".to_string());
    assert_eq!(session.sync(&nodes), Ok(Refresh::Unchanged));
    assert_eq!(session.layout_runs(), 1);
}

#[test]
fn structural_changes_relayout() {
    let mut nodes = nodes();
    let mut session = LayoutSession::new(LayoutConfig::default());
    session.sync(&nodes).expect("layout");

    nodes[1].name = "Trust & Integrity".to_string();
    assert_eq!(session.sync(&nodes), Ok(Refresh::Relaid));
    nodes[2].audiences.push("Media".to_string());
    assert_eq!(session.sync(&nodes), Ok(Refresh::Relaid));
    nodes.push(TaxonomyNode::new("s", "Recalls", Level::Subject, Some("t2"), 0));
    assert_eq!(session.sync(&nodes), Ok(Refresh::Relaid));
    assert_eq!(session.layout_runs(), 4);
    assert!(session.layout().expect("layout").position("s").is_some());
}

#[test]
fn auto_organize_always_runs() {
    let nodes = nodes();
    let mut session = LayoutSession::new(LayoutConfig::default());
    session.sync(&nodes).expect("layout");
    session.auto_organize(&nodes).expect("layout");
    session.auto_organize(&nodes).expect("layout");
    assert_eq!(session.layout_runs(), 3);
}

#[test]
fn new_config_invalidates_the_signature() {
    let nodes = nodes();
    let mut session = LayoutSession::new(LayoutConfig::default());
    session.sync(&nodes).expect("layout");
    session.set_config(LayoutConfig {
        min_tier_gap: 120.0,
        ..LayoutConfig::default()
    });
    assert!(session.needs_layout(&nodes));
    assert_eq!(session.sync(&nodes), Ok(Refresh::Relaid));
    assert_eq!(session.layout().expect("layout").nodes["t1"].y, 192.0);
}

#[tokio::test]
async fn async_job_applies_latest_result() {
    let nodes = nodes();
    let mut session = LayoutSession::new(LayoutConfig::default());
    let job = session.begin(&nodes).expect("first layout starts a job");
    assert!(session.begin(&nodes).is_none());

    let result = job.run().await;
    assert_eq!(session.complete(result), Completion::Applied { version: 1 });
    assert_eq!(session.applied_version(), 1);
    assert_eq!(session.layout_runs(), 1);
    assert!(session.layout().expect("layout").position("t2").is_some());
}

#[tokio::test]
async fn stale_results_are_discarded() {
    let mut nodes = nodes();
    let mut session = LayoutSession::new(LayoutConfig::default());
    let first = session.begin(&nodes).expect("job");
    nodes.push(TaxonomyNode::new("t3", "Service", Level::NarrativeTheme, Some("p"), 2));
    let second = session.begin(&nodes).expect("job");
    assert_eq!((first.version(), second.version()), (1, 2));

    let (first_result, second_result) = tokio::join!(first.run(), second.run());
    assert_eq!(
        session.complete(second_result),
        Completion::Applied { version: 2 }
    );
    assert_eq!(
        session.complete(first_result),
        Completion::Discarded {
            version: 1,
            latest: 2
        }
    );
    let layout = session.layout().expect("layout");
    assert!(layout.position("t3").is_some());
}

#[tokio::test]
async fn failed_job_keeps_the_last_good_layout() {
    let nodes = nodes();
    let mut session = LayoutSession::new(LayoutConfig::default());
    let job = session.begin(&nodes).expect("job");
    let applied = job.run().await;
    assert_eq!(session.complete(applied), Completion::Applied { version: 1 });
    let good = session.layout().cloned().expect("layout");

    let job = session.begin_forced(&nodes);
    let failure = LayoutResult {
        version: job.version(),
        outcome: Err(LayoutError::Timeout { timeout_ms: 5000 }),
    };
    assert_eq!(
        session.complete(failure),
        Completion::Failed(LayoutError::Timeout { timeout_ms: 5000 })
    );
    assert_eq!(session.layout(), Some(&good));
    assert_eq!(session.applied_version(), 1);
    assert!(session.last_error().is_some());
}

#[test]
fn completion_accepts_externally_computed_results() {
    let nodes = nodes();
    let config = LayoutConfig::default();
    let mut session = LayoutSession::new(config.clone());
    let job = session.begin_forced(&nodes);
    let outcome = compute_layout(&nodes, &config);
    let completion = session.complete(LayoutResult {
        version: job.version(),
        outcome,
    });
    assert_eq!(completion, Completion::Applied { version: 1 });
}

#[tokio::test]
async fn solver_timeout_keeps_the_last_good_layout() {
    let small = nodes();
    let mut session = LayoutSession::new(LayoutConfig::default());
    let job = session.begin(&small).expect("job");
    assert_eq!(session.complete(job.run().await), Completion::Applied { version: 1 });
    let good = session.shared_layout().expect("layout");

    session.set_config(LayoutConfig {
        engine: LayoutEngine::Layered,
        solver: SolverConfig { timeout_ms: 0 },
        ..LayoutConfig::default()
    });
    let large = wide_taxonomy(2, 4);
    let job = session.begin(&large).expect("new structure starts a job");
    let result = job.run().await;
    assert_eq!(
        session.complete(result),
        Completion::Failed(LayoutError::Timeout { timeout_ms: 0 })
    );
    let kept = session.shared_layout().expect("layout kept");
    assert!(std::sync::Arc::ptr_eq(&good, &kept));
    assert_eq!(session.applied_version(), 1);
    assert_eq!(
        session.last_error(),
        Some(&LayoutError::Timeout { timeout_ms: 0 })
    );
    assert!(session.begin(&large).is_none());
}
