//! Safety guard and thread expansion through the pipeline context.

use assert_matches::assert_matches;
use enrich_core::{attrs, ContentTree, FeatureConfig, MemoryTree, NodeSpec, Selector};
use enrich_pipeline::modules::DEPTH_ATTR;
use enrich_pipeline::{ExpansionError, PipelineContext, ViolationKind, MORE_COMMENTS_ROLE};
use enrich_testkit::{
    feed, init_test_tracing, node, page_markup, post, test_config, HideEverythingModule,
    ScriptedPageSource,
};

fn rendered_items(tree: &dyn ContentTree) -> usize {
    tree.query_region(tree.root(), &Selector::TopLevelItem)
        .into_iter()
        .filter(|item| tree.is_rendered(*item))
        .count()
}

#[tokio::test(start_paused = true)]
async fn buggy_filter_is_undone_once_after_settling() {
    init_test_tracing();
    let mut tree = feed(10, None);
    let mut context = PipelineContext::new(test_config());
    context.register_module(Box::new(HideEverythingModule));
    context.initialize(&mut tree);
    assert_eq!(rendered_items(&tree), 0);

    let violation = context.settle_and_guard(&mut tree).await.unwrap();
    assert_eq!(violation.kind, ViolationKind::AllItemsHidden);
    assert_eq!(violation.total, 10);
    assert_eq!(violation.restored, 10);
    assert_eq!(rendered_items(&tree), 10);
    assert!(tree.get_attribute(node(&tree, "t3_0"), attrs::HIDDEN_MARKER).is_none());

    assert!(context.run_safety_guard(&mut tree).is_none());
    assert!(context.safety().has_run());
}

#[test]
fn ad_blocker_hiding_most_posts_is_withdrawn() {
    let listing = NodeSpec::listing().with_children((0..10).map(|i| {
        let promoted = if i < 9 { "true" } else { "false" };
        post(&format!("t3_{i}")).with_attr(attrs::PROMOTED, promoted)
    }));
    let mut tree = MemoryTree::from_spec(listing).unwrap();
    let config = FeatureConfig {
        ad_blocker: true,
        ..test_config()
    };
    let mut context = PipelineContext::with_builtin_modules(config);
    context.initialize(&mut tree);
    assert_eq!(rendered_items(&tree), 1);

    let violation = context.run_safety_guard(&mut tree).unwrap();
    assert_eq!(violation.kind, ViolationKind::StylesheetSuppression);
    assert_eq!(violation.rule_owners, vec!["adBlock".to_string()]);
    assert_eq!(violation.rules_removed, 1);
    assert_eq!(rendered_items(&tree), 10);
}

#[test]
fn healthy_page_passes_the_guard() {
    let mut tree = feed(6, None);
    let mut context = PipelineContext::with_builtin_modules(test_config());
    context.initialize(&mut tree);

    assert!(context.run_safety_guard(&mut tree).is_none());
    assert_eq!(rendered_items(&tree), 6);
}

fn thread_page() -> MemoryTree {
    MemoryTree::from_spec(NodeSpec::listing().with_child(
        NodeSpec::comment("t1_a").with_children([
            NodeSpec::comment("t1_a1"),
            NodeSpec::marker(MORE_COMMENTS_ROLE, "continue this thread")
                .with_attr(attrs::HREF, "/comments/abc/_/a1"),
        ]),
    ))
    .unwrap()
}

fn marker(tree: &dyn ContentTree) -> enrich_core::NodeId {
    tree.query_region(tree.root(), &Selector::attr_eq(attrs::ROLE, MORE_COMMENTS_ROLE))[0]
}

#[tokio::test]
async fn expanded_thread_is_dispatched() {
    let mut tree = thread_page();
    let source = ScriptedPageSource::new().with_page(
        "/comments/abc/_/a1",
        page_markup(
            vec![NodeSpec::comment("t1_a2").with_child(NodeSpec::comment("t1_a2x"))],
            None,
        ),
    );
    let mut context = PipelineContext::with_builtin_modules(test_config());
    context.initialize(&mut tree);
    let anchor = marker(&tree);

    let report = context.expand_thread(&mut tree, anchor, &source).await.unwrap();
    assert_eq!(report.thread.inserted, 2);
    assert_eq!(report.dispatch.failures.len(), 0);
    assert!(tree.get_attribute(node(&tree, "t1_a2x"), DEPTH_ATTR).is_some());
    assert!(!tree.is_rendered(anchor));

    assert_matches!(
        context.expand_thread(&mut tree, anchor, &source).await,
        Err(ExpansionError::AlreadyExpanded { .. })
    );
    assert_eq!(source.request_count(), 1);
}

#[tokio::test]
async fn expansion_disabled_makes_no_request() {
    let mut tree = thread_page();
    let source = ScriptedPageSource::new();
    let config = FeatureConfig {
        expand_continue_thread: false,
        ..test_config()
    };
    let mut context = PipelineContext::new(config);
    context.initialize(&mut tree);
    let anchor = marker(&tree);

    assert_matches!(
        context.expand_thread(&mut tree, anchor, &source).await,
        Err(ExpansionError::Disabled)
    );
    assert_eq!(source.request_count(), 0);
}

#[test]
fn applied_settings_reach_modules() {
    let mut tree = feed(4, None);
    let mut context = PipelineContext::with_builtin_modules(test_config());
    context.initialize(&mut tree);

    let mut config = test_config();
    config.filters.keywords.push("t3_1".to_string());
    context.apply_settings(&mut tree, config);
    let extra = page_markup(vec![post("t3_9"), post("t3_1x")], None);
    let items = enrich_core::parse_page(&extra).unwrap().items;
    let listing = enrich_testkit::listing_of(&tree);
    let last = *tree.children(listing).last().unwrap();
    let summary = enrich_pipeline::pagination::merge_items(&mut tree, last, items).unwrap();
    context.dispatch(&mut tree, &enrich_pipeline::Region::Items(summary.roots));

    assert!(tree.is_rendered(node(&tree, "t3_9")));
    assert!(!tree.is_rendered(node(&tree, "t3_1x")));
    assert!(tree.is_rendered(node(&tree, "t3_1")));
}
