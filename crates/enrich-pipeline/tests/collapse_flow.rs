//! Comment collapse through the pipeline context.

use assert_matches::assert_matches;
use enrich_core::{attrs, ContentTree, Display, FeatureConfig};
use enrich_pipeline::collapse::{PAGE_TOGGLE_ROLE, TOGGLE_ROLE};
use enrich_pipeline::{CollapseError, CollapsePhase, KeyChord, PageLoadReport, PipelineContext};
use enrich_testkit::{
    comment_page, comment_with_replies, node, page_markup, test_config, with_role,
    ScriptedPageSource,
};

fn control_for(tree: &dyn ContentTree, identity: &str) -> enrich_core::NodeId {
    with_role(tree, TOGGLE_ROLE)
        .into_iter()
        .find(|control| tree.get_attribute(*control, attrs::CONTROLS) == Some(identity))
        .unwrap_or_else(|| panic!("no toggle for {identity}"))
}

#[test]
fn toggle_flips_label_and_children() {
    let mut tree = comment_page(&[("t1_a", 3), ("t1_b", 0)], None);
    let mut context = PipelineContext::new(test_config());
    context.initialize(&mut tree);

    let a = node(&tree, "t1_a");
    let control = control_for(&tree, "t1_a");
    assert_eq!(with_role(&tree, TOGGLE_ROLE).len(), 1);
    assert_eq!(
        tree.get_attribute(control, attrs::LABEL),
        Some("[–] hide 3 children")
    );

    assert_eq!(
        context.toggle_comment(&mut tree, control).unwrap(),
        CollapsePhase::Collapsed
    );
    assert_eq!(
        tree.get_attribute(control, attrs::LABEL),
        Some("[+] show 3 children")
    );
    assert_eq!(tree.children_display(a), Display::None);
    assert!(tree.is_rendered(control));

    assert_eq!(
        context.toggle_comment(&mut tree, a).unwrap(),
        CollapsePhase::Expanded
    );
    assert_eq!(
        tree.get_attribute(control, attrs::LABEL),
        Some("[–] hide 3 children")
    );
    assert_eq!(context.collapse().label(a).as_deref(), Some("[–] hide 3 children"));
}

#[test]
fn childless_comment_has_no_control() {
    let mut tree = comment_page(&[("t1_b", 0)], None);
    let mut context = PipelineContext::new(test_config());
    context.initialize(&mut tree);

    let b = node(&tree, "t1_b");
    assert_matches!(
        context.toggle_comment(&mut tree, b),
        Err(CollapseError::NotCollapsible { .. })
    );
    assert!(with_role(&tree, TOGGLE_ROLE).is_empty());
}

#[test]
fn hide_by_default_collapses_on_initialize() {
    let mut tree = comment_page(&[("t1_a", 2), ("t1_b", 1)], None);
    let config = FeatureConfig {
        collapse_child_comments_default: true,
        ..test_config()
    };
    let mut context = PipelineContext::new(config);
    context.initialize(&mut tree);

    assert!(context.collapse().all_hidden());
    for id in ["t1_a", "t1_b"] {
        assert_eq!(
            context.collapse().phase(node(&tree, id)),
            Some(CollapsePhase::Collapsed)
        );
    }
    let page_toggle = with_role(&tree, PAGE_TOGGLE_ROLE);
    assert_eq!(page_toggle.len(), 1);
    assert_eq!(
        tree.get_attribute(page_toggle[0], attrs::LABEL),
        Some("show all child comments")
    );
}

#[tokio::test]
async fn paginated_comments_follow_page_wide_state() {
    let mut tree = comment_page(&[("t1_a", 2)], Some("p2"));
    let source = ScriptedPageSource::new().with_page(
        "p2",
        page_markup(vec![comment_with_replies("t1_c", 2)], None),
    );
    let mut context = PipelineContext::new(test_config());
    context.initialize(&mut tree);
    let mut updates = context.subscribe_collapse();

    assert_eq!(context.toggle_all(&mut tree, true).unwrap(), 1);
    assert!(updates.has_changed().unwrap());
    assert!(*updates.borrow_and_update());

    let report = context.load_next_page(&mut tree, &source).await.unwrap();
    assert_matches!(report, PageLoadReport::Merged { .. });
    let c = node(&tree, "t1_c");
    assert_eq!(context.collapse().phase(c), Some(CollapsePhase::Collapsed));
    assert_eq!(
        tree.get_attribute(control_for(&tree, "t1_c"), attrs::LABEL),
        Some("[+] show 2 children")
    );

    assert!(context.handle_key(&mut tree, KeyChord::shift('C')));
    assert!(!*updates.borrow_and_update());
    for id in ["t1_a", "t1_c"] {
        assert_eq!(
            context.collapse().phase(node(&tree, id)),
            Some(CollapsePhase::Expanded)
        );
    }
    let page_toggle = with_role(&tree, PAGE_TOGGLE_ROLE)[0];
    assert_eq!(
        tree.get_attribute(page_toggle, attrs::LABEL),
        Some("hide all child comments")
    );
}

#[test]
fn unmodified_key_is_not_consumed() {
    let mut tree = comment_page(&[("t1_a", 2)], None);
    let mut context = PipelineContext::new(test_config());
    context.initialize(&mut tree);

    assert!(!context.handle_key(&mut tree, KeyChord::plain('c')));
    assert!(!context.collapse().all_hidden());
}

#[test]
fn disabled_collapse_rejects_toggles() {
    let mut tree = comment_page(&[("t1_a", 2)], None);
    let config = test_config().with_flag("collapseChildComments", false);
    let mut context = PipelineContext::new(config);
    context.initialize(&mut tree);

    assert!(with_role(&tree, TOGGLE_ROLE).is_empty());
    assert_matches!(context.toggle_all(&mut tree, true), Err(CollapseError::Disabled));
    assert!(!context.handle_key(&mut tree, KeyChord::shift('C')));
}

#[test]
fn collapse_enabled_later_installs_controls() {
    let mut tree = comment_page(&[("t1_a", 2)], None);
    let mut context = PipelineContext::new(test_config().with_flag("collapseChildComments", false));
    context.initialize(&mut tree);
    assert!(with_role(&tree, PAGE_TOGGLE_ROLE).is_empty());

    context.apply_settings(&mut tree, test_config());

    assert_eq!(with_role(&tree, PAGE_TOGGLE_ROLE).len(), 1);
    let control = control_for(&tree, "t1_a");
    assert_eq!(
        tree.get_attribute(control, attrs::LABEL),
        Some("[–] hide 2 children")
    );
    assert_eq!(context.toggle_all(&mut tree, true).unwrap(), 1);

    context.apply_settings(&mut tree, test_config());
    assert_eq!(with_role(&tree, PAGE_TOGGLE_ROLE).len(), 1);
    assert_eq!(with_role(&tree, TOGGLE_ROLE).len(), 1);
}
