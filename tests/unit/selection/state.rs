use super::*;
use crate::fixtures::{basic_selections, demo_catalog};

fn complete_state() -> SelectionState {
    SelectionState {
        selections: basic_selections(),
        ..SelectionState::new(&demo_catalog())
    }
}

#[test]
fn new_state_uses_catalog_defaults() {
    let c = demo_catalog();
    let s = SelectionState::new(&c);
    assert_eq!(s.pose.as_str(), "standing");
    assert_eq!(s.expression.as_str(), "neutral");
    assert_eq!(s.direction, Direction::Front);
    assert!(s.selections.is_empty());
    s.validate(&c).unwrap();
}

#[test]
fn select_part_clears_exclusive_siblings() {
    let c = demo_catalog();
    let s = complete_state();
    let s2 = s.select_part(&c, "ear2", "01").unwrap();
    assert!(!s2.selections.contains_key("ears"));
    assert_eq!(s2.selections.get("ear2").map(String::as_str), Some("01"));
    // Input state is untouched.
    assert!(s.selections.contains_key("ears"));

    let s3 = s2.select_part(&c, "ears", "01").unwrap();
    assert!(!s3.selections.contains_key("ear2"));

    assert!(s.select_part(&c, "ears", "99").is_err());
    assert!(s.select_part(&c, "tail", "01").is_err());
}

#[test]
fn completeness_accounts_for_exclusive_groups() {
    let c = demo_catalog();
    let s = complete_state();
    assert!(s.is_complete(&c));

    let swapped = s.select_part(&c, "ear2", "01").unwrap();
    assert!(swapped.is_complete(&c));

    let missing = s.clear_part("nose").clear_part("ears");
    assert_eq!(
        missing.missing_required(&c),
        vec![CategoryId::from("ears"), CategoryId::from("nose")]
    );
    assert!(!missing.is_complete(&c));
    assert!(!SelectionState::new(&c).is_complete(&c));
}

#[test]
fn transforms_are_clamped() {
    let s = SelectionState::default().set_transform("ears", PartTransform::new(35.0, -2.0, -40.0));
    assert_eq!(
        s.transforms.get("ears").copied(),
        Some(PartTransform::new(20.0, -2.0, -10.0))
    );
    assert!(s.reset_transform("ears").transforms.is_empty());
}

#[test]
fn colors_are_validated_and_applied() {
    let c = demo_catalog();
    let s = SelectionState::new(&c);
    assert!(s.set_part_color("face", PartColor::new("nope", "#000")).is_err());

    let pink = PartColor::new("#ffb6c1", "#231815");
    let all = s.apply_color_to_all(&c, pink.clone()).unwrap();
    for category in &c.colors.colorable {
        assert_eq!(all.part_colors.get(category), Some(&pink));
    }
    assert!(!all.part_colors.contains_key("eyes"));
    assert!(!all.reset_part_color("face").part_colors.contains_key("face"));
}

#[test]
fn pose_expression_and_actions() {
    let c = demo_catalog();
    let s = SelectionState::new(&c);
    assert_eq!(s.set_pose(&c, "sitting").unwrap().pose.as_str(), "sitting");
    assert!(s.set_pose(&c, "flying").is_err());
    assert!(s.set_expression(&c, "furious").is_err());

    let cheer = s.apply_action(&c, "cheer").unwrap();
    assert_eq!(cheer.pose.as_str(), "standing");
    assert_eq!(cheer.expression.as_str(), "happy");
    assert!(s.apply_action(&c, "dance").is_err());
}

#[test]
fn expression_lock_toggles_and_affects_layers() {
    let c = demo_catalog();
    let s = complete_state().set_expression(&c, "happy").unwrap();
    assert_eq!(s.layers(&c).iter().filter(|l| l.is_extra).count(), 2);

    let locked = s.toggle_expression_lock("mouth");
    assert!(locked.expression_locks.contains("mouth"));
    assert_eq!(locked.layers(&c).iter().filter(|l| l.is_extra).count(), 0);

    assert!(locked.toggle_expression_lock("mouth").expression_locks.is_empty());
}

#[test]
fn face_offset_flows_into_layers() {
    let c = demo_catalog();
    let s = complete_state().set_face_offset(3.0, f64::NAN);
    assert_eq!(s.face_offset, Vec2::new(3.0, 0.0));
    let nose = s
        .layers(&c)
        .into_iter()
        .find(|l| l.category.as_str() == "nose")
        .unwrap();
    assert_eq!(nose.offset_x, 3.0);
}

#[test]
fn randomize_is_seeded_and_respects_groups() {
    let c = demo_catalog();
    let base = SelectionState::new(&c);
    let a = base.randomize(&c, 42);
    let b = base.randomize(&c, 42);
    assert_eq!(a, b);
    assert!(a.is_complete(&c));
    assert!(a.selections.contains_key("ears") ^ a.selections.contains_key("ear2"));
    a.validate(&c).unwrap();

    let distinct: BTreeSet<_> = (0..32)
        .map(|seed| base.randomize(&c, seed).selections)
        .collect();
    assert!(distinct.len() > 1);
}

#[test]
fn reset_returns_to_empty() {
    let c = demo_catalog();
    let s = complete_state()
        .set_direction(Direction::Back)
        .toggle_expression_lock("eyes");
    assert_eq!(s.reset(&c), SelectionState::new(&c));
}

#[test]
fn state_json_roundtrip_and_file_load_clamps() {
    let c = demo_catalog();
    let s = complete_state()
        .set_transform("ears", PartTransform::new(1.0, 2.0, 3.0))
        .set_part_color("face", PartColor::new("#fff8e7", "#231815"))
        .unwrap();
    let json = serde_json::to_string(&s).unwrap();
    let back: SelectionState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(
        &path,
        r#"{"selections":{"body":"01"},"transforms":{"eyes":{"x":99,"rotate":-99}}}"#,
    )
    .unwrap();
    let loaded = SelectionState::from_path(&path).unwrap();
    assert_eq!(
        loaded.transforms.get("eyes").copied(),
        Some(PartTransform::new(20.0, 0.0, -10.0))
    );
    loaded.validate(&c).unwrap();

    let bad = SelectionState {
        pose: PoseId::from("flying"),
        ..SelectionState::new(&c)
    };
    assert!(bad.validate(&c).is_err());
}
