use std::collections::{BTreeMap, BTreeSet};

use super::*;
use crate::fixtures::{basic_selections, demo_catalog, expression, pose, transforms};

fn summary(layers: &[ResolvedLayer]) -> Vec<(String, u32, Option<Side>)> {
    layers
        .iter()
        .map(|l| (l.category.to_string(), l.layer_index, l.side))
        .collect()
}

#[test]
fn basic_character_layers_are_sorted_by_z() {
    let c = demo_catalog();
    let layers = resolve_layers(
        &c,
        &basic_selections(),
        &pose("standing"),
        &expression("neutral"),
        &BTreeMap::new(),
    );
    assert_eq!(
        summary(&layers),
        vec![
            ("body".to_owned(), 0, None),
            ("ears".to_owned(), 2, Some(Side::Left)),
            ("ears".to_owned(), 2, Some(Side::Right)),
            ("face".to_owned(), 3, None),
            ("eyes".to_owned(), 6, Some(Side::Left)),
            ("eyes".to_owned(), 6, Some(Side::Right)),
            ("mouth".to_owned(), 7, Some(Side::Left)),
            ("mouth".to_owned(), 7, Some(Side::Right)),
            ("nose".to_owned(), 8, None),
        ]
    );
    assert!(layers.iter().all(|l| l.transform().is_identity()));
    assert!(layers.iter().all(|l| l.flip_x == (l.side == Some(Side::Right))));
    assert_eq!(
        layers[0].image,
        ImageRef::path("/assets/parts/body/body-01-standing.svg")
    );
}

#[test]
fn happy_mouth_adds_fixed_color_extra_pair() {
    let c = demo_catalog();
    let layers = resolve_layers(
        &c,
        &basic_selections(),
        &pose("standing"),
        &expression("happy"),
        &BTreeMap::new(),
    );
    let mouth: Vec<_> = layers
        .iter()
        .filter(|l| l.category.as_str() == "mouth")
        .collect();
    assert_eq!(mouth.len(), 4);

    let (base, extra): (Vec<_>, Vec<_>) = mouth.into_iter().partition(|l| !l.is_extra);
    assert!(base.iter().all(|l| l.layer_index == 7 && l.fixed_color.is_none()));
    assert_eq!(extra.len(), 2);
    assert!(extra.iter().all(|l| l.layer_index == 10));
    assert!(
        extra
            .iter()
            .all(|l| l.fixed_color == Some(PartColor::new("#FF6B6B", "#231815")))
    );
    assert_eq!(extra[0].side, Some(Side::Left));
    assert_eq!(extra[1].side, Some(Side::Right));
    assert!(extra[1].flip_x);

    // The extra pair sorts after the nose.
    assert_eq!(layers.last().map(|l| l.is_extra), Some(true));
}

#[test]
fn symmetric_transform_is_mirrored_on_the_right() {
    let c = demo_catalog();
    let t = transforms(&[("ears", PartTransform::new(10.0, 5.0, 3.0))]);
    let layers = resolve_layers(
        &c,
        &basic_selections(),
        &pose("standing"),
        &expression("neutral"),
        &t,
    );
    let ears: Vec<_> = layers
        .iter()
        .filter(|l| l.category.as_str() == "ears")
        .collect();
    assert_eq!(ears[0].transform(), PartTransform::new(10.0, 5.0, 3.0));
    assert!(!ears[0].flip_x);
    assert_eq!(ears[1].transform(), PartTransform::new(-10.0, 5.0, -3.0));
    assert!(ears[1].flip_x);
}

#[test]
fn child_category_inherits_parent_transform_unless_it_has_its_own() {
    let c = demo_catalog();
    let mut sel = basic_selections();
    sel.remove(&CategoryId::from("ears"));
    sel.insert(CategoryId::from("ear2"), "01".to_owned());

    let inherited = transforms(&[("ears", PartTransform::new(4.0, 2.0, 1.0))]);
    let layers = resolve_layers(&c, &sel, &pose("standing"), &expression("neutral"), &inherited);
    let ear2 = layers
        .iter()
        .find(|l| l.category.as_str() == "ear2")
        .unwrap();
    assert_eq!(ear2.transform(), PartTransform::new(4.0, 2.0, 1.0));

    let own = transforms(&[
        ("ears", PartTransform::new(4.0, 2.0, 1.0)),
        ("ear2", PartTransform::new(-1.0, 0.0, 0.0)),
    ]);
    let layers = resolve_layers(&c, &sel, &pose("standing"), &expression("neutral"), &own);
    let ear2 = layers
        .iter()
        .find(|l| l.category.as_str() == "ear2")
        .unwrap();
    assert_eq!(ear2.transform(), PartTransform::new(-1.0, 0.0, 0.0));
}

#[test]
fn non_editable_single_layers_ignore_transforms() {
    let c = demo_catalog();
    let t = transforms(&[
        ("body", PartTransform::new(9.0, 9.0, 9.0)),
        ("nose", PartTransform::new(0.0, -4.0, 0.0)),
    ]);
    let layers = resolve_layers(
        &c,
        &basic_selections(),
        &pose("standing"),
        &expression("neutral"),
        &t,
    );
    let body = layers.iter().find(|l| l.category.as_str() == "body").unwrap();
    assert!(body.transform().is_identity());
    let nose = layers.iter().find(|l| l.category.as_str() == "nose").unwrap();
    assert_eq!(nose.transform(), PartTransform::new(0.0, -4.0, 0.0));
}

#[test]
fn unknown_parts_and_unselected_categories_are_skipped() {
    let c = demo_catalog();
    let mut sel = BTreeMap::new();
    sel.insert(CategoryId::from("body"), "99".to_owned());
    sel.insert(CategoryId::from("face"), "01".to_owned());
    let layers = resolve_layers(&c, &sel, &pose("standing"), &expression("neutral"), &BTreeMap::new());
    assert_eq!(summary(&layers), vec![("face".to_owned(), 3, None)]);
}

#[test]
fn expression_lock_keeps_neutral_art() {
    let c = demo_catalog();
    let sel = basic_selections();
    let p = pose("standing");
    let e = expression("happy");
    let none = BTreeMap::new();
    let locks: BTreeSet<CategoryId> = [CategoryId::from("mouth")].into_iter().collect();
    let input = CompositionInput {
        expression_locks: Some(&locks),
        ..CompositionInput::new(&sel, &p, &e, &none)
    };
    let layers = compose_layers(&c, &input);

    assert!(layers.iter().all(|l| !l.is_extra));
    let mouth = layers.iter().find(|l| l.category.as_str() == "mouth").unwrap();
    assert_eq!(mouth.image, ImageRef::path("/assets/parts/mouth/mouth-01-neutral.svg"));
    let eyes = layers.iter().find(|l| l.category.as_str() == "eyes").unwrap();
    assert_eq!(eyes.image, ImageRef::path("/assets/parts/eyes/eyes-01-happy.svg"));
}

#[test]
fn composition_is_deterministic() {
    let c = demo_catalog();
    let t = transforms(&[("eyes", PartTransform::new(1.0, 2.0, 3.0))]);
    let a = resolve_layers(&c, &basic_selections(), &pose("sitting"), &expression("happy"), &t);
    let b = resolve_layers(&c, &basic_selections(), &pose("sitting"), &expression("happy"), &t);
    assert_eq!(a, b);
    assert!(a.windows(2).all(|w| w[0].layer_index <= w[1].layer_index));
}

#[test]
fn canvas_affine_mirrors_right_layers_about_center_line() {
    use crate::foundation::core::{Canvas, Point};

    let c = demo_catalog();
    let t = transforms(&[("ears", PartTransform::new(10.0, 5.0, 0.0))]);
    let layers = resolve_layers(
        &c,
        &basic_selections(),
        &pose("standing"),
        &expression("neutral"),
        &t,
    );
    let canvas = Canvas::CANONICAL;
    let left = layers.iter().find(|l| l.side == Some(Side::Left)).unwrap();
    let right = layers.iter().find(|l| l.side == Some(Side::Right)).unwrap();

    let authored = Point::new(200.0, 100.0);
    let l = left.canvas_affine(canvas) * authored;
    let r = right.canvas_affine(canvas) * authored;
    assert!((l.x - 210.0).abs() < 1e-9 && (l.y - 105.0).abs() < 1e-9);
    // Mirror image of the left placement: 1080 - 210.
    assert!((r.x - 870.0).abs() < 1e-9 && (r.y - 105.0).abs() < 1e-9);
}

fn catalog_with_sad_effects() -> Catalog {
    let mut c = demo_catalog();
    c.expressions.push(crate::catalog::model::Expression {
        id: expression("sad"),
        name: "Sad".to_owned(),
    });
    let raw = r##"{
        "mouth": {
            "sad": {
                "mode": "overlay",
                "extra_layers": [
                    {"image": "/mouth-sad.svg", "layer_index": 11, "fixed_color": {"fill": "#FF6B6B", "stroke": "#231815"}}
                ]
            }
        },
        "eyes": {
            "sad": {"mode": "replace", "image": "/eyes-sad.svg"}
        }
    }"##;
    c.expression_effects = serde_json::from_str(raw).unwrap();
    c.validate().unwrap();
    c
}

fn compose_sad(c: &Catalog, locks: Option<&BTreeSet<CategoryId>>) -> Vec<ResolvedLayer> {
    let sel = basic_selections();
    let none = BTreeMap::new();
    let (p, e) = (pose("standing"), expression("sad"));
    let input = CompositionInput {
        expression_locks: locks,
        ..CompositionInput::new(&sel, &p, &e, &none)
    };
    compose_layers(c, &input)
}

#[test]
fn overlay_effect_adds_category_extras() {
    let c = catalog_with_sad_effects();
    let layers = compose_sad(&c, None);

    let overlays: Vec<&ResolvedLayer> = layers.iter().filter(|l| l.is_extra).collect();
    assert_eq!(overlays.len(), 2);
    for l in &overlays {
        assert_eq!(l.category.as_str(), "mouth");
        assert_eq!(l.layer_index, 11);
        assert_eq!(l.image, ImageRef::path("/mouth-sad.svg"));
        assert_eq!(l.fixed_color, Some(PartColor::new("#FF6B6B", "#231815")));
    }
    assert_eq!(overlays[0].side, Some(Side::Left));
    assert!(overlays[1].flip_x);

    // The mouth part itself falls back to its neutral art.
    let mouth = layers.iter().find(|l| l.category.as_str() == "mouth").unwrap();
    assert_eq!(
        mouth.image,
        ImageRef::path("/assets/parts/mouth/mouth-01-neutral.svg")
    );
}

#[test]
fn replace_effect_swaps_primary_image() {
    let c = catalog_with_sad_effects();
    let layers = compose_sad(&c, None);
    let eyes: Vec<&ResolvedLayer> = layers
        .iter()
        .filter(|l| l.category.as_str() == "eyes")
        .collect();
    assert_eq!(eyes.len(), 2);
    assert!(eyes.iter().all(|l| l.image == ImageRef::path("/eyes-sad.svg")));
    assert!(eyes.iter().all(|l| !l.is_extra));
}

#[test]
fn locked_categories_ignore_expression_effects() {
    let c = catalog_with_sad_effects();
    let locks: BTreeSet<CategoryId> = ["mouth", "eyes"].into_iter().map(CategoryId::from).collect();
    let layers = compose_sad(&c, Some(&locks));

    assert!(layers.iter().all(|l| !l.is_extra));
    let eyes = layers.iter().find(|l| l.category.as_str() == "eyes").unwrap();
    assert_eq!(
        eyes.image,
        ImageRef::path("/assets/parts/eyes/eyes-01-neutral.svg")
    );
}

#[test]
fn effects_for_other_expressions_do_nothing() {
    let c = catalog_with_sad_effects();
    let layers = resolve_layers(
        &c,
        &basic_selections(),
        &pose("standing"),
        &expression("neutral"),
        &BTreeMap::new(),
    );
    assert!(layers.iter().all(|l| !l.is_extra));
    assert!(layers.iter().all(|l| !l.image.label().contains("sad")));
}

#[test]
fn face_transform_moves_face2_but_not_the_face() {
    let mut sel = basic_selections();
    sel.insert(CategoryId::from("face2"), "01".to_owned());
    let layers = resolve_layers(
        &demo_catalog(),
        &sel,
        &pose("standing"),
        &expression("neutral"),
        &transforms(&[("face", PartTransform::new(4.0, 2.0, 1.0))]),
    );
    let face = layers.iter().find(|l| l.category.as_str() == "face").unwrap();
    assert!(face.transform().is_identity());

    let face2: Vec<&ResolvedLayer> = layers
        .iter()
        .filter(|l| l.category.as_str() == "face2")
        .collect();
    assert_eq!(face2[0].transform(), PartTransform::new(4.0, 2.0, 1.0));
    assert_eq!(face2[1].transform(), PartTransform::new(-4.0, 2.0, -1.0));
}
