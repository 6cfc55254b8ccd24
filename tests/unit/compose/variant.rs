use std::collections::BTreeMap;

use super::*;
use crate::catalog::model::{Expression, Pose};

fn catalog() -> Catalog {
    let mut c = Catalog::standard();
    c.poses.push(Pose {
        id: PoseId::from("sitting"),
        name: "Sitting".to_owned(),
    });
    c.expressions.push(Expression {
        id: ExpressionId::from("happy"),
        name: "Happy".to_owned(),
    });
    c
}

fn part(varies_by_pose: bool, varies_by_expression: bool, keys: &[&str]) -> PartDefinition {
    let variants: BTreeMap<VariantKey, VariantEntry> = keys
        .iter()
        .map(|k| (k.parse().unwrap(), VariantEntry::Image(format!("{k}.svg"))))
        .collect();
    PartDefinition {
        varies_by_pose,
        varies_by_expression,
        variants,
        ..PartDefinition::simple("p", "unused.svg")
    }
}

fn key(catalog: &Catalog, part: &PartDefinition, pose: &str, expression: &str) -> Option<String> {
    resolve_variant_key(
        catalog,
        part,
        &PoseId::from(pose),
        &ExpressionId::from(expression),
    )
    .map(|k| k.to_string())
}

#[test]
fn exact_key_wins() {
    let c = catalog();
    let p = part(true, true, &["standing/neutral", "sitting/happy"]);
    assert_eq!(key(&c, &p, "sitting", "happy").as_deref(), Some("sitting/happy"));
}

#[test]
fn non_varying_axes_collapse_to_reserved_words() {
    let c = catalog();
    let p = part(false, true, &["any/neutral", "any/happy"]);
    assert_eq!(key(&c, &p, "sitting", "happy").as_deref(), Some("any/happy"));

    let q = part(true, false, &["standing/default", "sitting/default"]);
    assert_eq!(key(&c, &q, "sitting", "happy").as_deref(), Some("sitting/default"));
}

#[test]
fn falls_back_to_default_pose_then_neutral_expression() {
    let c = catalog();
    let p = part(true, true, &["standing/happy", "sitting/neutral", "standing/neutral"]);
    // Default pose with the same expression comes before the same pose with neutral.
    assert_eq!(key(&c, &p, "sitting", "happy").as_deref(), Some("standing/happy"));

    let q = part(true, true, &["sitting/neutral", "standing/neutral"]);
    assert_eq!(key(&c, &q, "sitting", "happy").as_deref(), Some("sitting/neutral"));

    let r = part(true, true, &["standing/neutral"]);
    assert_eq!(key(&c, &r, "sitting", "happy").as_deref(), Some("standing/neutral"));
}

#[test]
fn first_key_is_last_resort() {
    let c = catalog();
    let p = part(false, false, &["sitting/happy"]);
    assert_eq!(key(&c, &p, "standing", "neutral").as_deref(), Some("sitting/happy"));
}

#[test]
fn empty_variants_resolve_to_none() {
    let c = catalog();
    let p = part(true, true, &[]);
    assert_eq!(key(&c, &p, "standing", "neutral"), None);
}

#[test]
fn resolution_is_deterministic() {
    let c = catalog();
    let p = part(true, true, &["sitting/angry", "any/default", "standing/sad"]);
    let first = key(&c, &p, "lying", "surprised");
    for _ in 0..8 {
        assert_eq!(key(&c, &p, "lying", "surprised"), first);
    }
}
