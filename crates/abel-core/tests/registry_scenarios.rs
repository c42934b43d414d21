use std::collections::{HashMap, HashSet};

use abel_core::ledger::AssetOracle;
use abel_core::{AssetId, LabelDescriptor, LabelId, LabelingError, Principal, Registry};

struct KnownAssets(HashSet<u64>);

impl KnownAssets {
    fn range(ids: std::ops::RangeInclusive<u64>) -> Self {
        Self(ids.collect())
    }
}

impl AssetOracle for KnownAssets {
    fn asset_exists(&self, asset: AssetId) -> bool {
        self.0.contains(&asset.0)
    }
}

fn principal(name: &str) -> Principal {
    Principal::parse(name).expect("test principal must be non-empty")
}

fn label(id: &str) -> LabelId {
    LabelId::parse(id).expect("test label id must be valid")
}

/// Counters must equal the relation counts after every operation.
fn assert_counters_consistent(registry: &Registry) {
    let snapshot = registry.snapshot();
    let mut operators: HashMap<LabelId, u64> = HashMap::new();
    for entry in &snapshot.operators {
        for id in &entry.labels {
            *operators.entry(id.clone()).or_default() += 1;
        }
    }
    let mut assets: HashMap<LabelId, u64> = HashMap::new();
    for entry in &snapshot.assets {
        for id in &entry.labels {
            *assets.entry(id.clone()).or_default() += 1;
        }
    }

    for (id, descriptor) in registry.list_labels() {
        assert_eq!(
            descriptor.num_operators,
            operators.get(id).copied().unwrap_or(0),
            "operator counter of {id}"
        );
        assert_eq!(
            descriptor.num_assets,
            assets.get(id).copied().unwrap_or(0),
            "asset counter of {id}"
        );
    }
}

// ==============================================================================
// Scenarios
// ==============================================================================

#[test]
fn admin_adds_label_and_reads_descriptor() {
    let admin = principal("ADMIN");
    let mut registry = Registry::new(admin.clone());
    registry
        .add_label(&admin, "wo", "world".into(), "http://".into())
        .expect("admin adds label");

    assert_eq!(
        registry.get_label("wo").expect("label exists"),
        &LabelDescriptor {
            name: "world".into(),
            url: "http://".into(),
            num_assets: 0,
            num_operators: 0,
        }
    );
}

#[test]
fn operator_batch_labels_six_assets() {
    let admin = principal("ADMIN");
    let operator = principal("OPERATOR");
    let oracle = KnownAssets::range(13..=18);
    let mut registry = Registry::new(admin.clone());
    registry
        .add_label(&admin, "wo", "world".into(), "http://".into())
        .expect("add label");
    registry
        .add_operator_to_label(&admin, operator.clone(), "wo")
        .expect("add operator");

    assert_eq!(registry.get_operator_labels(&operator), &[label("wo")]);
    assert_eq!(registry.get_label("wo").expect("present").num_operators, 1);

    let batch: Vec<AssetId> = (13..=18).map(AssetId).collect();
    registry
        .add_label_to_assets(&operator, &oracle, &batch, "wo")
        .expect("batch succeeds");

    assert_eq!(registry.get_label("wo").expect("present").num_assets, 6);
    for asset in batch {
        assert_eq!(registry.get_asset_labels(asset), &[label("wo")]);
        assert!(registry.has_asset_label(asset, "wo").expect("valid id"));
    }
    assert_counters_consistent(&registry);

    assert!(matches!(
        registry.remove_label(&admin, "wo"),
        Err(LabelingError::NotEmpty { .. })
    ));
}

#[test]
fn removing_operator_label_keeps_remaining_order() {
    let admin = principal("ADMIN");
    let mut registry = Registry::new(admin.clone());
    for id in ["wo", "w2"] {
        registry
            .add_label(&admin, id, "world".into(), "http://".into())
            .expect("add label");
        registry
            .add_operator_to_label(&admin, admin.clone(), id)
            .expect("add self as operator");
    }
    assert_eq!(
        registry.get_operator_labels(&admin),
        &[label("wo"), label("w2")]
    );

    registry
        .remove_operator_from_label(&admin, &admin, "w2")
        .expect("remove operator");
    assert_eq!(registry.get_operator_labels(&admin), &[label("wo")]);
    assert_counters_consistent(&registry);
}

#[test]
fn reverse_removal_order_leaves_first_label() {
    let admin = principal("ADMIN");
    let mut registry = Registry::new(admin.clone());
    for id in ["wo", "w2", "w3"] {
        registry
            .add_label(&admin, id, "world".into(), "http://".into())
            .expect("add label");
        registry
            .add_operator_to_label(&admin, admin.clone(), id)
            .expect("add operator");
    }

    registry
        .remove_operator_from_label(&admin, &admin, "w2")
        .expect("remove middle");
    assert_eq!(
        registry.get_operator_labels(&admin),
        &[label("wo"), label("w3")]
    );
    registry
        .remove_operator_from_label(&admin, &admin, "wo")
        .expect("remove first");
    assert_eq!(registry.get_operator_labels(&admin), &[label("w3")]);
    assert_counters_consistent(&registry);
}

#[test]
fn asset_unknown_to_ledger_is_not_found_for_valid_operator() {
    let admin = principal("ADMIN");
    let operator = principal("OPERATOR");
    let oracle = KnownAssets::range(1..=10);
    let mut registry = Registry::new(admin.clone());
    registry
        .add_label(&admin, "wo", "world".into(), "http://".into())
        .expect("add label");
    registry
        .add_operator_to_label(&admin, operator.clone(), "wo")
        .expect("add operator");

    assert!(matches!(
        registry.add_label_to_asset(&operator, &oracle, AssetId(404), "wo"),
        Err(LabelingError::NotFound(_))
    ));
    assert!(registry.get_asset_labels(AssetId(404)).is_empty());
    assert_eq!(registry.get_label("wo").expect("present").num_assets, 0);
}

#[test]
fn has_accessors_report_zero_instead_of_not_found() {
    let admin = principal("ADMIN");
    let operator = principal("OPERATOR");
    let oracle = KnownAssets::range(13..=13);
    let mut registry = Registry::new(admin.clone());
    registry
        .add_label(&admin, "wo", "world".into(), "http://".into())
        .expect("add label");
    registry
        .add_operator_to_label(&admin, operator.clone(), "wo")
        .expect("add operator");
    registry
        .add_label_to_asset(&operator, &oracle, AssetId(13), "wo")
        .expect("label asset");

    assert!(registry.has_operator_label(&operator, "wo").expect("valid"));
    assert!(!registry.has_operator_label(&operator, "zz").expect("valid"));
    assert!(!registry.has_operator_label(&admin, "wo").expect("valid"));
    assert!(!registry.has_asset_label(AssetId(13), "ii").expect("valid"));
    assert!(!registry.has_asset_label(AssetId(14), "wo").expect("valid"));
    assert!(matches!(
        registry.get_label("zz"),
        Err(LabelingError::NotFound(_))
    ));
}

// ==============================================================================
// Properties
// ==============================================================================

#[test]
fn second_add_of_same_label_fails_already_exists() {
    let admin = principal("ADMIN");
    let mut registry = Registry::new(admin.clone());
    registry
        .add_label(&admin, "wo", "world".into(), "http://".into())
        .expect("first add");
    assert!(matches!(
        registry.add_label(&admin, "wo", "other".into(), "other".into()),
        Err(LabelingError::AlreadyExists(_))
    ));
    assert_eq!(registry.list_labels().count(), 1);
    assert_eq!(registry.get_label("wo").expect("present").name, "world");
}

#[test]
fn add_remove_cycles_keep_counters_consistent() {
    let admin = principal("ADMIN");
    let ops = [principal("OP1"), principal("OP2"), principal("OP3")];
    let oracle = KnownAssets::range(1..=20);
    let mut registry = Registry::new(admin.clone());
    for id in ["aa", "bb"] {
        registry
            .add_label(&admin, id, "n".into(), "u".into())
            .expect("add label");
    }

    for (i, op) in ops.iter().enumerate() {
        let id = if i % 2 == 0 { "aa" } else { "bb" };
        registry
            .add_operator_to_label(&admin, op.clone(), id)
            .expect("add operator");
        let assets: Vec<AssetId> = (1..=5).map(|n| AssetId(n + 5 * i as u64)).collect();
        registry
            .add_label_to_assets(op, &oracle, &assets, id)
            .expect("label batch");
        assert_counters_consistent(&registry);
    }

    registry
        .remove_label_from_asset(&ops[0], AssetId(3), "aa")
        .expect("detach");
    registry
        .remove_operator_from_label(&ops[1], &ops[1], "bb")
        .expect("self removal");
    assert_counters_consistent(&registry);

    let aa = registry.get_label("aa").expect("present");
    assert_eq!(aa.num_operators, 2);
    assert_eq!(aa.num_assets, 9);
    let bb = registry.get_label("bb").expect("present");
    assert_eq!(bb.num_operators, 0);
    assert_eq!(bb.num_assets, 5);
}

#[test]
fn unauthorized_callers_change_nothing() {
    type Op = Box<dyn Fn(&mut Registry, &Principal) -> Result<(), LabelingError>>;

    let admin = principal("ADMIN");
    let operator = principal("OPERATOR");
    let stranger = principal("STRANGER");

    let mut base = Registry::new(admin.clone());
    base.add_label(&admin, "wo", "world".into(), "http://".into())
        .expect("add label");
    base.add_operator_to_label(&admin, operator.clone(), "wo")
        .expect("add operator");
    base.add_label_to_asset(&operator, &KnownAssets::range(13..=14), AssetId(13), "wo")
        .expect("label asset");

    let operations: Vec<(&str, Op, Vec<&Principal>)> = vec![
        (
            "change_admin",
            Box::new(|r: &mut Registry, c: &Principal| r.change_admin(c, principal("STRANGER"))),
            vec![&admin],
        ),
        (
            "add_label",
            Box::new(|r: &mut Registry, c: &Principal| r.add_label(c, "w2", "n".into(), "u".into()).map(drop)),
            vec![&admin],
        ),
        (
            "change_label",
            Box::new(|r: &mut Registry, c: &Principal| r.change_label(c, "wo", "n".into(), "u".into())),
            vec![&admin],
        ),
        (
            "remove_label",
            Box::new(|r: &mut Registry, c: &Principal| r.remove_label(c, "wo")),
            vec![&admin],
        ),
        (
            "add_operator_to_label",
            Box::new(|r: &mut Registry, c: &Principal| r.add_operator_to_label(c, principal("NEWCOMER"), "wo")),
            vec![&admin, &operator],
        ),
        (
            "remove_operator_from_label",
            Box::new(|r: &mut Registry, c: &Principal| r.remove_operator_from_label(c, &principal("OPERATOR"), "wo")),
            vec![&admin, &operator],
        ),
        (
            "add_label_to_asset",
            Box::new(|r: &mut Registry, c: &Principal| {
                r.add_label_to_asset(c, &KnownAssets::range(13..=14), AssetId(14), "wo")
            }),
            vec![&operator],
        ),
        (
            "remove_label_from_asset",
            Box::new(|r: &mut Registry, c: &Principal| r.remove_label_from_asset(c, AssetId(13), "wo")),
            vec![&operator],
        ),
    ];

    for (name, op, allowed) in &operations {
        for caller in [&admin, &operator, &stranger] {
            if allowed.contains(&caller) {
                continue;
            }
            let mut registry = base.clone();
            let result = op(&mut registry, caller);
            assert!(
                matches!(result, Err(LabelingError::Unauthorized { .. })),
                "{name} by {caller} must be unauthorized, got {result:?}"
            );
            assert_eq!(
                registry.snapshot(),
                base.snapshot(),
                "{name} by {caller} must not change state"
            );
        }
    }
}

#[test]
fn wrong_length_label_id_is_rejected_by_every_operation() {
    type Op = Box<dyn Fn(&mut Registry, &Principal, &str) -> Result<(), LabelingError>>;

    let admin = principal("ADMIN");
    let operator = principal("OPERATOR");
    let stranger = principal("STRANGER");
    let oracle = KnownAssets::range(13..=14);

    let mut base = Registry::new(admin.clone());
    base.add_label(&admin, "wo", "world".into(), "http://".into())
        .expect("add label");
    base.add_operator_to_label(&admin, operator.clone(), "wo")
        .expect("add operator");
    base.add_label_to_asset(&operator, &oracle, AssetId(13), "wo")
        .expect("label asset");

    let operations: Vec<(&str, Op)> = vec![
        (
            "get_label",
            Box::new(|r: &mut Registry, _: &Principal, id: &str| r.get_label(id).map(drop)),
        ),
        (
            "has_label",
            Box::new(|r: &mut Registry, _: &Principal, id: &str| r.has_label(id).map(drop)),
        ),
        (
            "add_label",
            Box::new(|r: &mut Registry, c: &Principal, id: &str| {
                r.add_label(c, id, "n".into(), "u".into()).map(drop)
            }),
        ),
        (
            "change_label",
            Box::new(|r: &mut Registry, c: &Principal, id: &str| {
                r.change_label(c, id, "n".into(), "u".into())
            }),
        ),
        (
            "remove_label",
            Box::new(|r: &mut Registry, c: &Principal, id: &str| r.remove_label(c, id)),
        ),
        (
            "add_operator_to_label",
            Box::new(|r: &mut Registry, c: &Principal, id: &str| {
                r.add_operator_to_label(c, principal("NEWCOMER"), id)
            }),
        ),
        (
            "remove_operator_from_label",
            Box::new(|r: &mut Registry, c: &Principal, id: &str| {
                r.remove_operator_from_label(c, &principal("OPERATOR"), id)
            }),
        ),
        (
            "has_operator_label",
            Box::new(|r: &mut Registry, c: &Principal, id: &str| {
                r.has_operator_label(c, id).map(drop)
            }),
        ),
        (
            "add_label_to_asset",
            Box::new(|r: &mut Registry, c: &Principal, id: &str| {
                r.add_label_to_asset(c, &KnownAssets::range(13..=14), AssetId(14), id)
            }),
        ),
        (
            "add_label_to_assets",
            Box::new(|r: &mut Registry, c: &Principal, id: &str| {
                r.add_label_to_assets(c, &KnownAssets::range(13..=14), &[AssetId(14)], id)
            }),
        ),
        (
            "remove_label_from_asset",
            Box::new(|r: &mut Registry, c: &Principal, id: &str| {
                r.remove_label_from_asset(c, AssetId(13), id)
            }),
        ),
        (
            "has_asset_label",
            Box::new(|r: &mut Registry, _: &Principal, id: &str| {
                r.has_asset_label(AssetId(13), id).map(drop)
            }),
        ),
    ];

    for (name, op) in &operations {
        for caller in [&admin, &operator, &stranger] {
            for id in ["w", "woo", ""] {
                let mut registry = base.clone();
                let result = op(&mut registry, caller, id);
                assert!(
                    matches!(
                        &result,
                        Err(LabelingError::InvalidIdentifierLength { expected: 2, actual, .. })
                            if *actual == id.len()
                    ),
                    "{name}({id:?}) by {caller} must fail on length, got {result:?}"
                );
                assert_eq!(
                    registry.snapshot(),
                    base.snapshot(),
                    "{name}({id:?}) by {caller} must not change state"
                );
            }
        }
    }
}

#[test]
fn remove_unknown_label_fails_not_found() {
    let admin = principal("ADMIN");
    let mut registry = Registry::new(admin.clone());
    registry
        .add_label(&admin, "wo", "world".into(), "http://".into())
        .expect("add label");

    assert!(matches!(
        registry.remove_label(&admin, "zz"),
        Err(LabelingError::NotFound(_))
    ));
    assert_eq!(registry.list_labels().count(), 1);
}

#[test]
fn removed_label_is_gone_and_can_be_recreated() {
    let admin = principal("ADMIN");
    let mut registry = Registry::new(admin.clone());
    registry
        .add_label(&admin, "wo", "world".into(), "http://".into())
        .expect("add label");

    registry.remove_label(&admin, "wo").expect("empty label is removable");

    assert!(!registry.has_label("wo").expect("valid id"));
    assert!(matches!(
        registry.get_label("wo"),
        Err(LabelingError::NotFound(_))
    ));
    assert_eq!(registry.list_labels().count(), 0);
    assert!(matches!(
        registry.remove_label(&admin, "wo"),
        Err(LabelingError::NotFound(_))
    ));

    registry
        .add_label(&admin, "wo", "again".into(), "https://".into())
        .expect("id is free again");
    assert_eq!(registry.get_label("wo").expect("present").name, "again");
}
