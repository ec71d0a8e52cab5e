//! Feature-index rewriting tests.

use std::collections::HashMap;

use ensembles::{Aggregator, EnsembleModel, InferenceConfig, SubModel, TargetType, TreeModel};

fn names(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|n| n.to_string()).collect()
}

/// One split on the named feature: `value < threshold` -> left leaf.
fn stump(feature_names: &[&str], split_name: &str, threshold: f64, leaves: [f64; 2]) -> TreeModel {
    let split_index = feature_names
        .iter()
        .position(|n| *n == split_name)
        .expect("split feature must be declared") as u32;
    TreeModel::new(
        names(feature_names),
        vec![split_index, 0, 0],
        vec![threshold, 0.0, 0.0],
        vec![1, 0, 0],
        vec![2, 0, 0],
        vec![true, false, false],
        vec![false, true, true],
        vec![Vec::new(), vec![leaves[0]], vec![leaves[1]]],
        None,
    )
}

fn tree(model: &SubModel) -> &TreeModel {
    match model {
        SubModel::Tree(tree) => tree,
        SubModel::Ensemble(_) => panic!("expected a tree submodel"),
    }
}

#[test]
fn flat_rewrite_builds_dense_numbering() {
    // Trees reference exactly the declared names, first seen as b, a, c.
    let mut ensemble = EnsembleModel::new(
        names(&["a", "b", "c"]),
        vec![
            SubModel::Tree(stump(&["b", "a"], "b", 0.5, [1.0, 2.0])),
            SubModel::Tree(stump(&["a", "c"], "c", 0.25, [10.0, 20.0])),
        ],
        Aggregator::Average,
        TargetType::Regression,
    );

    ensemble.rewrite_feature_indices(&HashMap::new());

    // The referenced set, deduplicated in first-seen order, with dense
    // indices 0..n-1.
    assert_eq!(ensemble.feature_names(), names(&["b", "a", "c"]));
    for model in ensemble.models() {
        assert!(tree(model).feature_names().is_empty());
    }
    assert_eq!(tree(&ensemble.models()[0]).split_index(0), 0); // b
    assert_eq!(tree(&ensemble.models()[1]).split_index(0), 2); // c

    // Vector addressed by the compacted numbering [b, a, c].
    let results = ensemble
        .infer(&[0.9, 0.0, 0.1], &InferenceConfig::regression())
        .unwrap();
    // First stump: b=0.9 -> 2.0; second: c=0.1 -> 10.0; average 6.0.
    assert_eq!(results.as_regression().unwrap().value, 6.0);
}

#[test]
fn flat_rewrite_keeps_aligned_models_equivalent() {
    // Tree-local order already matches the ensemble declaration, so
    // inference before and after rewriting sees the same numbering.
    let build = || {
        EnsembleModel::new(
            names(&["a", "b"]),
            vec![
                SubModel::Tree(stump(&["a", "b"], "a", 0.5, [1.0, 2.0])),
                SubModel::Tree(stump(&["a", "b"], "b", 0.5, [3.0, 4.0])),
            ],
            Aggregator::Average,
            TargetType::Regression,
        )
    };
    let before = build();
    let mut after = build();
    after.rewrite_feature_indices(&HashMap::new());

    assert_eq!(after.feature_names(), before.feature_names());
    let config = InferenceConfig::regression();
    for features in [[0.2, 0.9], [0.8, 0.1], [f64::NAN, 0.6]] {
        assert_eq!(
            before.infer(&features, &config).unwrap(),
            after.infer(&features, &config).unwrap()
        );
    }
}

#[test]
fn nested_rewrite_propagates_to_leaves() {
    let inner = EnsembleModel::new(
        names(&["y", "x"]),
        vec![
            SubModel::Tree(stump(&["x", "y"], "x", 0.5, [1.0, 2.0])),
            SubModel::Tree(stump(&["y"], "y", 0.5, [5.0, 6.0])),
        ],
        Aggregator::Average,
        TargetType::Regression,
    );
    let mut outer = EnsembleModel::new(
        names(&["x", "y", "z"]),
        vec![
            SubModel::Tree(stump(&["y", "z"], "z", 0.5, [0.0, 1.0])),
            SubModel::Ensemble(Box::new(inner)),
        ],
        Aggregator::Average,
        TargetType::Regression,
    );

    outer.rewrite_feature_indices(&HashMap::new());

    // First-seen walk: outer stump declares [y, z], inner trees add x.
    assert_eq!(outer.feature_names(), names(&["y", "z", "x"]));

    let inner = match &outer.models()[1] {
        SubModel::Ensemble(ensemble) => ensemble,
        SubModel::Tree(_) => panic!("expected the nested ensemble"),
    };
    // The nested ensemble no longer owns naming.
    assert!(inner.feature_names().is_empty());

    // Every leaf's split index now equals the top-level index of its name.
    let top_index = |name: &str| {
        outer
            .feature_names()
            .iter()
            .position(|n| n == name)
            .unwrap() as u32
    };
    assert_eq!(tree(&outer.models()[0]).split_index(0), top_index("z"));
    assert_eq!(tree(&inner.models()[0]).split_index(0), top_index("x"));
    assert_eq!(tree(&inner.models()[1]).split_index(0), top_index("y"));

    // End to end on the compacted vector [y, z, x].
    let results = outer
        .infer(&[0.9, 0.1, 0.2], &InferenceConfig::regression())
        .unwrap();
    // Outer stump: z=0.1 -> 0.0. Inner: x=0.2 -> 1.0, y=0.9 -> 6.0,
    // averaging to 3.5. Outer average: (0.0 + 3.5) / 2.
    assert_eq!(results.as_regression().unwrap().value, 1.75);
}

#[test]
fn forwarded_mapping_overrides_local_numbering() {
    let mut ensemble = EnsembleModel::new(
        names(&["a"]),
        vec![SubModel::Tree(stump(&["a"], "a", 0.5, [1.0, 2.0]))],
        Aggregator::Average,
        TargetType::Regression,
    );

    // A parent-provided mapping places "a" at position 3.
    let mapping: HashMap<String, usize> = [("a".to_string(), 3)].into_iter().collect();
    ensemble.rewrite_feature_indices(&mapping);

    assert!(ensemble.feature_names().is_empty());
    assert_eq!(tree(&ensemble.models()[0]).split_index(0), 3);

    let results = ensemble
        .infer(&[0.0, 0.0, 0.0, 0.9], &InferenceConfig::regression())
        .unwrap();
    assert_eq!(results.as_regression().unwrap().value, 2.0);
}

#[test]
fn referenced_features_deduplicate_across_submodels() {
    let ensemble = EnsembleModel::new(
        names(&["a", "b", "c"]),
        vec![
            SubModel::Tree(stump(&["c", "a"], "c", 0.5, [0.0, 1.0])),
            SubModel::Tree(stump(&["a", "b"], "b", 0.5, [0.0, 1.0])),
        ],
        Aggregator::Average,
        TargetType::Regression,
    );

    let referenced = ensemble.referenced_features();
    let collected: Vec<_> = referenced.iter().cloned().collect();
    assert_eq!(collected, names(&["c", "a", "b"]));
}
