mod commons;
use commons::*;

use mapper_tune::*;

/// Toy sweep: 20 rows, 3 columns, two resolutions and gains above 1
#[test]
fn tuning_01_toy_grid_is_finite() {
    let data = create_uniform_data(20, 3, 7);
    let tuning = CoverTuning::new(data, Box::new(Pca), vec![5, 10], vec![2.0, 3.0], 3, 42);

    let result = tuning.grid_search().unwrap();

    assert_eq!(result.matrix.dim(), (2, 2));
    assert!(result.matrix.iter().all(|v| v.is_finite() && *v >= 0.0));
    assert!(result.best().is_some());
}

#[test]
fn tuning_08_gains_above_one_give_empty_graphs() {
    let data = create_uniform_data(20, 3, 7);
    let builder = MapperBuilder::new(Box::new(Pca), 42);
    for gain in [2.0, 3.0] {
        let graph = builder.create_tda_graph(data.view(), gain, 5).unwrap();
        assert_eq!(graph.node_count(), 0);
    }
}

#[test]
fn tuning_02_sweep_is_reproducible() {
    let run = || {
        let data = create_blob_data(15, 3, 4, 1);
        CoverTuning::new(data, Box::new(Pca), vec![3, 6], vec![0.2, 0.4], 4, 5)
            .with_aggregation(Aggregation::AllPairs)
            .grid_search()
            .unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.matrix, b.matrix);
}

#[test]
fn tuning_03_shape_follows_ranges() {
    let data = create_blob_data(10, 2, 3, 3);
    let result = CoverTuning::new(
        data,
        Box::new(RandomProjection),
        vec![2, 4, 6],
        vec![0.25],
        2,
        11,
    )
    .grid_search()
    .unwrap();

    assert_eq!(result.matrix.dim(), (3, 1));
    assert_eq!(result.res_range, vec![2, 4, 6]);
}

#[test]
fn tuning_04_both_aggregations_stay_in_canberra_range() {
    let data = create_blob_data(12, 3, 3, 21);
    let base = || CoverTuning::new(data.clone(), Box::new(Pca), vec![4], vec![0.3], 4, 8);

    let first = base().grid_search().unwrap().matrix[[0, 0]];
    let all = base()
        .with_aggregation(Aggregation::AllPairs)
        .grid_search()
        .unwrap()
        .matrix[[0, 0]];

    // both are means of non-negative Canberra distances over 35 coordinates
    for score in [first, all] {
        assert!(score.is_finite());
        assert!((0.0..=35.0).contains(&score));
    }
}

#[test]
fn tuning_05_single_bootstrap_fails_the_sweep() {
    let data = create_uniform_data(20, 3, 2);
    let err = CoverTuning::new(data, Box::new(Pca), vec![3], vec![0.3], 1, 0)
        .grid_search()
        .unwrap_err();
    assert!(matches!(err, TuneError::TooFewGraphs(1)));
}

#[test]
fn tuning_06_invalid_cover_aborts() {
    let data = create_uniform_data(20, 3, 2);
    let err = CoverTuning::new(data, Box::new(Pca), vec![0], vec![0.3], 3, 0)
        .grid_search()
        .unwrap_err();
    assert!(matches!(err, TuneError::InvalidParameter(_)));
}

#[test]
fn tuning_07_from_config_uses_settings() {
    let data = create_blob_data(10, 3, 3, 4);
    let config = TuningConfig {
        res_range: vec![3],
        gain_range: vec![0.3, 0.5],
        n_bootstrap: 3,
        seed: 99,
        show_progress: false,
        ..Default::default()
    };
    let tuning = CoverTuning::from_config(data, &config).unwrap();
    let indices = tuning.bootstrap_indices().unwrap();
    assert_eq!(indices.len(), 3);
    assert!(indices.iter().all(|rows| rows.len() == 21));

    let result = tuning.grid_search().unwrap();
    assert_eq!(result.matrix.dim(), (1, 2));
}

#[test]
fn properties_01_table_is_five_by_seven() {
    let data = create_blob_data(20, 3, 3, 13);
    let table = GraphProperties::new(data, Box::new(Pca), 5, 0.3, 42)
        .graph_properties_stats()
        .unwrap();

    assert_eq!(table.shape(), (5, 7));
    assert_eq!(
        table.rows,
        vec!["mean", "median", "std", "skewness", "kurtosis"]
    );
    assert_eq!(table.columns[0], "node degree");
    for stat in ["mean", "median", "std"] {
        for feature in &table.columns {
            assert!(table.get(stat, feature).unwrap().is_finite());
        }
    }

    // degrees are non-negative, so is their mean
    assert!(table.get("mean", "node degree").unwrap() >= 0.0);
}

#[test]
fn properties_02_tiny_graph_keeps_shape() {
    // so few rows that the graph is nearly empty
    let data = create_uniform_data(4, 2, 5);
    let table = GraphProperties::new(data, Box::new(Pca), 10, 0.1, 0)
        .graph_properties_stats()
        .unwrap();
    assert_eq!(table.shape(), (5, 7));
}

#[test]
fn properties_03_empty_graph_has_undefined_statistics() {
    let data = create_uniform_data(20, 3, 5);
    let table = GraphProperties::new(data, Box::new(Pca), 5, 2.0, 0)
        .graph_properties_stats()
        .unwrap();
    assert!(table.values.iter().flatten().all(|v| v.is_nan()));
}
