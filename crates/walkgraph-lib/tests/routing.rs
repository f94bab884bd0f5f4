use walkgraph_lib::{
    Error, Location, NetworkConfig, ResolverConfig, Walk, WalkNetwork,
};

fn far(i: u32) -> Location {
    Location::new(f64::from(i) * 2000.0, 0.0)
}

fn fine_grained() -> WalkNetwork {
    WalkNetwork::with_config(NetworkConfig {
        resolver: ResolverConfig::new(1.0, 1.0).expect("valid config"),
        ..NetworkConfig::default()
    })
}

#[test]
fn shortest_path_prefers_the_cheaper_detour() {
    let network = WalkNetwork::new();
    network
        .record_walk(&Walk::new(vec![far(0), far(1)], vec![10]))
        .unwrap();
    network
        .record_walk(&Walk::new(vec![far(1), far(2)], vec![20]))
        .unwrap();
    network
        .record_walk(&Walk::new(vec![far(0), far(2)], vec![50]))
        .unwrap();

    assert_eq!(network.shortest_path(far(0), far(2)).unwrap(), 30);
}

#[test]
fn short_walk_with_fine_resolver() {
    let network = fine_grained();
    let summary = network
        .record_walk(&Walk::new(
            vec![
                Location::new(0.0, 0.0),
                Location::new(3.0, 0.0),
                Location::new(3.0, 4.0),
            ],
            vec![5, 5],
        ))
        .unwrap();

    assert_eq!(summary.new_edges, 2);
    assert_eq!(network.stats().edges, 2);
    assert_eq!(
        network
            .shortest_path(Location::new(0.0, 0.0), Location::new(3.0, 4.0))
            .unwrap(),
        10
    );
}

#[test]
fn short_walk_collapses_with_default_radius() {
    let network = WalkNetwork::new();
    network
        .record_walk(&Walk::new(
            vec![
                Location::new(0.0, 0.0),
                Location::new(3.0, 0.0),
                Location::new(3.0, 4.0),
            ],
            vec![5, 5],
        ))
        .unwrap();

    let stats = network.stats();
    assert_eq!(stats.nodes, 1);
    assert_eq!(stats.edges, 1);
    assert_eq!(
        network
            .shortest_path(Location::new(0.0, 0.0), Location::new(3.0, 4.0))
            .unwrap(),
        0
    );
}

#[test]
fn no_edge_between_known_places_is_not_found() {
    let network = WalkNetwork::new();
    network
        .record_walk(&Walk::new(vec![far(0), far(1)], vec![1]))
        .unwrap();
    network
        .record_walk(&Walk::new(vec![far(2), far(3)], vec![1]))
        .unwrap();

    let error = network.shortest_path(far(0), far(3)).unwrap_err();
    assert!(matches!(error, Error::PathNotFound { .. }));
    assert_eq!(error.kind(), walkgraph_lib::ErrorKind::NotFound);

    // Edges are one-way.
    assert!(matches!(
        network.shortest_path(far(1), far(0)),
        Err(Error::PathNotFound { .. })
    ));
}

#[test]
fn unknown_places_are_reported() {
    let network = WalkNetwork::new();
    assert!(matches!(
        network.shortest_path(far(0), far(1)),
        Err(Error::UnknownLocation { location }) if location == far(0)
    ));
    assert!(matches!(
        network.total_cost(far(5)),
        Err(Error::UnknownLocation { .. })
    ));
}

#[test]
fn total_cost_sums_shortest_distances() {
    let network = WalkNetwork::new();
    network
        .record_walk(&Walk::new(vec![far(0), far(1), far(2), far(3)], vec![4, 6, 10]))
        .unwrap();
    network
        .record_walk(&Walk::new(vec![far(0), far(2)], vec![7]))
        .unwrap();

    // far(1)=4, far(2)=7, far(3)=17
    assert_eq!(network.total_cost(far(0)).unwrap(), 28);
    assert_eq!(network.total_cost(far(3)).unwrap(), 0);
}

#[test]
fn averaged_cost_changes_the_route() {
    let network = WalkNetwork::new();
    network
        .record_walk(&Walk::new(vec![far(0), far(2)], vec![10]))
        .unwrap();
    network
        .record_walk(&Walk::new(vec![far(0), far(1), far(2)], vec![6, 6]))
        .unwrap();
    assert_eq!(network.shortest_path(far(0), far(2)).unwrap(), 10);

    // The direct leg's average rises to (10 + 30) / 2 = 20.
    network
        .record_walk(&Walk::new(vec![far(0), far(2)], vec![30]))
        .unwrap();
    assert_eq!(network.shortest_path(far(0), far(2)).unwrap(), 12);
}
