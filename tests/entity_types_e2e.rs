use std::sync::Arc;

use persona::{
    evaluate, rerank_top_k, should_rerank, AnyHandler, Entity, EntityId, EntityType,
    FeatureReranker, HashingEmbedder, LabeledQuery, MatchKind, Resolver, RoleHandler,
    SearchRequest,
};

fn location_resolver() -> Resolver<AnyHandler> {
    Resolver::with_handler(
        AnyHandler::for_type(EntityType::Location),
        Arc::new(HashingEmbedder::default()),
    )
}

fn locations() -> Vec<Entity> {
    [
        ("nyc", "New York City, NY"),
        ("sf", "San Francisco, California"),
        ("pdx", "Portland, Oregon"),
        ("pwm", "Portland, Maine"),
    ]
    .into_iter()
    .map(|(k, d)| Entity::keyed(k, d).of_type(EntityType::Location))
    .collect()
}

#[test]
fn location_abbreviations_and_components() {
    let r = location_resolver();
    let index = r.build_index(locations()).unwrap();

    let hits = r.search_str(&index, "NYC", None).unwrap();
    assert_eq!(hits[0].entity_id, EntityId::from_key("nyc"));
    assert_eq!(hits[0].match_kind, MatchKind::Exact);

    let hits = r.search_str(&index, "SF", None).unwrap();
    assert_eq!(hits[0].entity_id, EntityId::from_key("sf"));

    // Ambiguous city name: both components match, catalog order decides.
    let hits = r.search_str(&index, "Portland", None).unwrap();
    let top: Vec<EntityId> = hits.iter().take(2).map(|h| h.entity_id).collect();
    assert_eq!(top, vec![EntityId::from_key("pdx"), EntityId::from_key("pwm")]);

    let hits = r.search_str(&index, "Portland, Maine", None).unwrap();
    assert_eq!(hits[0].entity_id, EntityId::from_key("pwm"));
    assert!((hits[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn location_typos_are_fuzzy() {
    let r = location_resolver();
    let index = r.build_index(locations()).unwrap();
    let hits = r.search_str(&index, "San Fransisco", None).unwrap();
    assert_eq!(hits[0].entity_id, EntityId::from_key("sf"));
    assert_eq!(hits[0].match_kind, MatchKind::Fuzzy);
}

#[test]
fn role_synonyms_and_abbreviations() {
    let r = Resolver::with_handler(RoleHandler::default(), Arc::new(HashingEmbedder::default()));
    let index = r
        .build_index(vec![
            Entity::keyed("sse", "Senior Software Engineer - Platform").of_type(EntityType::Role),
            Entity::keyed("pm", "Product Manager at Acme").of_type(EntityType::Role),
            Entity::keyed("da", "Data Analyst").of_type(EntityType::Role),
        ])
        .unwrap();

    let hits = r.search_str(&index, "senior software developer", None).unwrap();
    assert_eq!(hits[0].entity_id, EntityId::from_key("sse"));
    assert_eq!(hits[0].match_kind, MatchKind::Exact);

    let hits = r.search_str(&index, "PM", None).unwrap();
    assert_eq!(hits[0].entity_id, EntityId::from_key("pm"));

    let hits = r.search_str(&index, "data specialist", None).unwrap();
    assert_eq!(hits[0].entity_id, EntityId::from_key("da"));
}

#[test]
fn rerank_runs_over_engine_output() {
    let r = Resolver::new(Arc::new(HashingEmbedder::default()));
    let index = r
        .build_index(vec![
            Entity::new("Jane Doe - Engineer at Google"),
            Entity::new("Google Engineer - Search Infrastructure"),
            Entity::new("John Roe - Engineer at Google Cloud"),
            Entity::new("Alex Poe - Google Engineer"),
        ])
        .unwrap();

    let response = r
        .search(&index, &SearchRequest::builder().query("google engineer").threshold(0.1).build().unwrap())
        .unwrap();
    assert_eq!(response.hits.len(), 4);

    let reranked = rerank_top_k("google engineer", &response.hits, 3, &FeatureReranker);
    assert_eq!(reranked.len(), response.hits.len());
    for pair in reranked[..3].windows(2) {
        assert!(pair[0].final_score >= pair[1].final_score);
    }
    // The policy is a pure function of the hits and the outcome.
    let _ = should_rerank(&response.hits, response.resolution);
}

#[test]
fn evaluation_over_scenario_catalog() {
    let r = Resolver::new(Arc::new(HashingEmbedder::default()));
    let index = r
        .build_index(vec![
            Entity::keyed("1", "John Smith - Engineer"),
            Entity::keyed("2", "John Michael Smith - Professor"),
            Entity::keyed("3", "Jane Smith - PM"),
        ])
        .unwrap();
    let id = EntityId::from_key;

    let queries = vec![
        LabeledQuery::new("John Smith", vec![id("1"), id("2")]),
        LabeledQuery::new("J", vec![id("1"), id("2"), id("3")]),
        LabeledQuery::new("Jhon Smith", vec![id("1")]),
    ];
    let report = evaluate(&r, &index, &queries, None).unwrap();

    assert!((report.per_query[0].f1 - 1.0).abs() < 1e-9);
    assert!((report.per_query[1].f1 - 1.0).abs() < 1e-9);
    // Both Johns come back for the typo; only one was expected.
    assert!((report.per_query[2].precision - 0.5).abs() < 1e-9);
    assert!((report.per_query[2].recall - 1.0).abs() < 1e-9);
    assert_eq!(report.perfect_queries(), 2);
    assert!((report.micro_avg.recall - 1.0).abs() < 1e-9);
}
