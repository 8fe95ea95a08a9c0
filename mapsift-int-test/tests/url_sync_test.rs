use mapsift::common::Value;
use mapsift::engine::FilterEngine;
use mapsift::filter::{
    compile, encode, load_filter_param, Clause, FilterParamOutcome, FilterState,
};
use mapsift_int_test::test_util::{date, ids, survey_collection};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn membership(values: &[&str]) -> Clause {
    Clause::membership(values.iter().map(|v| Value::from(*v))).unwrap()
}

#[test]
fn test_missing_param_means_no_filter() {
    assert_eq!(load_filter_param(None), FilterParamOutcome::Absent);
}

#[test]
fn test_shared_link_restores_the_filter() {
    // one session builds a filter and shares it as a URL parameter
    let sender = FilterEngine::new(survey_collection()).unwrap();
    sender
        .apply_clause("happening", Some(membership(&["mining"])))
        .unwrap();
    sender
        .apply_clause(
            "reported_at",
            Some(Clause::range(date(2020, 1, 1), date(2020, 4, 1)).unwrap()),
        )
        .unwrap();
    let param = encode(&compile(&sender.applied()));

    // another session loads the parameter and applies it
    let receiver = FilterEngine::new(survey_collection()).unwrap();
    match load_filter_param(Some(&param)) {
        FilterParamOutcome::Loaded(decompiled) => {
            assert!(!decompiled.is_partial());
            receiver.set_state(decompiled.state).unwrap();
        }
        other => panic!("expected a loaded filter, got {:?}", other),
    }

    assert_eq!(
        ids(receiver.visible().visible()),
        ids(sender.visible().visible())
    );
    assert_eq!(receiver.applied(), sender.applied());
}

#[test]
fn test_hand_edited_param_is_rejected_without_crashing() {
    for garbage in ["%5Bnope", "....", "%7B%22f%22%3A1%7D"] {
        assert_eq!(
            load_filter_param(Some(garbage)),
            FilterParamOutcome::Invalid,
            "expected {} to be rejected",
            garbage
        );
    }
}

#[test]
fn test_partially_foreign_param_keeps_the_understood_subset() {
    // a filter written by a newer client with an operator we do not know
    let param = encode(
        &mapsift::filter::Expression::from_json(serde_json::json!([
            "all",
            ["in", "happening", "mining"],
            ["within", "area", [0, 0, 1, 1]]
        ]))
        .unwrap(),
    );
    match load_filter_param(Some(&param)) {
        FilterParamOutcome::Loaded(decompiled) => {
            assert!(decompiled.is_partial());
            assert_eq!(decompiled.state.len(), 1);
            assert!(decompiled.state.get_clause("happening").is_some());
        }
        other => panic!("expected a partial load, got {:?}", other),
    }
}

#[test]
fn test_loaded_state_survives_a_full_round_trip() {
    let mut state = FilterState::new();
    state.set_clause("severity", Some(membership(&["high", "medium"])));
    state.set_clause("depth", Some(Clause::range(2.0, 11.0).unwrap()));
    let param = encode(&compile(&state));

    match load_filter_param(Some(&param)) {
        FilterParamOutcome::Loaded(decompiled) => {
            assert_eq!(decompiled.state, state);
            // re-encoding the loaded state yields an equivalent parameter
            let reencoded = encode(&compile(&decompiled.state));
            match load_filter_param(Some(&reencoded)) {
                FilterParamOutcome::Loaded(again) => assert_eq!(again.state, state),
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_merge_fields_appends_constrained_only_fields() {
    let mut state = FilterState::new();
    state.set_clause("severity", Some(membership(&["high"])));
    state.set_clause("crew", Some(membership(&["alpha"])));

    let display = vec!["happening".to_string(), "severity".to_string()];
    let merged = state.merge_fields(&display);
    // display order first, then fields only the filter mentions
    assert_eq!(merged, vec!["happening", "severity", "crew"]);
}
