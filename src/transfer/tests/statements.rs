use super::{accept_if, equivalent, has_community, if_else, run, run_statements, same_integer};
use crate::error::AnalysisError;
use crate::policy::{LongExpr, NextHopExpr, PolicyConfig, RoutingPolicy, Statement};
use crate::route::{LOCAL_PREF_WIDTH, MED_WIDTH, NextHopKind, OriginType};
use crate::symbolic::{SymbolicDomain, SymbolicInteger};
use crate::test_utils::{init_logger, test_catalogue};
use crate::transfer::TransferBdd;

#[test]
fn exit_accept_accepts_every_input() {
    init_logger();
    let (_, result) = run_statements(vec![Statement::ExitAccept]);
    assert!(result.return_value.accept.is_true());
    assert!(result.exit_assigned.is_true());
    assert!(result.return_assigned.is_false());
    assert!(result.fallthrough.is_false());
}

#[test]
fn empty_policy_takes_the_default_reject() {
    init_logger();
    let (_, result) = run_statements(vec![]);
    assert!(result.return_value.accept.is_false());
    // Finalization counts the default action as an exit.
    assert!(result.exit_assigned.is_true());
}

#[test]
fn set_default_action_applies_when_nothing_fires() {
    init_logger();
    let (_, result) = run_statements(vec![Statement::SetDefaultActionAccept]);
    assert!(result.return_value.accept.is_true());
}

#[test]
fn fallthrough_raises_both_signals() {
    init_logger();
    let (_, result) = run_statements(vec![Statement::Fallthrough]);
    assert!(result.fallthrough.is_true());
    assert!(result.return_assigned.is_true());
    assert!(result.return_value.accept.is_false());
}

#[test]
fn guard_partitions_the_input_space() {
    init_logger();
    let (route, result) = run_statements(accept_if(has_community(1, 1)));
    assert!(equivalent(&result.return_value.accept, &route.community_aps[0]));
    assert!(result.exit_assigned.or(&result.return_assigned).is_true());
}

#[test]
fn local_pref_update_is_gated_on_the_guard() {
    init_logger();
    let (route, result) = run_statements(vec![if_else(
        has_community(1, 1),
        vec![
            Statement::SetLocalPreference(LongExpr::Literal(200)),
            Statement::ExitAccept,
        ],
        vec![Statement::ExitReject],
    )]);
    let guard = &route.community_aps[0];
    let expected =
        SymbolicInteger::constant(route.variable_set(), LOCAL_PREF_WIDTH, 200)
            .ite(guard, &route.local_pref);
    assert!(same_integer(&result.return_value.route.local_pref, &expected));
    // Attributes the policy never writes survive unchanged.
    assert!(same_integer(&result.return_value.route.med, &route.med));
}

#[test]
fn metric_increment_adds_to_the_input_value() {
    init_logger();
    let (route, result) = run_statements(vec![
        Statement::SetMetric(LongExpr::IncrementBy(10)),
        Statement::ExitAccept,
    ]);
    let expected = route
        .med
        .add(&SymbolicInteger::constant(route.variable_set(), MED_WIDTH, 10));
    assert!(same_integer(&result.return_value.route.med, &expected));
}

#[test]
fn set_next_hop_discard_is_tracked_concretely() {
    init_logger();
    let (_, result) = run_statements(vec![
        Statement::SetNextHop(NextHopExpr::Discard),
        Statement::ExitAccept,
    ]);
    let route = &result.return_value.route;
    assert!(route.next_hop_set);
    assert_eq!(route.next_hop_kind, NextHopKind::Discarded);
}

#[test]
fn known_tunnel_attribute_is_installed() {
    init_logger();
    let (route, result) = run_statements(vec![
        Statement::SetTunnelAttribute("tun-1".to_string()),
        Statement::ExitAccept,
    ]);
    let expected = SymbolicDomain::constant(
        route.variable_set(),
        route.tunnel_attribute.values().to_vec(),
        &Some("tun-1".to_string()),
    );
    let actual = &result.return_value.route.tunnel_attribute;
    assert!(same_integer(actual.index(), expected.index()));
    assert!(!result.return_value.route.unsupported);
}

#[test]
fn unknown_tunnel_attribute_is_tolerated() {
    init_logger();
    let (route, result) = run_statements(vec![
        Statement::SetTunnelAttribute("tun-9".to_string()),
        Statement::ExitAccept,
    ]);
    assert!(result.return_value.route.unsupported);
    assert!(result.return_value.accept.is_true());
    // The statement itself had no effect.
    let actual = &result.return_value.route.tunnel_attribute;
    assert!(same_integer(actual.index(), route.tunnel_attribute.index()));
}

#[test]
fn set_origin_is_a_tolerated_no_op() {
    init_logger();
    let (route, result) = run_statements(vec![
        Statement::SetOrigin(OriginType::Igp),
        Statement::ExitAccept,
    ]);
    assert!(result.return_value.route.unsupported);
    assert!(result.return_value.accept.is_true());
    let actual = &result.return_value.route.origin_type;
    assert!(same_integer(actual.index(), route.origin_type.index()));
}

#[test]
fn call_statement_propagates_callee_exits() {
    init_logger();
    let catalogue = test_catalogue();
    let mut config = PolicyConfig::new();
    config.add_policy(RoutingPolicy::new(
        "sub",
        vec![if_else(has_community(1, 1), vec![Statement::ExitReject], vec![])],
    ));
    config.add_policy(RoutingPolicy::new(
        "main",
        vec![Statement::Call("sub".to_string()), Statement::ExitAccept],
    ));
    let (route, result) = run(&catalogue, &config, "main");
    assert!(equivalent(
        &result.return_value.accept,
        &route.community_aps[0].not()
    ));
}

#[test]
fn call_statement_contains_callee_returns() {
    init_logger();
    let catalogue = test_catalogue();
    let mut config = PolicyConfig::new();
    config.add_policy(RoutingPolicy::new("sub", vec![Statement::ReturnTrue]));
    config.add_policy(RoutingPolicy::new(
        "main",
        vec![Statement::Call("sub".to_string()), Statement::ExitReject],
    ));
    // The callee's return stops the callee only; the caller's ExitReject
    // still runs and overrides the returned verdict.
    let (_, result) = run(&catalogue, &config, "main");
    assert!(result.return_value.accept.is_false());
}

#[test]
fn undefined_policy_is_an_error() {
    init_logger();
    let catalogue = test_catalogue();
    let config = PolicyConfig::new();
    let err = TransferBdd::new(&catalogue, &config, "missing")
        .compute()
        .unwrap_err();
    assert!(matches!(err, AnalysisError::UndefinedPolicy(name) if name == "missing"));
}

#[test]
fn calling_an_undefined_policy_is_an_error() {
    init_logger();
    let catalogue = test_catalogue();
    let mut config = PolicyConfig::new();
    config.add_policy(RoutingPolicy::new(
        "main",
        vec![Statement::Call("missing".to_string())],
    ));
    let err = TransferBdd::new(&catalogue, &config, "main")
        .compute()
        .unwrap_err();
    assert!(matches!(err, AnalysisError::UndefinedPolicy(name) if name == "missing"));
}

#[test]
fn recursive_calls_are_flagged_not_fatal() {
    init_logger();
    let (_, result) = run_statements(vec![
        Statement::Call("main".to_string()),
        Statement::ExitAccept,
    ]);
    assert!(result.return_value.route.unsupported);
    assert!(result.return_value.accept.is_true());
}

#[test]
fn repeated_call_statements_apply_effects_each_time() {
    init_logger();
    let catalogue = test_catalogue();
    let mut config = PolicyConfig::new();
    config.add_policy(RoutingPolicy::new(
        "bump",
        vec![Statement::SetMetric(LongExpr::IncrementBy(1))],
    ));
    config.add_policy(RoutingPolicy::new(
        "main",
        vec![
            Statement::Call("bump".to_string()),
            Statement::Call("bump".to_string()),
            Statement::ExitAccept,
        ],
    ));
    // Call statements are not memoized: each call re-applies the callee's
    // effects, so the metric grows twice.
    let (route, result) = run(&catalogue, &config, "main");
    let expected = route
        .med
        .add(&SymbolicInteger::constant(route.variable_set(), MED_WIDTH, 2));
    assert!(same_integer(&result.return_value.route.med, &expected));
}

#[test]
fn call_statements_keep_exits_accrued_between_call_sites() {
    init_logger();
    let catalogue = test_catalogue();
    let mut config = PolicyConfig::new();
    config.add_policy(RoutingPolicy::new(
        "bump",
        vec![Statement::SetMetric(LongExpr::IncrementBy(1))],
    ));
    config.add_policy(RoutingPolicy::new(
        "main",
        vec![
            Statement::Call("bump".to_string()),
            if_else(has_community(1, 1), vec![Statement::ExitAccept], vec![]),
            Statement::Call("bump".to_string()),
            Statement::ExitReject,
        ],
    ));
    // The exit taken between the two call sites survives the second call:
    // routes with 1:1 are accepted, everything else rejected.
    let (route, result) = run(&catalogue, &config, "main");
    assert!(equivalent(&result.return_value.accept, &route.community_aps[0]));
    // The second bump only applies where the policy is still running.
    let once = route
        .med
        .add(&SymbolicInteger::constant(route.variable_set(), MED_WIDTH, 1));
    let twice = route
        .med
        .add(&SymbolicInteger::constant(route.variable_set(), MED_WIDTH, 2));
    let expected = twice.ite(&route.community_aps[0].not(), &once);
    assert!(same_integer(&result.return_value.route.med, &expected));
}

#[test]
fn mixed_control_flow_keeps_exit_and_return_disjoint() {
    init_logger();
    let catalogue = test_catalogue();
    let mut config = PolicyConfig::new();
    config.add_policy(RoutingPolicy::new(
        "screen",
        vec![if_else(has_community(2, 2), vec![Statement::ExitReject], vec![])],
    ));
    config.add_policy(RoutingPolicy::new(
        "main",
        vec![
            if_else(has_community(1, 1), vec![Statement::ExitAccept], vec![]),
            Statement::Call("screen".to_string()),
            if_else(has_community(3, 3), vec![Statement::Fallthrough], vec![]),
            Statement::ReturnTrue,
        ],
    ));
    let (route, result) = run(&catalogue, &config, "main");
    // Exit and return never hold together, and falling through implies
    // having returned.
    assert!(result.exit_assigned.and(&result.return_assigned).is_false());
    assert!(result.fallthrough.imp(&result.return_assigned).is_true());
    // Every input ends up decided one way or the other.
    assert!(result.exit_assigned.or(&result.return_assigned).is_true());
    let c = &route.community_aps;
    let expected = c[0].or(&c[0].not().and(&c[1].not()).and(&c[2].not()));
    assert!(equivalent(&result.return_value.accept, &expected));
}

#[test]
fn nested_if_only_commits_on_the_combined_path() {
    init_logger();
    let (route, result) = run_statements(vec![if_else(
        has_community(1, 1),
        vec![if_else(
            has_community(2, 2),
            vec![
                Statement::SetLocalPreference(LongExpr::Literal(50)),
                Statement::ExitAccept,
            ],
            vec![Statement::ExitReject],
        )],
        vec![Statement::ExitReject],
    )]);
    let both = route.community_aps[0].and(&route.community_aps[1]);
    assert!(equivalent(&result.return_value.accept, &both));
    let expected = SymbolicInteger::constant(route.variable_set(), LOCAL_PREF_WIDTH, 50)
        .ite(&both, &route.local_pref);
    assert!(same_integer(&result.return_value.route.local_pref, &expected));
}

#[test]
fn statements_after_an_exit_are_dead() {
    init_logger();
    let (_, result) = run_statements(vec![
        Statement::ExitReject,
        Statement::SetLocalPreference(LongExpr::Literal(999)),
        Statement::ExitAccept,
    ]);
    assert!(result.return_value.accept.is_false());
}
