//! Integration tests for the generation loop.

mod common;

use common::{ScriptedClient, text_response, tool_call_response};
use runtime::tools::definitions::flight_info_tool;
use runtime::{
    FinishReason, GenerationOrchestrator, Message, ModelError, ParamKind, ParamSpec, RunConfig,
    RunError, SchemaSpec, ToolDeclaration, ToolError, ToolOutcome, ToolRegistry,
};
use serde_json::json;
use std::time::Duration;

fn sleepy_tool(name: &str, delay: Duration) -> ToolDeclaration {
    let label = name.to_string();
    ToolDeclaration::from_fn(
        name,
        "Sleeps, then reports its own name",
        SchemaSpec::new().with(ParamSpec::new("tag", "Marker value", ParamKind::String).optional()),
        move |_| {
            let label = label.clone();
            async move {
                tokio::time::sleep(delay).await;
                Ok(json!({ "tool": label }))
            }
        },
    )
}

fn conversation(prompt: &str) -> Vec<Message> {
    vec![Message::user(prompt)]
}

#[tokio::test]
async fn stop_without_tool_calls_terminates_after_one_round() {
    let registry = ToolRegistry::new();
    let client = ScriptedClient::new().then(text_response("Hello there.", FinishReason::Stop));
    let orchestrator = GenerationOrchestrator::new(&registry, &client);

    let result = orchestrator
        .run(conversation("hi"), None)
        .await
        .unwrap();

    assert_eq!(result.text, "Hello there.");
    assert_eq!(result.finish_reason, FinishReason::Stop);
    assert!(result.tool_calls.is_empty());
    assert!(result.tool_results.is_empty());
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn tool_results_preserve_request_order() {
    let mut registry = ToolRegistry::new();
    registry
        .register(sleepy_tool("slow", Duration::from_millis(80)))
        .unwrap();
    registry
        .register(sleepy_tool("fast", Duration::from_millis(0)))
        .unwrap();

    let client = ScriptedClient::new()
        .then(tool_call_response(
            "Checking both.",
            vec![
                ("call-a", "slow", json!({})),
                ("call-b", "fast", json!({})),
                ("call-c", "slow", json!({})),
            ],
        ))
        .then(text_response("Done.", FinishReason::Stop));
    let orchestrator = GenerationOrchestrator::new(&registry, &client);

    let result = orchestrator.run(conversation("go"), None).await.unwrap();

    // One result per call, in the original request order, even though
    // the fast tool completed first.
    assert_eq!(result.tool_results.len(), 3);
    let ids: Vec<_> = result
        .tool_results
        .iter()
        .map(|r| r.tool_call_id.as_str())
        .collect();
    assert_eq!(ids, vec!["call-a", "call-b", "call-c"]);
    for result in &result.tool_results {
        assert!(!result.outcome.is_failure());
    }
    assert_eq!(result.finish_reason, FinishReason::Stop);
}

#[tokio::test]
async fn unknown_tool_yields_failure_result_and_run_continues() {
    let registry = ToolRegistry::new();
    let client = ScriptedClient::new()
        .then(tool_call_response(
            "",
            vec![("call-1", "doesNotExist", json!({}))],
        ))
        .then(text_response("I could not find that tool.", FinishReason::Stop));
    let orchestrator = GenerationOrchestrator::new(&registry, &client);

    let result = orchestrator.run(conversation("go"), None).await.unwrap();

    assert_eq!(result.finish_reason, FinishReason::Stop);
    assert_eq!(result.tool_results.len(), 1);
    match &result.tool_results[0].outcome {
        ToolOutcome::Failure {
            error: ToolError::Unknown { name },
        } => assert_eq!(name, "doesNotExist"),
        other => panic!("expected unknown-tool failure, got {other:?}"),
    }
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn invalid_arguments_become_failure_results_not_aborts() {
    let mut registry = ToolRegistry::new();
    registry.register(flight_info_tool()).unwrap();

    let client = ScriptedClient::new()
        .then(tool_call_response(
            "",
            vec![("call-1", "getFlightInfo", json!({ "originCity": "Seattle" }))],
        ))
        .then(text_response("Which destination?", FinishReason::Stop));
    let orchestrator = GenerationOrchestrator::new(&registry, &client);

    let result = orchestrator.run(conversation("go"), None).await.unwrap();

    match &result.tool_results[0].outcome {
        ToolOutcome::Failure {
            error: ToolError::InvalidArguments { violations, .. },
        } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].path, "destinationCity");
        }
        other => panic!("expected invalid-arguments failure, got {other:?}"),
    }
    assert_eq!(result.finish_reason, FinishReason::Stop);
}

#[tokio::test]
async fn round_limit_bounds_runaway_tool_loops() {
    let mut registry = ToolRegistry::new();
    registry
        .register(sleepy_tool("ping", Duration::from_millis(0)))
        .unwrap();

    let client = ScriptedClient::new().repeating(tool_call_response(
        "",
        vec![("call-1", "ping", json!({}))],
    ));
    let orchestrator = GenerationOrchestrator::new(&registry, &client).with_config(RunConfig {
        max_rounds: 3,
        ..RunConfig::default()
    });

    let err = orchestrator.run(conversation("go"), None).await.unwrap_err();

    match &err {
        RunError::RoundLimitExceeded { limit, partial } => {
            assert_eq!(*limit, 3);
            assert_eq!(partial.finish_reason, FinishReason::Length);
            // Every completed round is preserved in the partial result.
            assert_eq!(partial.tool_calls.len(), 3);
            assert_eq!(partial.tool_results.len(), 3);
        }
        other => panic!("expected round limit abort, got {other:?}"),
    }
    // Exactly max_rounds model calls, never unbounded.
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn model_failure_aborts_with_accumulated_partial() {
    let mut registry = ToolRegistry::new();
    registry
        .register(sleepy_tool("ping", Duration::from_millis(0)))
        .unwrap();

    let client = ScriptedClient::new()
        .then(tool_call_response(
            "One moment.",
            vec![("call-1", "ping", json!({}))],
        ))
        .then_err(ModelError::Api("500: upstream".into()));
    let orchestrator = GenerationOrchestrator::new(&registry, &client);

    let err = orchestrator.run(conversation("go"), None).await.unwrap_err();

    match &err {
        RunError::ModelUnavailable { partial, .. } => {
            assert_eq!(partial.finish_reason, FinishReason::Error);
            assert_eq!(partial.text, "One moment.");
            assert_eq!(partial.tool_results.len(), 1);
        }
        other => panic!("expected model unavailable abort, got {other:?}"),
    }
    assert_eq!(err.partial().tool_calls.len(), 1);
}

#[tokio::test]
async fn stalled_model_call_aborts_with_timeout_source() {
    let mut registry = ToolRegistry::new();
    registry
        .register(sleepy_tool("ping", Duration::from_millis(0)))
        .unwrap();

    let client = ScriptedClient::new()
        .then(tool_call_response(
            "Hold on.",
            vec![("call-1", "ping", json!({}))],
        ))
        .then_stall();
    let orchestrator = GenerationOrchestrator::new(&registry, &client).with_config(RunConfig {
        model_timeout: Duration::from_millis(20),
        ..RunConfig::default()
    });

    let err = orchestrator.run(conversation("go"), None).await.unwrap_err();

    match &err {
        RunError::ModelUnavailable {
            source: ModelError::Timeout(elapsed_ms),
            partial,
        } => {
            assert_eq!(*elapsed_ms, 20);
            assert_eq!(partial.finish_reason, FinishReason::Error);
            // The round that completed before the stall survives.
            assert_eq!(partial.text, "Hold on.");
            assert_eq!(partial.tool_results.len(), 1);
        }
        other => panic!("expected model timeout abort, got {other:?}"),
    }
}

#[tokio::test]
async fn flight_lookup_end_to_end() {
    let mut registry = ToolRegistry::new();
    registry.register(flight_info_tool()).unwrap();

    let client = ScriptedClient::new()
        .then(tool_call_response(
            "",
            vec![(
                "call-1",
                "getFlightInfo",
                json!({ "originCity": "Seattle", "destinationCity": "Miami" }),
            )],
        ))
        .then(text_response(
            "Delta flight DL123 departs at 10:00AM.",
            FinishReason::Stop,
        ));
    let orchestrator = GenerationOrchestrator::new(&registry, &client);

    let result = orchestrator
        .run(conversation("Flights from Seattle to Miami?"), None)
        .await
        .unwrap();

    assert_eq!(result.tool_results.len(), 1);
    match &result.tool_results[0].outcome {
        ToolOutcome::Success { output } => assert_eq!(output["airline"], "Delta"),
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(result.text, "Delta flight DL123 departs at 10:00AM.");
}

#[tokio::test]
async fn flight_lookup_unknown_route_is_error_shaped_success() {
    let mut registry = ToolRegistry::new();
    registry.register(flight_info_tool()).unwrap();

    let client = ScriptedClient::new()
        .then(tool_call_response(
            "",
            vec![(
                "call-1",
                "getFlightInfo",
                json!({ "originCity": "Denver", "destinationCity": "Miami" }),
            )],
        ))
        .then(text_response("No flights found.", FinishReason::Stop));
    let orchestrator = GenerationOrchestrator::new(&registry, &client);

    let result = orchestrator
        .run(conversation("Flights from Denver to Miami?"), None)
        .await
        .unwrap();

    // The tool reports "no flights" as data, not as a failed call.
    match &result.tool_results[0].outcome {
        ToolOutcome::Success { output } => assert!(output["error"].is_string()),
        other => panic!("expected success, got {other:?}"),
    }
}
