//! Dispatcher scenarios against a populated registry
//!
//! The registry is filled the way a peer would fill it: api tables first,
//! then data messages.

use network::{MemoryOutbound, Session};
use proptest::prelude::*;
use rpc::{FeatureKind, RpcDispatcher, RpcType};
use serde_json::{json, Value};
use settings::{FramingSettings, RpcSettings};
use state::{Registry, SharedRegistry};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

const PLUGIN_RECORD: usize = 14;

fn command_record(registry: &SharedRegistry) {
    let mut reg = registry.lock();
    reg.update(&json!({
        "id": 0,
        "api": {
            "RPCType": 0, "windowLayout": 1, "windowId": 2, "database": 3,
            "stateNumber": 4, "plotType": 5, "operatorType": 6, "variable": 7,
            "activePlotIds": 8, "boolFlag": 9, "intArg1": 10
        }
    }))
    .unwrap();
    reg.update(&json!({
        "id": 0,
        "contents": [0, 1, 1, "", 0, 0, 0, "", [], false, 0],
        "metadata": ["ViewerRPCType", "int", "int", "string", "int", "int",
                     "int", "string", "intVector", "bool", "int"]
    }))
    .unwrap();
}

fn plugin_record(registry: &SharedRegistry, names: Value, types: Value, enabled: Value) {
    let mut reg = registry.lock();
    reg.update(&json!({
        "id": PLUGIN_RECORD,
        "api": {"name": 0, "type": 1, "enabled": 2}
    }))
    .unwrap();
    reg.update(&json!({"id": PLUGIN_RECORD, "contents": [names, types, enabled]}))
        .unwrap();
}

fn fixture() -> (RpcDispatcher<MemoryOutbound>, Arc<MemoryOutbound>, SharedRegistry) {
    let registry = Registry::shared();
    command_record(&registry);
    plugin_record(
        &registry,
        json!(["Mesh", "Pseudocolor", "Vector"]),
        json!(["plot", "plot", "plot"]),
        json!([1, 1, 0]),
    );
    let outbound = Arc::new(MemoryOutbound::new());
    let dispatcher = RpcDispatcher::new(registry.clone(), outbound.clone(), RpcSettings::default());
    (dispatcher, outbound, registry)
}

#[test_log::test(tokio::test)]
async fn add_plot_resolves_sorted_enabled_index() {
    let (rpc, outbound, registry) = fixture();

    assert!(rpc.add_plot("Pseudocolor", "temperature").await.unwrap());

    let sent = outbound.json_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0],
        json!({
            "id": 0,
            "contents": {
                "0": RpcType::AddPlot.code(),
                "5": 1,
                "7": "temperature"
            },
            "metadata": {"0": "ViewerRPCType", "5": "int", "7": "string"}
        })
    );
    assert!(registry.lock().get(0).unwrap().pending().is_empty());
}

#[tokio::test]
async fn add_plot_first_enabled_name_is_index_zero() {
    let (rpc, outbound, _registry) = fixture();
    assert!(rpc.add_plot("Mesh", "mesh").await.unwrap());
    let sent = outbound.json_messages();
    assert_eq!(sent[0]["contents"]["5"], json!(0));
    assert_eq!(sent[0]["contents"]["0"], json!(RpcType::AddPlot.code()));
}

#[tokio::test]
async fn add_plot_with_disabled_or_unknown_name_is_skipped() {
    let (rpc, outbound, registry) = fixture();

    assert!(!rpc.add_plot("Vector", "velocity").await.unwrap());
    assert!(!rpc.add_plot("Volume", "density").await.unwrap());

    assert!(outbound.messages().is_empty());
    assert!(registry.lock().get(0).unwrap().pending().is_empty());
    assert_eq!(rpc.available(FeatureKind::Plot), vec!["Mesh", "Pseudocolor"]);
}

#[tokio::test]
async fn add_operator_filters_by_kind() {
    let registry = Registry::shared();
    command_record(&registry);
    plugin_record(
        &registry,
        json!(["Slice", "Mesh", "Clip", "Threshold"]),
        json!(["operator", "plot", "operator", "operator"]),
        json!([true, true, true, false]),
    );
    let outbound = Arc::new(MemoryOutbound::new());
    let rpc = RpcDispatcher::new(registry, outbound.clone(), RpcSettings::default());

    assert!(rpc.add_operator("Slice").await.unwrap());
    assert!(!rpc.add_operator("Mesh").await.unwrap());

    let sent = outbound.json_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["contents"]["0"], json!(RpcType::AddOperator.code()));
    assert_eq!(sent[0]["contents"]["6"], json!(1));
}

#[tokio::test]
async fn argument_rpcs_stage_their_fields() {
    let (rpc, outbound, _registry) = fixture();

    rpc.open_database("localhost:/data/run1.silo", 3).await.unwrap();
    rpc.reopen_database("localhost:/data/run1.silo", true).await.unwrap();
    rpc.set_active_plots(&[0, 2]).await.unwrap();
    rpc.set_time_slider_state(12).await.unwrap();
    rpc.draw_plots().await.unwrap();

    let sent = outbound.json_messages();
    let contents: Vec<&Value> = sent.iter().map(|m| &m["contents"]).collect();
    assert_eq!(
        contents[0],
        &json!({"0": RpcType::OpenDatabase.code(), "3": "localhost:/data/run1.silo", "10": 3})
    );
    assert_eq!(
        contents[1],
        &json!({"0": RpcType::ReOpenDatabase.code(), "3": "localhost:/data/run1.silo", "9": true})
    );
    assert_eq!(
        contents[2],
        &json!({"0": RpcType::SetActivePlots.code(), "8": [0, 2]})
    );
    assert_eq!(
        contents[3],
        &json!({"0": RpcType::SetTimeSliderState.code(), "4": 12})
    );
    assert_eq!(contents[4], &json!({"0": RpcType::DrawPlots.code()}));
}

#[tokio::test]
async fn concurrent_calls_never_interleave_fields() {
    let (rpc, outbound, _registry) = fixture();
    let rpc = Arc::new(rpc);

    let mut tasks = Vec::new();
    for window in 0..16 {
        let rpc = rpc.clone();
        tasks.push(tokio::spawn(async move {
            rpc.set_active_window(window).await.unwrap();
            rpc.change_active_plots_var(&format!("var{window}")).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let sent = outbound.json_messages();
    assert_eq!(sent.len(), 32);
    for message in sent {
        let contents = message["contents"].as_object().unwrap();
        assert_eq!(contents.len(), 2);
        let code = contents["0"].as_i64().unwrap() as i32;
        match RpcType::from_code(code) {
            Some(RpcType::SetActiveWindow) => assert!(contents.contains_key("2")),
            Some(RpcType::ChangeActivePlotsVar) => assert!(contents.contains_key("7")),
            other => panic!("unexpected procedure {other:?}"),
        }
    }
}

#[tokio::test]
async fn dispatcher_over_session_uses_its_outbound() {
    let (mut peer, client) = tokio::io::duplex(1024);
    let outbound = Arc::new(MemoryOutbound::new());
    let session = Session::start(
        client,
        outbound.clone(),
        Registry::shared(),
        &FramingSettings::default(),
    );
    peer.write_all(br#"{"id":0,"api":{"RPCType":0}}{"id":0,"contents":[0]}"#)
        .await
        .unwrap();

    let mut settings = settings::SyncConfig::default().session;
    settings.min_records = 1;
    let mut events = session.subscribe();
    session.wait_ready(&settings).await.unwrap();
    if session.registry().lock().get(0).unwrap().contents().is_empty() {
        events.recv().await.unwrap();
    }

    let rpc = RpcDispatcher::for_session(&session, RpcSettings::default());
    rpc.detach().await.unwrap();
    assert_eq!(
        outbound.json_messages(),
        vec![json!({"id": 0, "contents": {"0": 1}, "metadata": {"0": null}})]
    );
}

proptest! {
    #[test]
    fn prop_resolution_matches_sorted_enabled_position(
        plugins in proptest::collection::btree_map("[A-Z][a-z]{2,8}", (any::<bool>(), any::<bool>()), 1..12)
    ) {
        let names: Vec<&String> = plugins.keys().collect();
        let types: Vec<&str> = plugins.values().map(|(is_plot, _)| if *is_plot { "plot" } else { "operator" }).collect();
        let enabled: Vec<i32> = plugins.values().map(|(_, on)| i32::from(*on)).collect();

        let registry = Registry::shared();
        command_record(&registry);
        plugin_record(&registry, json!(names), json!(types), json!(enabled));
        let rpc = RpcDispatcher::new(registry, Arc::new(MemoryOutbound::new()), RpcSettings::default());

        let expected: Vec<String> = plugins
            .iter()
            .filter(|(_, (is_plot, on))| *is_plot && *on)
            .map(|(name, _)| name.clone())
            .collect();
        prop_assert_eq!(rpc.available(FeatureKind::Plot), expected);
    }
}
