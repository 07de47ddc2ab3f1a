//! RPC dispatcher
//!
//! Each procedure stages its arguments plus the `RPCType` code on the command
//! record and flushes that record. Calls are serialized through one gate so
//! two procedures never interleave their staged fields.

use crate::error::{RpcError, RpcResult};
use crate::resolve::{enabled_features, resolve_feature};
use crate::types::{FeatureKind, RpcType};
use network::{flush_record, Outbound, Session};
use serde_json::{json, Value};
use settings::RpcSettings;
use state::SharedRegistry;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Command record field names
pub mod fields {
    pub const RPC_TYPE: &str = "RPCType";
    pub const WINDOW_LAYOUT: &str = "windowLayout";
    pub const WINDOW_ID: &str = "windowId";
    pub const DATABASE: &str = "database";
    pub const STATE_NUMBER: &str = "stateNumber";
    pub const PLOT_TYPE: &str = "plotType";
    pub const OPERATOR_TYPE: &str = "operatorType";
    pub const VARIABLE: &str = "variable";
    pub const ACTIVE_PLOT_IDS: &str = "activePlotIds";
    pub const BOOL_FLAG: &str = "boolFlag";
    pub const INT_ARG1: &str = "intArg1";
}

use fields::*;

pub struct RpcDispatcher<O: Outbound + ?Sized = dyn Outbound> {
    registry: SharedRegistry,
    outbound: Arc<O>,
    settings: RpcSettings,
    gate: Mutex<()>,
}

impl RpcDispatcher<dyn Outbound> {
    /// Dispatcher sharing `session`'s registry and outbound sink
    pub fn for_session(session: &Session, settings: RpcSettings) -> Self {
        Self::new(session.registry().clone(), session.outbound(), settings)
    }
}

impl<O: Outbound + ?Sized> RpcDispatcher<O> {
    pub fn new(registry: SharedRegistry, outbound: Arc<O>, settings: RpcSettings) -> Self {
        Self {
            registry,
            outbound,
            settings,
            gate: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &RpcSettings {
        &self.settings
    }

    /// Issue `rpc` with extra `(field, value)` arguments
    pub async fn call(&self, rpc: RpcType, args: &[(&str, Value)]) -> RpcResult<()> {
        let _gate = self.gate.lock().await;
        self.issue(rpc, args).await
    }

    async fn issue(&self, rpc: RpcType, args: &[(&str, Value)]) -> RpcResult<()> {
        self.stage(rpc, args)?;
        let id = self.settings.rpc_record_id;
        if !flush_record(&self.registry, &*self.outbound, id).await? {
            return Err(RpcError::NotReady { id });
        }
        info!(rpc = %rpc, "Issued RPC");
        Ok(())
    }

    fn stage(&self, rpc: RpcType, args: &[(&str, Value)]) -> RpcResult<()> {
        let id = self.settings.rpc_record_id;
        let mut registry = self.registry.lock();
        let record = registry
            .get_mut(id)
            .filter(|record| record.has_api())
            .ok_or(RpcError::NotReady { id })?;

        let code = (RPC_TYPE, json!(rpc.code()));
        for (field, value) in std::iter::once(code).chain(args.iter().cloned()) {
            if !record.set(field, value) {
                record.discard_pending();
                return Err(RpcError::Rejected {
                    rpc: rpc.name(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    fn resolve(&self, kind: FeatureKind, name: &str) -> Option<i32> {
        let registry = self.registry.lock();
        registry
            .get(self.settings.plugin_record_id)
            .and_then(|plugins| resolve_feature(plugins, kind, name))
    }

    /// Sorted names of enabled plugins of `kind`
    pub fn available(&self, kind: FeatureKind) -> Vec<String> {
        let registry = self.registry.lock();
        registry
            .get(self.settings.plugin_record_id)
            .map(|plugins| enabled_features(plugins, kind))
            .unwrap_or_default()
    }

    async fn issue_resolved<'a>(
        &self,
        rpc: RpcType,
        kind: FeatureKind,
        name: &str,
        field: &'a str,
        extra: Option<(&'a str, Value)>,
    ) -> RpcResult<bool> {
        let _gate = self.gate.lock().await;
        let Some(index) = self.resolve(kind, name) else {
            debug!(rpc = %rpc, name, "Unknown plugin; RPC not issued");
            return Ok(false);
        };

        let mut args = vec![(field, json!(index))];
        args.extend(extra);
        self.issue(rpc, &args).await?;
        Ok(true)
    }

    // Session

    pub async fn close(&self) -> RpcResult<()> {
        self.call(RpcType::Close, &[]).await
    }

    pub async fn detach(&self) -> RpcResult<()> {
        self.call(RpcType::Detach, &[]).await
    }

    // Windows

    pub async fn add_window(&self) -> RpcResult<()> {
        self.call(RpcType::AddWindow, &[]).await
    }

    pub async fn delete_window(&self) -> RpcResult<()> {
        self.call(RpcType::DeleteWindow, &[]).await
    }

    pub async fn set_window_layout(&self, layout: i32) -> RpcResult<()> {
        self.call(RpcType::SetWindowLayout, &[(WINDOW_LAYOUT, json!(layout))])
            .await
    }

    pub async fn set_active_window(&self, window_id: i32) -> RpcResult<()> {
        self.call(RpcType::SetActiveWindow, &[(WINDOW_ID, json!(window_id))])
            .await
    }

    pub async fn clear_window(&self) -> RpcResult<()> {
        self.call(RpcType::ClearWindow, &[]).await
    }

    pub async fn clear_all_windows(&self) -> RpcResult<()> {
        self.call(RpcType::ClearAllWindows, &[]).await
    }

    pub async fn save_window(&self) -> RpcResult<()> {
        self.call(RpcType::SaveWindow, &[]).await
    }

    // Databases

    /// Open `database` at time state `state`
    pub async fn open_database(&self, database: &str, state: i32) -> RpcResult<()> {
        self.call(
            RpcType::OpenDatabase,
            &[(DATABASE, json!(database)), (INT_ARG1, json!(state))],
        )
        .await
    }

    pub async fn close_database(&self, database: &str) -> RpcResult<()> {
        self.call(RpcType::CloseDatabase, &[(DATABASE, json!(database))])
            .await
    }

    /// Reopen `database`, optionally forcing the engine to drop cached data
    pub async fn reopen_database(&self, database: &str, force_close: bool) -> RpcResult<()> {
        self.call(
            RpcType::ReOpenDatabase,
            &[(DATABASE, json!(database)), (BOOL_FLAG, json!(force_close))],
        )
        .await
    }

    pub async fn activate_database(&self, database: &str) -> RpcResult<()> {
        self.call(RpcType::ActivateDatabase, &[(DATABASE, json!(database))])
            .await
    }

    pub async fn check_for_new_states(&self, database: &str) -> RpcResult<()> {
        self.call(RpcType::CheckForNewStates, &[(DATABASE, json!(database))])
            .await
    }

    // Plots

    /// Add a plot of `variable`; `Ok(false)` when `plot` is not an enabled plot
    pub async fn add_plot(&self, plot: &str, variable: &str) -> RpcResult<bool> {
        self.issue_resolved(
            RpcType::AddPlot,
            FeatureKind::Plot,
            plot,
            PLOT_TYPE,
            Some((VARIABLE, json!(variable))),
        )
        .await
    }

    pub async fn delete_active_plots(&self) -> RpcResult<()> {
        self.call(RpcType::DeleteActivePlots, &[]).await
    }

    pub async fn hide_active_plots(&self) -> RpcResult<()> {
        self.call(RpcType::HideActivePlots, &[]).await
    }

    pub async fn draw_plots(&self) -> RpcResult<()> {
        self.call(RpcType::DrawPlots, &[]).await
    }

    pub async fn set_active_plots(&self, plot_ids: &[i32]) -> RpcResult<()> {
        self.call(RpcType::SetActivePlots, &[(ACTIVE_PLOT_IDS, json!(plot_ids))])
            .await
    }

    pub async fn change_active_plots_var(&self, variable: &str) -> RpcResult<()> {
        self.call(RpcType::ChangeActivePlotsVar, &[(VARIABLE, json!(variable))])
            .await
    }

    // Operators

    /// Apply operator `operator`; `Ok(false)` when it is not an enabled operator
    pub async fn add_operator(&self, operator: &str) -> RpcResult<bool> {
        self.issue_resolved(
            RpcType::AddOperator,
            FeatureKind::Operator,
            operator,
            OPERATOR_TYPE,
            None,
        )
        .await
    }

    pub async fn remove_last_operator(&self) -> RpcResult<()> {
        self.call(RpcType::RemoveLastOperator, &[]).await
    }

    pub async fn remove_all_operators(&self) -> RpcResult<()> {
        self.call(RpcType::RemoveAllOperators, &[]).await
    }

    // Time and animation

    pub async fn time_slider_next_state(&self) -> RpcResult<()> {
        self.call(RpcType::TimeSliderNextState, &[]).await
    }

    pub async fn time_slider_previous_state(&self) -> RpcResult<()> {
        self.call(RpcType::TimeSliderPreviousState, &[]).await
    }

    pub async fn set_time_slider_state(&self, state: i32) -> RpcResult<()> {
        self.call(RpcType::SetTimeSliderState, &[(STATE_NUMBER, json!(state))])
            .await
    }

    pub async fn animation_play(&self) -> RpcResult<()> {
        self.call(RpcType::AnimationPlay, &[]).await
    }

    pub async fn animation_reverse_play(&self) -> RpcResult<()> {
        self.call(RpcType::AnimationReversePlay, &[]).await
    }

    pub async fn animation_stop(&self) -> RpcResult<()> {
        self.call(RpcType::AnimationStop, &[]).await
    }

    // View

    pub async fn reset_view(&self) -> RpcResult<()> {
        self.call(RpcType::ResetView, &[]).await
    }

    pub async fn recenter_view(&self) -> RpcResult<()> {
        self.call(RpcType::RecenterView, &[]).await
    }
}
