//! Procedure codes
//!
//! The peer identifies each procedure by its position in a fixed table, so
//! variants must never be reordered; new procedures are appended.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

macro_rules! rpc_types {
    ($($variant:ident),+ $(,)?) => {
        /// Procedure selector written to the `RPCType` field
        #[repr(i32)]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive,
        )]
        pub enum RpcType {
            $($variant),+
        }

        impl RpcType {
            /// Every procedure in code order
            pub const ALL: &'static [RpcType] = &[$(RpcType::$variant),+];

            /// Wire name, e.g. `AddPlotRPC`
            pub fn name(self) -> &'static str {
                match self {
                    $(RpcType::$variant => concat!(stringify!($variant), "RPC")),+
                }
            }
        }
    };
}

rpc_types! {
    Close,
    Detach,
    AddWindow,
    DeleteWindow,
    SetWindowLayout,
    SetActiveWindow,
    ClearWindow,
    ClearAllWindows,
    OpenDatabase,
    CloseDatabase,
    ActivateDatabase,
    CheckForNewStates,
    CreateDatabaseCorrelation,
    AlterDatabaseCorrelation,
    DeleteDatabaseCorrelation,
    ReOpenDatabase,
    ReplaceDatabase,
    OverlayDatabase,
    OpenComputeEngine,
    CloseComputeEngine,
    AnimationSetNFrames,
    AnimationPlay,
    AnimationReversePlay,
    AnimationStop,
    TimeSliderNextState,
    TimeSliderPreviousState,
    SetTimeSliderState,
    SetActiveTimeSlider,
    AddPlot,
    SetPlotFrameRange,
    DeletePlotKeyframe,
    MovePlotKeyframe,
    DeleteActivePlots,
    HideActivePlots,
    DrawPlots,
    DisableRedraw,
    Redraw,
    SetActivePlots,
    ChangeActivePlotsVar,
    AddOperator,
    AddInitializedOperator,
    PromoteOperator,
    DemoteOperator,
    RemoveOperator,
    RemoveLastOperator,
    RemoveAllOperators,
    SaveWindow,
    SetDefaultPlotOptions,
    SetPlotOptions,
    SetDefaultOperatorOptions,
    SetOperatorOptions,
    WriteConfigFile,
    ConnectToMetaDataServer,
    IconifyAllWindows,
    DeIconifyAllWindows,
    ShowAllWindows,
    HideAllWindows,
    UpdateColorTable,
    SetAnnotationAttributes,
    SetDefaultAnnotationAttributes,
    ResetAnnotationAttributes,
    SetKeyframeAttributes,
    SetPlotSILRestriction,
    SetViewAxisArray,
    SetViewCurve,
    SetView2D,
    SetView3D,
    ResetPlotOptions,
    ResetOperatorOptions,
    SetAppearance,
    ProcessExpressions,
    SetLightList,
    SetDefaultLightList,
    ResetLightList,
    SetAnimationAttributes,
    SetWindowArea,
    PrintWindow,
    ResetView,
    RecenterView,
    ToggleAllowPopup,
    ToggleMaintainViewMode,
    ToggleBoundingBoxMode,
    ToggleCameraViewMode,
    TogglePerspectiveView,
    ToggleSpinMode,
    ToggleLockTime,
    ToggleLockTools,
    ToggleLockViewMode,
    ToggleFullFrame,
    UndoView,
    RedoView,
    InvertBackground,
    ClearPickPoints,
    SetWindowMode,
    EnableTool,
}

impl RpcType {
    /// Code written to the `RPCType` field
    pub fn code(self) -> i32 {
        self.into()
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::try_from(code).ok()
    }

    /// Look up by wire name (`AddPlotRPC`)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|rpc| rpc.name() == name)
    }
}

impl std::fmt::Display for RpcType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Plugin category used to filter the plugin list during name resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Plot,
    Operator,
}

impl FeatureKind {
    /// Value of the plugin record's `type` entry for this category
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Plot => "plot",
            FeatureKind::Operator => "operator",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_declaration_order() {
        assert_eq!(RpcType::Close.code(), 0);
        assert_eq!(RpcType::Detach.code(), 1);
        assert_eq!(RpcType::AddPlot.code(), 28);
        for (i, rpc) in RpcType::ALL.iter().enumerate() {
            assert_eq!(rpc.code(), i as i32);
            assert_eq!(RpcType::from_code(i as i32), Some(*rpc));
        }
        assert_eq!(RpcType::from_code(RpcType::ALL.len() as i32), None);
        assert_eq!(RpcType::from_code(-1), None);
    }

    #[test]
    fn names_round_trip() {
        assert_eq!(RpcType::AddPlot.name(), "AddPlotRPC");
        assert_eq!(RpcType::from_name("ReOpenDatabaseRPC"), Some(RpcType::ReOpenDatabase));
        assert_eq!(RpcType::from_name("AddPlot"), None);
        assert_eq!(RpcType::SetView3D.to_string(), "SetView3DRPC");
    }

    #[test]
    fn feature_kind_matches_plugin_type_strings() {
        assert_eq!(FeatureKind::Plot.as_str(), "plot");
        assert_eq!(
            serde_json::to_value(FeatureKind::Operator).unwrap(),
            serde_json::json!("operator")
        );
    }
}
