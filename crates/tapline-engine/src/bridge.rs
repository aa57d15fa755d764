use async_trait::async_trait;
pub use tapline_common::error::BridgeError;
use tapline_common::protocol::{
    AppInfo, GlobalAction, LaunchEntry, LaunchRequest, NodeHandle, NodeOperation, ScreenSize,
    Stroke,
};
use tapline_common::tree::UiTree;

/// The automation capability the engine drives.
///
/// Implementations wrap a platform accessibility service (or a fixture). The
/// engine never reaches for a global service instance; it is handed a bridge
/// at construction time.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Whether the accessibility service is currently connected.
    async fn is_connected(&self) -> bool;

    /// Snapshot of the active window's tree, or `None` when no window is
    /// active.
    async fn snapshot(&mut self) -> Result<Option<UiTree>, BridgeError>;

    /// Perform an operation on a live node. `text` is the argument for
    /// `SetText` and ignored otherwise. Returns the platform's success flag.
    async fn perform(
        &mut self,
        node: NodeHandle,
        operation: NodeOperation,
        text: Option<&str>,
    ) -> Result<bool, BridgeError>;

    /// Dispatch a raw touch stroke. Returns whether it was dispatched.
    async fn dispatch_gesture(&mut self, stroke: &Stroke) -> Result<bool, BridgeError>;

    /// Request a device-level action.
    async fn global_action(&mut self, action: GlobalAction) -> Result<bool, BridgeError>;

    async fn screen_size(&self) -> Result<ScreenSize, BridgeError>;

    async fn installed_apps(&mut self) -> Result<Vec<AppInfo>, BridgeError>;

    /// Main launch entry of a package, if it has one.
    async fn launch_entry(&mut self, package: &str) -> Result<Option<LaunchEntry>, BridgeError>;

    /// Start something as a new task.
    async fn start(&mut self, request: &LaunchRequest) -> Result<(), BridgeError>;

    /// Whether some installed app can handle `request`.
    async fn can_handle(&mut self, _request: &LaunchRequest) -> Result<bool, BridgeError> {
        Ok(true)
    }
}
