use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use tao::window::WindowId;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::application::{BridgeContext, DownloadBridge};
use crate::config::LauncherConfig;
use crate::domain::{AppError, DialogSelection, HostError, HostWindow, SaveDialogOptions};
use crate::ui::{self, ipc};

/// Events delivered to the UI thread's event loop.
#[derive(Debug)]
pub enum ShellEvent {
    /// Open the save dialog on `window_id` and answer through `respond`.
    ShowSaveDialog {
        window_id: WindowId,
        options: SaveDialogOptions,
        respond: oneshot::Sender<DialogSelection>,
    },
    /// Deliver a finished bridge call back to the page load that issued it.
    Reply {
        page: u64,
        call_id: String,
        result: serde_json::Value,
    },
    Interrupted,
}

/// [`HostWindow`] backed by the tao event loop. Dialog requests are posted
/// to the UI thread, which owns the native window.
pub struct ShellWindow {
    proxy: Mutex<EventLoopProxy<ShellEvent>>,
    window_id: WindowId,
}

impl ShellWindow {
    pub fn new(proxy: EventLoopProxy<ShellEvent>, window_id: WindowId) -> Self {
        Self {
            proxy: Mutex::new(proxy),
            window_id,
        }
    }
}

#[async_trait]
impl HostWindow for ShellWindow {
    async fn save_dialog(&self, options: SaveDialogOptions) -> Result<DialogSelection, HostError> {
        let (respond, answer) = oneshot::channel();
        let event = ShellEvent::ShowSaveDialog {
            window_id: self.window_id,
            options,
            respond,
        };

        self.proxy
            .lock()
            .map_err(|_| HostError::EventLoopClosed)?
            .send_event(event)
            .map_err(|_| HostError::EventLoopClosed)?;

        answer.await.map_err(|_| HostError::DialogDropped)
    }
}

/// Create the window, wire the download bridge into it and run the event
/// loop until the window is closed. Only returns on setup errors.
pub fn run(config: LauncherConfig, runtime: Runtime) -> Result<(), AppError> {
    let event_loop = EventLoopBuilder::<ShellEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    // The window's IPC handler needs the bridge, the bridge needs the window:
    // build the bridge unbound and bind it once the window exists.
    let bridge = Arc::new(DownloadBridge::new(BridgeContext::new(config.backend.clone())));
    let page_loads = Arc::new(ipc::PageLoads::default());

    let window = ui::build_window(&event_loop, &config.window)?;
    let on_message = {
        let bridge = bridge.clone();
        let proxy = proxy.clone();
        let page_loads = page_loads.clone();
        let handle = runtime.handle().clone();
        move |body: &str| match ipc::parse_call(body) {
            Ok(call) => {
                let bridge = bridge.clone();
                let proxy = proxy.clone();
                let page = page_loads.current();
                handle.spawn(async move {
                    let result = ipc::dispatch(&bridge, &call).await;
                    let reply = ShellEvent::Reply {
                        page,
                        call_id: call.id,
                        result,
                    };
                    if proxy.send_event(reply).is_err() {
                        debug!("Window closed before bridge reply");
                    }
                });
            }
            Err(e) => warn!("{}", e),
        }
    };
    let on_navigate = {
        let page_loads = page_loads.clone();
        move || {
            let page = page_loads.begin_load();
            debug!(page, "Page load started");
        }
    };
    let webview = ui::build_webview(
        &window,
        &config.window,
        &config.web_url,
        on_message,
        on_navigate,
    )?;

    bridge
        .context()
        .bind_window(Arc::new(ShellWindow::new(proxy.clone(), window.id())));

    runtime.spawn({
        let proxy = proxy.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = proxy.send_event(ShellEvent::Interrupted);
            }
        }
    });

    info!(url = %config.web_url, "Launching interface");

    event_loop.run(move |event, _target, control_flow| {
        *control_flow = ControlFlow::Wait;
        // Keep the runtime alive for as long as the loop runs.
        let _runtime = &runtime;

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                info!("Window closed");
                *control_flow = ControlFlow::Exit;
            }
            Event::UserEvent(ShellEvent::ShowSaveDialog {
                window_id,
                options,
                respond,
            }) => {
                let selection = if window_id == window.id() {
                    ui::show_save_dialog(&window, options)
                } else {
                    warn!(?window_id, "Save dialog requested for unknown window");
                    DialogSelection::None
                };
                let _ = respond.send(selection);
            }
            Event::UserEvent(ShellEvent::Reply {
                page,
                call_id,
                result,
            }) => {
                if !page_loads.is_current(page) {
                    debug!(%call_id, page, "Dropping reply for a page that has navigated away");
                } else if let Err(e) =
                    webview.evaluate_script(&ipc::reply_script(&call_id, &result))
                {
                    warn!(%call_id, error = %e, "Failed to deliver bridge reply");
                }
            }
            Event::UserEvent(ShellEvent::Interrupted) => {
                info!("Interrupted by user");
                *control_flow = ControlFlow::Exit;
            }
            _ => {}
        }
    })
}

