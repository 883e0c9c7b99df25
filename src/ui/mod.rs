pub mod ipc;
mod script;

use std::path::{Path, PathBuf};

use tao::dpi::LogicalSize;
use tao::event_loop::EventLoop;
use tao::window::{Fullscreen, Icon, Window, WindowBuilder};
use tracing::warn;
use url::Url;
#[cfg(target_os = "linux")]
use wry::WebViewBuilderExtUnix;
use wry::{PageLoadEvent, WebView, WebViewBuilder};

use crate::app::ShellEvent;
use crate::domain::{AppError, DialogSelection, SaveDialogOptions};

use script::BRIDGE_SCRIPT;

/// Native window settings
#[derive(Debug, Clone)]
pub struct WindowSettings {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub min_width: f64,
    pub min_height: f64,
    pub resizable: bool,
    pub fullscreen: bool,
    pub background: (u8, u8, u8, u8),
    pub devtools: bool,
    pub icon: Option<PathBuf>,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "PSDocling - Document Processor".to_string(),
            width: 1400.0,
            height: 900.0,
            min_width: 800.0,
            min_height: 600.0,
            resizable: true,
            fullscreen: false,
            background: (0x0f, 0x11, 0x15, 0xff),
            devtools: false,
            icon: None,
        }
    }
}

/// Parse `#rrggbb` (or `#rrggbbaa`) into an RGBA tuple.
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();

    match digits.len() {
        6 => Some((channel(0)?, channel(2)?, channel(4)?, 0xff)),
        8 => Some((channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

fn load_icon(path: &Path) -> Result<Icon, AppError> {
    let img = image::open(path)
        .map_err(|e| AppError::Window(format!("Failed to load icon '{}': {}", path.display(), e)))?;
    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    Icon::from_rgba(rgba.into_raw(), width, height)
        .map_err(|e| AppError::Window(format!("Failed to create icon: {}", e)))
}

pub fn build_window(
    event_loop: &EventLoop<ShellEvent>,
    settings: &WindowSettings,
) -> Result<Window, AppError> {
    let mut builder = WindowBuilder::new()
        .with_title(&settings.title)
        .with_inner_size(LogicalSize::new(settings.width, settings.height))
        .with_min_inner_size(LogicalSize::new(settings.min_width, settings.min_height))
        .with_resizable(settings.resizable)
        .with_background_color(settings.background);

    if settings.fullscreen {
        builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }

    if let Some(path) = &settings.icon {
        match load_icon(path) {
            Ok(icon) => builder = builder.with_window_icon(Some(icon)),
            Err(e) => warn!("{}", e),
        }
    }

    builder
        .build(event_loop)
        .map_err(|e| AppError::Window(format!("Failed to create window: {}", e)))
}

/// Build the webview hosting `url`, with the bridge script injected,
/// `on_message` receiving every IPC message body and `on_navigate` called
/// each time a new page starts loading.
pub fn build_webview<F, N>(
    window: &Window,
    settings: &WindowSettings,
    url: &Url,
    on_message: F,
    on_navigate: N,
) -> Result<WebView, AppError>
where
    F: Fn(&str) + 'static,
    N: Fn() + 'static,
{
    let builder = WebViewBuilder::new()
        .with_url(url.as_str())
        .with_devtools(settings.devtools)
        .with_background_color(settings.background)
        .with_initialization_script(BRIDGE_SCRIPT)
        .with_ipc_handler(move |request: wry::http::Request<String>| {
            on_message(request.body());
        })
        .with_on_page_load_handler(move |event: PageLoadEvent, _url: String| {
            if let PageLoadEvent::Started = event {
                on_navigate();
            }
        });

    #[cfg(target_os = "linux")]
    let webview = {
        use tao::platform::unix::WindowExtUnix;
        builder.build_gtk(window.gtk_window())
    };

    #[cfg(not(target_os = "linux"))]
    let webview = builder.build(window);

    webview.map_err(|e| AppError::Window(format!("Failed to create webview: {}", e)))
}

/// Show the native save dialog as a child of `window`. Blocks the calling
/// (event loop) thread until the user answers.
pub fn show_save_dialog(window: &Window, options: SaveDialogOptions) -> DialogSelection {
    let mut dialog = rfd::FileDialog::new()
        .set_parent(window)
        .set_title(&options.title)
        .set_file_name(&options.file_name);

    if let Some(directory) = &options.directory {
        dialog = dialog.set_directory(directory);
    }
    for filter in &options.filters {
        dialog = dialog.add_filter(&filter.name, filter.extensions.as_slice());
    }

    match dialog.save_file() {
        Some(path) => DialogSelection::Single(path),
        None => DialogSelection::None,
    }
}
