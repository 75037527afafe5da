use anyhow::{anyhow, Context, Result};
use clap::Parser;
use glutin::{
    config::{Config, ConfigTemplateBuilder},
    context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version},
    display::{Display, DisplayApiPreference, GlDisplay},
    prelude::*,
    surface::{Surface, SwapInterval, WindowSurface},
};
use glutin_winit::GlWindow;
use log::{debug, error, info, warn};
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle, RawWindowHandle};
use simple_logger::SimpleLogger;
use std::{ffi::CString, num::NonZeroU32, path::PathBuf, sync::Arc};
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

use glwidget::{
    config::Overrides, AppConfig, FailurePolicy, GlowContext, GpuContext, ShaderPipeline,
};

#[derive(Parser, Debug)]
#[command(name = "glwidget", about = "Draws one triangle through a compiled shader pair")]
struct Cli {
    /// Config file to read instead of the platform default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Clear to a transparent colour on surfaces that support it
    #[arg(long)]
    transparent: bool,

    /// Exit if a shader stage fails to compile or the program fails to link
    #[arg(long)]
    strict: bool,

    /// Log level filter, for example `debug`
    #[arg(long)]
    log_level: Option<String>,
}

// Field order is drop order: the pipeline must go while the context is alive.
struct App {
    pipeline: ShaderPipeline<GlowContext>,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

impl App {
    fn new(config: &AppConfig) -> Result<(Self, EventLoop<()>)> {
        let event_loop = EventLoop::new()?;

        let transparent = config.rendering.transparent;
        let (width, height) = config.window.size_hint();
        let (min_width, min_height) = config.window.minimum_size_hint();
        let window_builder = WindowBuilder::new()
            .with_title(&config.window.title)
            .with_inner_size(LogicalSize::new(width, height))
            .with_min_inner_size(LogicalSize::new(min_width, min_height))
            .with_transparent(transparent);

        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(config.rendering.alpha_size())
            .with_transparency(transparent);

        // WGL lists pixel formats against an existing native window.
        #[cfg(target_os = "windows")]
        let (early_window, template) = {
            let window = window_builder.clone().build(&event_loop)?;
            let template = template.compatible_with_native_window(window.raw_window_handle());
            (Some(window), template)
        };
        #[cfg(not(target_os = "windows"))]
        let early_window: Option<Window> = None;

        let gl_display = create_display(
            &event_loop,
            early_window.as_ref().map(|window| window.raw_window_handle()),
        )?;
        let configs = unsafe { gl_display.find_configs(template.build()) }
            .context("Failed to query GL configs")?;
        let gl_config = pick_config(configs, transparent)
            .context("No GL config matches the requested surface")?;

        let window = match early_window {
            Some(window) => window,
            None => glutin_winit::finalize_window(&event_loop, window_builder, &gl_config)
                .context("Failed to create window")?,
        };
        let raw_window_handle = window.raw_window_handle();

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_window_handle));

        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .context("Failed to create OpenGL context")?;

        let attrs = window.build_surface_attributes(<_>::default());
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
            .context("Failed to create GL surface")?;

        let gl_context = not_current
            .make_current(&gl_surface)
            .context("Failed to make context current")?;

        if config.window.vsync {
            if let Err(e) =
                gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
            {
                warn!("Failed to enable vsync: {}", e);
            }
        }

        let glow_context = unsafe {
            glow::Context::from_loader_function(|symbol| {
                CString::new(symbol)
                    .map(|symbol| gl_display.get_proc_address(&symbol))
                    .unwrap_or(std::ptr::null())
            })
        };
        // The context made current above stays current on this thread for
        // the rest of the program.
        let gl = unsafe { GlowContext::from_current(Arc::new(glow_context)) };

        info!(
            "OpenGL context ready ({}x{}, transparent: {})",
            width, height, transparent
        );

        Ok((
            Self {
                pipeline: ShaderPipeline::new(gl, config.rendering.clone()),
                gl_surface,
                gl_context,
                window,
            },
            event_loop,
        ))
    }

    fn initialize(&mut self) -> Result<()> {
        match self.pipeline.initialize() {
            Ok(_) => Ok(()),
            Err(err) if self.pipeline.config().failure_policy == FailurePolicy::Strict => {
                Err(err).context("Shader pipeline initialization failed")
            }
            Err(err) => {
                debug!("Rendering with an incomplete shader pipeline: {}", err);
                Ok(())
            }
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        {
            self.gl_surface.resize(&self.gl_context, width, height);
            self.pipeline
                .gl()
                .viewport(0, 0, size.width as i32, size.height as i32);
        }
        self.pipeline.resize(size.width, size.height);
    }

    fn paint(&mut self) -> Result<()> {
        self.pipeline.paint();
        self.gl_surface
            .swap_buffers(&self.gl_context)
            .context("Failed to swap buffers")
    }

    fn close(&mut self) {
        self.pipeline.teardown();
        info!("ByeBye~~");
    }
}

fn create_display(
    event_loop: &EventLoop<()>,
    raw_window_handle: Option<RawWindowHandle>,
) -> Result<Display> {
    #[cfg(target_os = "windows")]
    let preference = DisplayApiPreference::WglThenEgl(raw_window_handle);
    #[cfg(target_os = "macos")]
    let preference = DisplayApiPreference::Cgl;
    #[cfg(any(
        target_os = "linux",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    let preference = DisplayApiPreference::EglThenGlx(Box::new(
        winit::platform::x11::register_xlib_error_hook,
    ));
    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "linux",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    )))]
    let preference = DisplayApiPreference::Egl;
    #[cfg(not(target_os = "windows"))]
    let _ = raw_window_handle;

    unsafe { Display::new(event_loop.raw_display_handle(), preference) }
        .context("Failed to open GL display")
}

fn pick_config(configs: impl Iterator<Item = Config>, transparent: bool) -> Option<Config> {
    best_candidate(configs, transparent, |config| {
        (
            config.supports_transparency().unwrap_or(false),
            config.num_samples(),
        )
    })
}

/// Prefers a transparent candidate when asked for one, then more samples.
/// `traits` yields `(supports_transparency, num_samples)`.
fn best_candidate<C>(
    candidates: impl Iterator<Item = C>,
    transparent: bool,
    traits: impl Fn(&C) -> (bool, u8),
) -> Option<C> {
    candidates.reduce(|accum, candidate| {
        let (candidate_alpha, candidate_samples) = traits(&candidate);
        let (accum_alpha, accum_samples) = traits(&accum);
        if (transparent && candidate_alpha && !accum_alpha) || candidate_samples > accum_samples {
            candidate
        } else {
            accum
        }
    })
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => AppConfig::load(path),
        None => AppConfig::load_or_create(&AppConfig::default_path()?),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, fallback) = match load_config(&cli) {
        Ok(config) => (config, None),
        Err(err) if cli.config.is_none() => (AppConfig::default(), Some(err)),
        Err(err) => return Err(err),
    };
    config.apply(&Overrides {
        transparent: cli.transparent,
        strict: cli.strict,
        log_level: cli.log_level.clone(),
    });

    SimpleLogger::new().with_level(config.level_filter()?).init()?;
    if let Some(err) = fallback {
        warn!("Using default configuration: {:#}", err);
    }
    info!("Initializing application...");

    let (mut app, event_loop) = App::new(&config)?;
    app.initialize()?;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => {
                app.close();
                elwt.exit();
            }
            WindowEvent::Resized(size) => app.resize(size),
            WindowEvent::RedrawRequested => {
                if let Err(err) = app.paint() {
                    error!("{:#}", err);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                debug!("Key pressed: {:?}", event.logical_key);
                if event.logical_key == Key::Named(NamedKey::Escape) {
                    app.close();
                    elwt.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                debug!("Cursor moved to {:?}", position);
            }
            _ => {}
        },
        Event::AboutToWait => app.window.request_redraw(),
        _ => {}
    })?;

    Ok(())
}
