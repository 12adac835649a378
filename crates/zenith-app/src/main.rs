mod app;
mod assets;
mod audio;
mod gpu;
mod keyframes;
#[cfg(feature = "ndi")]
mod ndi;
mod osc;
mod session;
mod settings;
mod shader;
mod ui;
mod warp;
mod web;

use std::sync::Arc;

use anyhow::Result;
use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use app::App;
use gpu::mesh::MeshKind;
use session::ParamId;
use warp::editor::EditorKey;

struct ZenithApp {
    app: Option<App>,
    window: Option<Arc<Window>>,
    modifiers: ModifiersState,
    cursor: Vec2,
}

impl ZenithApp {
    fn new() -> Self {
        Self {
            app: None,
            window: None,
            modifiers: ModifiersState::empty(),
            cursor: Vec2::ZERO,
        }
    }
}

impl ApplicationHandler for ZenithApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("Zenith")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("Failed to create window"),
        );
        self.window = Some(window.clone());

        match App::new(window) {
            Ok(app) => {
                self.app = Some(app);
                log::info!("Zenith initialized");
            }
            Err(e) => {
                log::error!("Failed to initialize app: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(app) = self.app.as_mut() else {
            return;
        };

        // egui gets first refusal on every event
        let window = app.window.clone();
        let egui_consumed = app.overlay.handle_event(&window, &event);

        match event {
            WindowEvent::CloseRequested => {
                app.save_on_exit();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                app.resize(size.width, size.height);
            }
            WindowEvent::ModifiersChanged(mods) => {
                self.modifiers = mods.state();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                if !egui_consumed {
                    app.on_mouse_moved(self.cursor);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    if !egui_consumed {
                        app.on_mouse_pressed(self.cursor);
                    }
                }
                ElementState::Released => {
                    app.on_mouse_released();
                }
            },
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if !egui_consumed && !app.overlay.wants_keyboard() => {
                handle_key(app, event_loop, key, self.modifiers.shift_key());
            }
            WindowEvent::RedrawRequested => {
                app.update();

                let actions = app.run_ui();
                app.apply_ui_actions(actions);
                app.apply_pending_triggers();

                match app.render() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let w = app.gpu.surface_config.width;
                        let h = app.gpu.surface_config.height;
                        app.resize(w, h);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::warn!("Surface error: {e}");
                    }
                }

                app.window.request_redraw();
            }
            _ => {}
        }
    }
}

fn handle_key(app: &mut App, event_loop: &ActiveEventLoop, key: KeyCode, shift: bool) {
    // Warp edit mode owns the navigation keys while active.
    if app.warp_editor.enabled {
        let editor_key = match key {
            KeyCode::ArrowLeft => Some(EditorKey::Left),
            KeyCode::ArrowRight => Some(EditorKey::Right),
            KeyCode::ArrowUp => Some(EditorKey::Up),
            KeyCode::ArrowDown => Some(EditorKey::Down),
            KeyCode::Tab => Some(EditorKey::Tab),
            KeyCode::Minus => Some(EditorKey::GridMinus),
            KeyCode::Equal => Some(EditorKey::GridPlus),
            _ => None,
        };
        if let Some(ek) = editor_key {
            if app.warp_editor.key_down(&mut app.warps, ek, shift) {
                return;
            }
        }
    }

    match key {
        KeyCode::ArrowLeft => app.session.adjust(ParamId::TessInner, -1.0),
        KeyCode::ArrowRight => app.session.adjust(ParamId::TessInner, 1.0),
        KeyCode::ArrowDown => app.session.adjust(ParamId::TessOuter, -1.0),
        KeyCode::ArrowUp => app.session.adjust(ParamId::TessOuter, 1.0),
        KeyCode::Digit1 => app.scene.set_mesh_kind(&app.gpu.device, MeshKind::Cube),
        KeyCode::Digit2 => app.scene.set_mesh_kind(&app.gpu.device, MeshKind::Icosahedron),
        KeyCode::Digit3 => app.scene.set_mesh_kind(&app.gpu.device, MeshKind::Sphere),
        KeyCode::Digit4 => app.scene.set_mesh_kind(&app.gpu.device, MeshKind::Icosphere),
        KeyCode::KeyF => {
            if app.window.fullscreen().is_some() {
                app.window.set_fullscreen(None);
            } else {
                app.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            }
        }
        KeyCode::KeyW => app.warp_editor.toggle(),
        KeyCode::KeyV => app.warps.toggle_split_vertical(),
        KeyCode::KeyH => app.warps.toggle_split_horizontal(),
        KeyCode::KeyR => app.warps.reset_split(),
        KeyCode::KeyK => app.capture_keyframe(),
        KeyCode::KeyS => app.keyframes.save(),
        KeyCode::KeyP => app.keyframes.toggle_playback(),
        KeyCode::KeyD => app.overlay.toggle_visible(),
        KeyCode::Escape => {
            app.save_on_exit();
            event_loop.exit();
        }
        _ => {}
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = ZenithApp::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
