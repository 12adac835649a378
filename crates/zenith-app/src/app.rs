use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use glam::Vec2;
use winit::window::Window;

use crate::audio::{AudioFeatures, AudioSystem};
use crate::gpu::mix::MixPipeline;
use crate::gpu::scene::ScenePass;
use crate::gpu::uniforms::{MixUniforms, UniformBuffer};
use crate::gpu::{GpuContext, RenderTarget};
use crate::keyframes::KeyframeBank;
use crate::osc::types::TriggerAction;
use crate::osc::OscSystem;
use crate::session::{ParamId, Session};
use crate::settings::SettingsConfig;
use crate::shader::{self, ShaderWatcher, MIX_SHADER_FALLBACK, SCENE_SHADER_FALLBACK};
use crate::ui::panels::{PanelCtx, UiActions};
use crate::ui::EguiOverlay;
use crate::warp::editor::WarpEditor;
use crate::warp::renderer::WarpRenderer;
use crate::warp::{persist, WarpList};
use crate::web::{state as web_state, WebSystem};

/// Off-screen passes render in a plain 8-bit format; the warp pass converts
/// to the surface format when it draws.
const RENDER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub struct App {
    pub gpu: GpuContext,
    pub window: Arc<Window>,

    // Scene -> mix -> warp chain
    pub scene_target: RenderTarget,
    pub scene: ScenePass,
    pub mix_target: RenderTarget,
    pub mix: MixPipeline,
    pub mix_uniform_buffer: UniformBuffer,
    mix_bind_group: wgpu::BindGroup,
    pub uniforms: MixUniforms,

    // Projection mapping
    pub warps: WarpList,
    pub warp_renderer: WarpRenderer,
    pub warp_editor: WarpEditor,

    pub session: Session,
    pub audio: AudioSystem,
    pub features: AudioFeatures,
    pub osc: OscSystem,
    pub web: WebSystem,
    #[cfg(feature = "ndi")]
    pub ndi: crate::ndi::NdiSystem,
    pub keyframes: KeyframeBank,
    pub overlay: EguiOverlay,
    pub settings: SettingsConfig,

    pub shader_watcher: ShaderWatcher,
    pub shader_error: Option<String>,

    pub pending_triggers: Vec<TriggerAction>,

    pub start_time: Instant,
    pub last_frame: Instant,
    pub fps: f32,
    last_title_update: Instant,
}

impl App {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let settings = SettingsConfig::load();
        let gpu = GpuContext::new(window.clone())?;
        let (rw, rh) = (settings.render_width, settings.render_height);

        // A broken on-disk shader at startup falls back to the built-in
        // source, same as the hot-reload path.
        let mut shader_error = None;

        let scene_target = RenderTarget::new(&gpu.device, rw, rh, RENDER_FORMAT, "scene-target");
        let scene_source = shader::load_shader_source("scene.wgsl", SCENE_SHADER_FALLBACK);
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut scene = ScenePass::new(&gpu.device, RENDER_FORMAT, rw, rh, &scene_source);
        if let Some(error) = pollster::block_on(gpu.device.pop_error_scope()) {
            log::error!("Scene shader failed to compile, using built-in: {error}");
            shader_error = Some(error.to_string());
            scene = ScenePass::new(&gpu.device, RENDER_FORMAT, rw, rh, SCENE_SHADER_FALLBACK);
        }

        let mix_target = RenderTarget::new(&gpu.device, rw, rh, RENDER_FORMAT, "mix-target");
        let mix_source = shader::load_shader_source("mix.wgsl", MIX_SHADER_FALLBACK);
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut mix = MixPipeline::new(&gpu.device, RENDER_FORMAT, &mix_source)?;
        if let Some(error) = pollster::block_on(gpu.device.pop_error_scope()) {
            log::error!("Mix shader failed to compile, using built-in: {error}");
            shader_error = Some(error.to_string());
            mix = MixPipeline::new(&gpu.device, RENDER_FORMAT, MIX_SHADER_FALLBACK)?;
        }
        let mix_uniform_buffer = UniformBuffer::new(&gpu.device);
        let mix_bind_group = mix_uniform_buffer.create_bind_group(
            &gpu.device,
            &mix.bind_group_layout,
            &scene_target.view,
            &scene_target.sampler,
        );

        let warps = match persist::load(&warps_path()) {
            Ok(loaded) if !loaded.is_empty() => {
                log::info!("Loaded {} warps from {}", loaded.len(), warps_path().display());
                WarpList::from_warps(loaded)
            }
            Ok(_) => WarpList::default_pair(),
            Err(e) => {
                log::info!("No warp file ({e}), starting with default pair");
                WarpList::default_pair()
            }
        };
        let warp_renderer = WarpRenderer::new(&gpu.device, gpu.format);
        let mut warp_editor = WarpEditor::new();
        warp_editor.set_window_size(gpu.surface_config.width, gpu.surface_config.height);

        let session = Session::load();
        let audio = AudioSystem::new(settings.audio_device.as_deref());
        let osc = OscSystem::new();
        let web = WebSystem::new();
        #[cfg(feature = "ndi")]
        let ndi = crate::ndi::NdiSystem::new(&gpu.device, rw, rh);
        let keyframes = KeyframeBank::load();

        let mut overlay = EguiOverlay::new(&gpu.device, gpu.format, &window, settings.theme);
        overlay.visible = true;

        let shader_watcher = ShaderWatcher::new()?;

        let now = Instant::now();
        Ok(Self {
            gpu,
            window,
            scene_target,
            scene,
            mix_target,
            mix,
            mix_uniform_buffer,
            mix_bind_group,
            uniforms: bytemuck::Zeroable::zeroed(),
            warps,
            warp_renderer,
            warp_editor,
            session,
            audio,
            features: bytemuck::Zeroable::zeroed(),
            osc,
            web,
            #[cfg(feature = "ndi")]
            ndi,
            keyframes,
            overlay,
            settings,
            shader_watcher,
            shader_error,
            pending_triggers: Vec::new(),
            start_time: now,
            last_frame: now,
            fps: 0.0,
            last_title_update: now,
        })
    }

    pub fn elapsed(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.warp_editor.set_window_size(width, height);
        self.warps.handle_resize();
        self.overlay
            .resize(width, height, self.window.scale_factor() as f32);
    }

    pub fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if dt > 0.0 {
            // Exponential moving average keeps the readout steady.
            let instant_fps = 1.0 / dt;
            self.fps = if self.fps == 0.0 {
                instant_fps
            } else {
                self.fps * 0.95 + instant_fps * 0.05
            };
        }
        if self.last_title_update.elapsed().as_millis() >= 500 {
            self.last_title_update = now;
            self.window.set_title(&format!("Zenith — {:.0} FPS", self.fps));
        }

        if let Some(features) = self.audio.latest_features() {
            self.features = features;
        }

        // Control planes write into the session; triggers are deferred so the
        // keyboard, OSC, and web paths all funnel through apply_trigger().
        let osc_result = self.osc.update(&mut self.session);
        self.pending_triggers.extend(osc_result.triggers);
        let web_result = self.web.update(&mut self.session);
        self.pending_triggers.extend(web_result.triggers);

        // Keyframe replay overwrites the whole session each frame while on.
        if self.keyframes.playing {
            if let Some(values) = self.keyframes.sample(self.elapsed()) {
                self.session.apply_snapshot(&values);
            }
        }

        self.scene.set_tessellation(
            &self.gpu.device,
            self.session.get(ParamId::TessInner),
            self.session.get(ParamId::TessOuter),
        );

        self.check_shader_changes();
        self.compose_uniforms(dt);
        self.publish_state();
    }

    fn compose_uniforms(&mut self, dt: f32) {
        let s = &self.session;
        let u = &mut self.uniforms;
        let f = &self.features;
        let mult = s.get(ParamId::AudioMult);

        u.time = self.start_time.elapsed().as_secs_f32();
        u.delta_time = dt;
        u.resolution = [
            self.settings.render_width as f32,
            self.settings.render_height as f32,
        ];

        u.mouse_x = s.get(ParamId::MouseX);
        u.mouse_y = s.get(ParamId::MouseY);
        u.mouse_click = s.get(ParamId::MouseClick);

        u.bass = f.bass * mult;
        u.mid = f.mid * mult;
        u.treble = f.treble * mult;
        u.rms = f.rms * mult;
        u.peak = f.peak * mult;
        u.onset = f.onset * mult;
        u.centroid = f.centroid;
        u.beat = f.beat;
        u.beat_phase = f.beat_phase;
        // Detected tempo wins; the session BPM is the fallback clock.
        u.bpm = if f.bpm > 1.0 { f.bpm } else { s.get(ParamId::Bpm) };

        u.fg_color = [
            s.get(ParamId::FgR),
            s.get(ParamId::FgG),
            s.get(ParamId::FgB),
            s.get(ParamId::FgA),
        ];
        u.bg_color = [
            s.get(ParamId::BgR),
            s.get(ParamId::BgG),
            s.get(ParamId::BgB),
            s.get(ParamId::BgA),
        ];

        u.glitch = s.get(ParamId::Glitch);
        u.chromatic = s.get(ParamId::Chromatic);
        u.trixels = s.get(ParamId::Trixels);
        u.pixelate = s.get(ParamId::Pixelate);
        u.vignette = s.get(ParamId::Vignette);
        u.invert = s.get(ParamId::Invert);
        u.greyscale = s.get(ParamId::Greyscale);
        u.exposure = s.get(ParamId::Exposure);
        u.zoom = s.get(ParamId::Zoom);
        u.crossfade = s.get(ParamId::Crossfade);
        u.alpha = s.get(ParamId::Alpha);
        u.steps = s.get(ParamId::Steps);
        u.ratio = s.get(ParamId::Ratio);
    }

    fn check_shader_changes(&mut self) {
        let changes = self.shader_watcher.drain_changes();
        for path in changes {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            match file_name.as_str() {
                "mix.wgsl" => {
                    let source = shader::load_shader_source("mix.wgsl", MIX_SHADER_FALLBACK);
                    match self.mix.reload(&self.gpu.device, &source) {
                        Ok(()) => {
                            self.shader_error = None;
                            log::info!("Mix shader recompiled");
                        }
                        Err(e) => {
                            log::error!("Mix shader compilation failed: {e}");
                            self.shader_error = Some(e);
                        }
                    }
                }
                "scene.wgsl" => self.reload_scene_shader(),
                _ => {}
            }
        }
    }

    /// The scene pass is rebuilt wholesale; mesh kind and tessellation are
    /// carried over. A broken shader keeps the old pass.
    fn reload_scene_shader(&mut self) {
        let source = shader::load_shader_source("scene.wgsl", SCENE_SHADER_FALLBACK);
        let (rw, rh) = (self.settings.render_width, self.settings.render_height);

        self.gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut new_pass = ScenePass::new(&self.gpu.device, RENDER_FORMAT, rw, rh, &source);
        if let Some(error) = pollster::block_on(self.gpu.device.pop_error_scope()) {
            log::error!("Scene shader compilation failed: {error}");
            self.shader_error = Some(error.to_string());
            return;
        }

        new_pass.set_mesh_kind(&self.gpu.device, self.scene.mesh_kind());
        new_pass.set_tessellation(
            &self.gpu.device,
            self.session.get(ParamId::TessInner),
            self.session.get(ParamId::TessOuter),
        );
        self.scene = new_pass;
        self.shader_error = None;
        log::info!("Scene shader recompiled");
    }

    fn publish_state(&mut self) {
        let state = web_state::build_full_state(
            &self.session,
            self.scene.mesh_kind(),
            self.warp_editor.enabled,
            self.warps.split,
            &self.audio.device_name,
        );
        self.web.update_latest_state(&state);
        self.web.broadcast_audio(&self.features);
        self.osc.send_state(
            &self.features,
            self.scene.mesh_kind().name(),
            self.warp_editor.enabled,
        );
    }

    /// Run the egui frame: panels plus warp handles. Returns the deferred
    /// actions for apply_ui_actions().
    pub fn run_ui(&mut self) -> UiActions {
        self.overlay.begin_frame(&self.window);
        let ctx = self.overlay.context();

        let mut panel_ctx = PanelCtx {
            session: &mut self.session,
            features: &self.features,
            audio_device: &self.audio.device_name,
            audio_active: self.audio.active,
            mesh: self.scene.mesh_kind(),
            warps: &mut self.warps,
            warp_edit: self.warp_editor.enabled,
            osc: &mut self.osc,
            web: &mut self.web,
            keyframe_count: self.keyframes.len(),
            keyframes_playing: self.keyframes.playing,
            shader_error: &self.shader_error,
            fps: self.fps,
            render_width: self.settings.render_width,
            render_height: self.settings.render_height,
            #[cfg(feature = "ndi")]
            ndi: &mut self.ndi,
        };
        let actions = crate::ui::panels::draw_panels(&ctx, self.overlay.visible, &mut panel_ctx);

        crate::ui::draw_warp_handles(&ctx, &self.warps, &self.warp_editor);

        self.overlay.end_frame(&self.window);
        actions
    }

    pub fn apply_ui_actions(&mut self, actions: UiActions) {
        if let Some(kind) = actions.select_mesh {
            self.scene.set_mesh_kind(&self.gpu.device, kind);
        }
        if actions.toggle_warp_edit {
            self.warp_editor.toggle();
        }
        if actions.capture_keyframe {
            self.capture_keyframe();
        }
        if actions.save_keyframes {
            self.keyframes.save();
        }
        if actions.toggle_keyframe_playback {
            self.keyframes.toggle_playback();
        }
        if let Some(name) = actions.switch_audio_device {
            self.audio.switch_device(&name);
            // Remembered for the next launch; saved with the rest on exit.
            self.settings.audio_device = Some(name);
        }
        #[cfg(feature = "ndi")]
        {
            let (rw, rh) = (self.settings.render_width, self.settings.render_height);
            if let Some(enabled) = actions.ndi_set_enabled {
                self.ndi.set_enabled(enabled, &self.gpu.device, rw, rh);
            }
            if actions.ndi_restart {
                self.ndi.restart(&self.gpu.device, rw, rh);
            }
        }
    }

    pub fn apply_pending_triggers(&mut self) {
        let triggers: Vec<TriggerAction> = self.pending_triggers.drain(..).collect();
        for trigger in triggers {
            self.apply_trigger(trigger);
        }
    }

    pub fn apply_trigger(&mut self, action: TriggerAction) {
        match action {
            TriggerAction::NextMesh => {
                let next = self.scene.mesh_kind().next();
                self.scene.set_mesh_kind(&self.gpu.device, next);
            }
            TriggerAction::PrevMesh => {
                let prev = self.scene.mesh_kind().prev();
                self.scene.set_mesh_kind(&self.gpu.device, prev);
            }
            TriggerAction::ToggleWarpEdit => self.warp_editor.toggle(),
            TriggerAction::ToggleOverlay => self.overlay.toggle_visible(),
            TriggerAction::SaveKeyframe => self.capture_keyframe(),
            TriggerAction::ToggleSplitVertical => self.warps.toggle_split_vertical(),
            TriggerAction::ToggleSplitHorizontal => self.warps.toggle_split_horizontal(),
            TriggerAction::ResetSplit => self.warps.reset_split(),
            TriggerAction::TogglePlayback => self.keyframes.toggle_playback(),
        }
    }

    pub fn capture_keyframe(&mut self) {
        self.keyframes.capture(self.elapsed(), &self.session);
    }

    // -- Mouse --

    pub fn on_mouse_moved(&mut self, px: Vec2) {
        if self.warp_editor.enabled {
            self.warp_editor.mouse_moved(&mut self.warps, px);
            return;
        }
        if self.overlay.wants_mouse() {
            return;
        }
        let nx = (px.x / self.gpu.surface_config.width.max(1) as f32).clamp(0.0, 1.0);
        let ny = (px.y / self.gpu.surface_config.height.max(1) as f32).clamp(0.0, 1.0);
        self.session.mirror_mouse(nx, ny);
    }

    pub fn on_mouse_pressed(&mut self, px: Vec2) {
        if self.warp_editor.enabled && self.warp_editor.mouse_down(&mut self.warps, px) {
            return;
        }
        if self.overlay.wants_mouse() {
            return;
        }
        self.session.set(ParamId::MouseClick, 1.0);
    }

    pub fn on_mouse_released(&mut self) {
        self.warp_editor.mouse_up();
        self.session.set(ParamId::MouseClick, 0.0);
    }

    // -- Persistence --

    pub fn save_on_exit(&mut self) {
        self.session.save();
        self.settings.save();
        match persist::save(&warps_path(), &self.warps.warps) {
            Ok(()) => log::info!("Saved warps to {}", warps_path().display()),
            Err(e) => log::error!("Failed to save warps: {e}"),
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.gpu.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("zenith-encoder"),
                });

        // 1. Tessellated geometry -> scene target
        let aspect = self.settings.render_width as f32 / self.settings.render_height.max(1) as f32;
        let audio_level = self.features.rms * self.session.get(ParamId::AudioMult);
        self.scene.render(
            &mut encoder,
            &self.gpu.queue,
            &self.scene_target.view,
            aspect,
            self.uniforms.time,
            self.uniforms.delta_time,
            self.session.get(ParamId::RotationSpeed),
            self.uniforms.fg_color,
            self.uniforms.bg_color,
            audio_level,
        );

        // 2. Mix pass: scene texture + effect uniforms -> mix target
        self.mix_uniform_buffer.update(&self.gpu.queue, &self.uniforms);
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mix-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.mix_target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.mix.pipeline);
            pass.set_bind_group(0, &self.mix_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        // 3. Warped projection onto the window surface
        self.warp_renderer.prepare(
            &self.gpu.device,
            &self.gpu.queue,
            &self.warps,
            &self.mix_target.view,
            &self.mix_target.sampler,
        );
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("warp-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.warp_renderer.draw(&mut pass);
        }

        // 4. NDI capture reads the un-warped mix output
        #[cfg(feature = "ndi")]
        self.ndi
            .capture_frame(&self.gpu.device, &mut encoder, &self.mix_target);

        // 5. egui overlay on top
        self.overlay
            .render(&self.gpu.device, &self.gpu.queue, &mut encoder, &surface_view);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        #[cfg(feature = "ndi")]
        self.ndi.post_submit();
        output.present();

        Ok(())
    }
}

fn warps_path() -> PathBuf {
    let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config_dir.join("zenith").join("warps.xml")
}
