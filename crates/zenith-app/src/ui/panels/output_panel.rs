use egui::Ui;

use super::{PanelCtx, UiActions};

pub fn draw_output_panel(ui: &mut Ui, p: &mut PanelCtx, actions: &mut UiActions) {
    draw_osc_section(ui, p);
    ui.add_space(8.0);
    draw_web_section(ui, p);
    #[cfg(feature = "ndi")]
    {
        ui.add_space(8.0);
        draw_ndi_section(ui, p, actions);
    }
    #[cfg(not(feature = "ndi"))]
    let _ = actions;
}

fn draw_osc_section(ui: &mut Ui, p: &mut PanelCtx) {
    egui::CollapsingHeader::new("OSC")
        .default_open(true)
        .show(ui, |ui| {
            let mut enabled = p.osc.config.enabled;
            if ui.checkbox(&mut enabled, "Receive").changed() {
                p.osc.set_enabled(enabled);
            }

            ui.horizontal(|ui| {
                ui.label("RX port:");
                let mut port = p.osc.config.rx_port;
                if ui
                    .add(egui::DragValue::new(&mut port).range(1024..=65535))
                    .changed()
                {
                    p.osc.config.rx_port = port;
                }
                if ui.button("Apply").clicked() {
                    p.osc.config.save();
                    p.osc.restart_receiver();
                }
            });

            let mut tx = p.osc.config.tx_enabled;
            if ui.checkbox(&mut tx, "Send state/audio").changed() {
                p.osc.set_tx_enabled(tx);
            }
            if p.osc.config.tx_enabled {
                ui.label(format!(
                    "→ {}:{} at {} Hz",
                    p.osc.config.tx_host, p.osc.config.tx_port, p.osc.config.tx_rate_hz
                ));
            }

            if let Some(ref addr) = p.osc.last_address {
                ui.label(format!("Last: {addr}"));
            }
        });
}

fn draw_web_section(ui: &mut Ui, p: &mut PanelCtx) {
    egui::CollapsingHeader::new("Web control")
        .default_open(true)
        .show(ui, |ui| {
            let mut enabled = p.web.config.enabled;
            if ui.checkbox(&mut enabled, "Serve").changed() {
                p.web.set_enabled(enabled);
            }

            ui.horizontal(|ui| {
                ui.label("Port:");
                let mut port = p.web.config.port;
                if ui
                    .add(egui::DragValue::new(&mut port).range(1024..=65535))
                    .changed()
                {
                    p.web.config.port = port;
                }
                if ui.button("Apply").clicked() {
                    p.web.config.save();
                    p.web.restart_server();
                }
            });

            if p.web.is_running() {
                ui.label(format!(
                    "http://localhost:{} — {} client(s)",
                    p.web.config.port, p.web.client_count
                ));
            }
        });
}

#[cfg(feature = "ndi")]
fn draw_ndi_section(ui: &mut Ui, p: &mut PanelCtx, actions: &mut UiActions) {
    use crate::ndi::types::OutputResolution;

    egui::CollapsingHeader::new("NDI")
        .default_open(true)
        .show(ui, |ui| {
            let mut enabled = p.ndi.config.enabled;
            if ui.checkbox(&mut enabled, "Send frames").changed() {
                actions.ndi_set_enabled = Some(enabled);
            }

            ui.horizontal(|ui| {
                ui.label("Source:");
                if ui
                    .text_edit_singleline(&mut p.ndi.config.source_name)
                    .lost_focus()
                {
                    p.ndi.config.save();
                    actions.ndi_restart = true;
                }
            });

            ui.horizontal(|ui| {
                ui.label("Resolution:");
                for res in OutputResolution::ALL {
                    if ui
                        .selectable_label(p.ndi.config.resolution == *res, res.display_name())
                        .clicked()
                        && p.ndi.config.resolution != *res
                    {
                        p.ndi.config.resolution = *res;
                        p.ndi.config.save();
                        actions.ndi_restart = true;
                    }
                }
            });

            if p.ndi.is_running() {
                ui.label(format!("{} frames sent", p.ndi.frames_sent()));
            }
        });
}
