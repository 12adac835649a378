//! warps.xml load/save: a `<warps>` root with one `<warp>` element per
//! warp, four `<corner>` children, and the bilinear control points as
//! `<point>` children in row-major order.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Warp, WarpMode};
use crate::warp::bilinear::ControlGrid;

#[derive(Debug, thiserror::Error)]
pub enum WarpPersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("xml parse error: {0}")]
    Parse(#[from] quick_xml::DeError),
    #[error("xml write error: {0}")]
    Write(#[from] quick_xml::SeError),
    #[error("invalid warp file: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "warps")]
struct WarpsDoc {
    #[serde(default)]
    warp: Vec<WarpXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WarpXml {
    #[serde(rename = "@mode")]
    mode: String,
    #[serde(rename = "@cols")]
    cols: usize,
    #[serde(rename = "@rows")]
    rows: usize,
    #[serde(rename = "@brightness")]
    brightness: f32,
    corner: Vec<PointXml>,
    #[serde(default)]
    point: Vec<PointXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PointXml {
    #[serde(rename = "@x")]
    x: f32,
    #[serde(rename = "@y")]
    y: f32,
}

impl From<Vec2> for PointXml {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

fn mode_name(mode: WarpMode) -> &'static str {
    match mode {
        WarpMode::Perspective => "perspective",
        WarpMode::PerspectiveBilinear => "perspective_bilinear",
    }
}

fn mode_from_name(name: &str) -> Result<WarpMode, WarpPersistError> {
    match name {
        "perspective" => Ok(WarpMode::Perspective),
        "perspective_bilinear" => Ok(WarpMode::PerspectiveBilinear),
        other => Err(WarpPersistError::Invalid(format!(
            "unknown warp mode '{other}'"
        ))),
    }
}

pub fn to_xml_str(warps: &[Warp]) -> Result<String, WarpPersistError> {
    let doc = WarpsDoc {
        warp: warps
            .iter()
            .map(|w| WarpXml {
                mode: mode_name(w.mode).to_string(),
                cols: w.grid.cols(),
                rows: w.grid.rows(),
                brightness: w.brightness,
                corner: w.corners.iter().copied().map(PointXml::from).collect(),
                point: match w.mode {
                    WarpMode::Perspective => Vec::new(),
                    WarpMode::PerspectiveBilinear => {
                        w.grid.points().iter().copied().map(PointXml::from).collect()
                    }
                },
            })
            .collect(),
    };
    Ok(quick_xml::se::to_string(&doc)?)
}

pub fn from_xml_str(xml: &str) -> Result<Vec<Warp>, WarpPersistError> {
    let doc: WarpsDoc = quick_xml::de::from_str(xml)?;
    doc.warp
        .into_iter()
        .map(|w| {
            if w.corner.len() != 4 {
                return Err(WarpPersistError::Invalid(format!(
                    "expected 4 corners, found {}",
                    w.corner.len()
                )));
            }
            let mode = mode_from_name(&w.mode)?;
            let mut corners = [Vec2::ZERO; 4];
            for (dst, src) in corners.iter_mut().zip(w.corner.iter()) {
                *dst = Vec2::new(src.x, src.y);
            }
            let grid = ControlGrid::from_points(
                w.cols,
                w.rows,
                w.point.iter().map(|p| Vec2::new(p.x, p.y)).collect(),
            );
            Ok(Warp {
                mode,
                corners,
                grid,
                brightness: w.brightness.clamp(0.0, 1.0),
                src_rect: super::SrcRect::FULL,
            })
        })
        .collect()
}

pub fn save(path: &Path, warps: &[Warp]) -> Result<(), WarpPersistError> {
    let xml = to_xml_str(warps)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, xml)?;
    Ok(())
}

pub fn load(path: &Path) -> Result<Vec<Warp>, WarpPersistError> {
    let xml = std::fs::read_to_string(path)?;
    from_xml_str(&xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_geometry() {
        let mut warp = Warp::default();
        warp.corners[1] = Vec2::new(0.95, 0.05);
        warp.brightness = 0.8;
        warp.grid.set_point(1, 1, Vec2::new(0.4, 0.35));

        let xml = to_xml_str(&[warp.clone()]).unwrap();
        let loaded = from_xml_str(&xml).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].mode, WarpMode::PerspectiveBilinear);
        assert!((loaded[0].corners[1] - warp.corners[1]).length() < 1e-5);
        assert!((loaded[0].brightness - 0.8).abs() < 1e-5);
        assert!((loaded[0].grid.point(1, 1) - Vec2::new(0.4, 0.35)).length() < 1e-5);
    }

    #[test]
    fn parses_handwritten_file() {
        let xml = r#"
            <warps>
              <warp mode="perspective" cols="2" rows="2" brightness="1">
                <corner x="0.1" y="0.1"/>
                <corner x="0.9" y="0.1"/>
                <corner x="0.9" y="0.9"/>
                <corner x="0.1" y="0.9"/>
              </warp>
            </warps>
        "#;
        let warps = from_xml_str(xml).unwrap();
        assert_eq!(warps.len(), 1);
        assert_eq!(warps[0].mode, WarpMode::Perspective);
        assert!((warps[0].corners[2] - Vec2::new(0.9, 0.9)).length() < 1e-6);
    }

    #[test]
    fn missing_points_fall_back_to_uniform_grid() {
        let xml = r#"
            <warps>
              <warp mode="perspective_bilinear" cols="4" rows="4" brightness="1">
                <corner x="0" y="0"/>
                <corner x="1" y="0"/>
                <corner x="1" y="1"/>
                <corner x="0" y="1"/>
              </warp>
            </warps>
        "#;
        let warps = from_xml_str(xml).unwrap();
        assert_eq!(warps[0].grid.cols(), 4);
        let center = warps[0].grid.eval(0.5, 0.5);
        assert!((center - Vec2::new(0.5, 0.5)).length() < 1e-5);
    }

    #[test]
    fn bad_mode_is_rejected() {
        let xml = r#"
            <warps>
              <warp mode="fisheye" cols="2" rows="2" brightness="1">
                <corner x="0" y="0"/>
                <corner x="1" y="0"/>
                <corner x="1" y="1"/>
                <corner x="0" y="1"/>
              </warp>
            </warps>
        "#;
        assert!(matches!(
            from_xml_str(xml),
            Err(WarpPersistError::Invalid(_))
        ));
    }

    #[test]
    fn wrong_corner_count_is_rejected() {
        let xml = r#"
            <warps>
              <warp mode="perspective" cols="2" rows="2" brightness="1">
                <corner x="0" y="0"/>
                <corner x="1" y="0"/>
              </warp>
            </warps>
        "#;
        assert!(from_xml_str(xml).is_err());
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warps.xml");
        let warps = vec![Warp::default(), Warp::default()];
        save(&path, &warps).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
    }
}
