use crate::error::{CoreError, Result};
use crate::lane::Lane;
use crate::types::*;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayUpdate {
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub opacity: Option<f64>,
    pub rotation_deg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageOverlays {
    lane: Lane<ImageOverlay>,
}

impl ImageOverlays {
    pub fn new(min_len: TimeUs) -> Self {
        Self {
            lane: Lane::new(min_len),
        }
    }

    pub fn items(&self) -> &[ImageOverlay] {
        self.lane.items()
    }

    pub fn get(&self, id: Uuid) -> Option<&ImageOverlay> {
        self.lane.get(id)
    }

    pub fn add(&mut self, mut overlay: ImageOverlay) -> Result<Uuid> {
        overlay.opacity = clamp_unit(overlay.opacity)?;
        let id = self.lane.add(overlay)?;
        tracing::debug!(%id, "image overlay added");
        Ok(id)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<ImageOverlay> {
        self.lane.remove(id)
    }

    pub fn trim(&mut self, id: Uuid, edge: TrimEdge, new_time: TimeUs) -> Result<()> {
        self.lane.trim(id, edge, new_time)
    }

    pub fn update(&mut self, id: Uuid, update: &OverlayUpdate) -> Result<()> {
        let opacity = update.opacity.map(clamp_unit).transpose()?;
        if let Some(size) = update.size {
            if !(size.width > 0.0 && size.height > 0.0) {
                return Err(CoreError::OutOfRange(format!(
                    "overlay size {}x{} must be positive",
                    size.width, size.height
                )));
            }
        }

        let overlay = self.lane.get_mut(id)?;
        if let Some(position) = update.position {
            overlay.position = position;
        }
        if let Some(size) = update.size {
            overlay.size = size;
        }
        if let Some(opacity) = opacity {
            overlay.opacity = opacity;
        }
        if let Some(rotation) = update.rotation_deg {
            overlay.rotation_deg = rotation.rem_euclid(360.0);
        }
        Ok(())
    }

    /// All overlays showing at `t`, in stacking order.
    pub fn active_at(&self, t: TimeUs) -> Vec<&ImageOverlay> {
        self.lane.active_at(t)
    }
}

fn clamp_unit(value: f64) -> Result<f64> {
    if value.is_nan() {
        return Err(CoreError::OutOfRange("opacity is NaN".into()));
    }
    Ok(value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_overlay() -> ImageOverlay {
        ImageOverlay::new(MediaRef::from("logo.png"))
    }

    #[test]
    fn add_uses_default_window() {
        let mut overlays = ImageOverlays::default();
        let id = overlays.add(make_overlay()).unwrap();
        let overlay = overlays.get(id).unwrap();
        assert_eq!(overlay.start, TimeUs::ZERO);
        assert_eq!(overlay.end, ImageOverlay::DEFAULT_DURATION);
        assert_eq!(overlays.active_at(TimeUs::from_seconds(9.9)).len(), 1);
        assert!(overlays.active_at(TimeUs::from_seconds(10.0)).is_empty());
    }

    #[test]
    fn update_clamps_opacity_and_wraps_rotation() {
        let mut overlays = ImageOverlays::default();
        let id = overlays.add(make_overlay()).unwrap();
        overlays
            .update(
                id,
                &OverlayUpdate {
                    opacity: Some(1.7),
                    rotation_deg: Some(-90.0),
                    position: Some(Position { x: 10.0, y: 20.0 }),
                    ..OverlayUpdate::default()
                },
            )
            .unwrap();
        let overlay = overlays.get(id).unwrap();
        assert_eq!(overlay.opacity, 1.0);
        assert_eq!(overlay.rotation_deg, 270.0);
        assert_eq!(overlay.position, Position { x: 10.0, y: 20.0 });
    }

    #[test]
    fn update_rejects_bad_values_without_partial_apply() {
        let mut overlays = ImageOverlays::default();
        let id = overlays.add(make_overlay()).unwrap();
        let result = overlays.update(
            id,
            &OverlayUpdate {
                opacity: Some(0.2),
                size: Some(Size {
                    width: 0.0,
                    height: 10.0,
                }),
                ..OverlayUpdate::default()
            },
        );
        assert!(matches!(result, Err(CoreError::OutOfRange(_))));
        assert_eq!(overlays.get(id).unwrap().opacity, 1.0);
    }
}
